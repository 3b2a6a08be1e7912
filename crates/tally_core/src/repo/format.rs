//! Serialization formats for the whole-collection entry document.

use crate::model::entry::Entry;
use crate::repo::{RepoError, RepoResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Persisted document: one key holding the ordered entry list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDocument {
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// Text format of a file-backed store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFormat {
    Yaml,
    Toml,
    Json,
}

impl StorageFormat {
    /// Extensions accepted for file stores, in lookup order.
    pub const SUPPORTED_EXTENSIONS: [&'static str; 4] = ["yaml", "yml", "toml", "json"];

    pub fn from_extension(extension: &str) -> RepoResult<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(RepoError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }

    pub fn encode(self, document: &EntryDocument) -> RepoResult<String> {
        let encoded = match self {
            Self::Yaml => serde_yaml::to_string(document).map_err(|err| err.to_string()),
            Self::Toml => toml::to_string(document).map_err(|err| err.to_string()),
            Self::Json => serde_json::to_string_pretty(document).map_err(|err| err.to_string()),
        };
        encoded.map_err(|message| self.error(message))
    }

    /// Decodes a document; blank input is an empty collection.
    pub fn decode(self, content: &str) -> RepoResult<EntryDocument> {
        if content.trim().is_empty() {
            return Ok(EntryDocument::default());
        }

        let decoded = match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|err| err.to_string()),
            Self::Toml => toml::from_str(content).map_err(|err| err.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|err| err.to_string()),
        };
        decoded.map_err(|message| self.error(message))
    }

    fn error(self, message: String) -> RepoError {
        RepoError::Format {
            format: self,
            message,
        }
    }
}

impl Display for StorageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::{EntryDocument, StorageFormat};
    use crate::model::entry::Entry;
    use crate::repo::RepoError;
    use chrono::DateTime;

    fn sample_document() -> EntryDocument {
        let start = DateTime::parse_from_rfc3339("2026-03-12T09:00:00+09:00").unwrap();
        let end = DateTime::parse_from_rfc3339("2026-03-12T10:15:00+09:00").unwrap();
        let stopped = Entry::with_id("aaa", "writing", start)
            .unwrap()
            .with_tags(["deep", "focus"])
            .with_comment("chapter 3")
            .with_end_time(end)
            .unwrap();
        let running = Entry::with_id("bbb", "review", end).unwrap();
        EntryDocument {
            entries: vec![stopped, running],
        }
    }

    #[test]
    fn every_format_decodes_what_it_encodes() {
        let document = sample_document();
        for format in [StorageFormat::Yaml, StorageFormat::Toml, StorageFormat::Json] {
            let text = format.encode(&document).unwrap();
            assert_eq!(format.decode(&text).unwrap(), document, "format {format}");
        }
    }

    #[test]
    fn toml_omits_missing_end_time() {
        let text = StorageFormat::Toml.encode(&sample_document()).unwrap();
        assert_eq!(text.matches("end_time").count(), 1);
        assert!(text.contains("[[entries]]"));
    }

    #[test]
    fn blank_content_is_empty_document() {
        assert_eq!(
            StorageFormat::Json.decode("  \n").unwrap(),
            EntryDocument::default()
        );
    }

    #[test]
    fn decode_rejects_reversed_window() {
        let content = r#"{"entries":[{"id":"x","start_time":"2026-03-12T10:00:00Z","end_time":"2026-03-12T09:00:00Z","project":"p","tags":[],"comment":""}]}"#;
        let err = StorageFormat::Json.decode(content).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Format {
                format: StorageFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(matches!(
            StorageFormat::from_extension("xml"),
            Err(RepoError::UnsupportedFormat(ext)) if ext == "xml"
        ));
    }
}
