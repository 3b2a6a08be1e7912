//! External editor round trip for a single entry.
//!
//! # Responsibility
//! - Serialize an entry into a human-editable document.
//! - Hand it to the user's editor program and parse the result back.
//!
//! # Invariants
//! - The temporary file is removed on every exit path.
//! - The calling thread blocks until the editor exits; no timeout.
//! - Parsed entries are validated; persisting them is the caller's job.

use crate::model::entry::Entry;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::Write;
use std::process::{Command, ExitStatus};

/// Editing capability used by the tracker service.
pub trait EntryEditor {
    fn edit(&self, entry: &Entry) -> Result<Entry, EditorError>;
}

/// Exchange format used for the temporary file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditFormat {
    #[default]
    Yaml,
    Toml,
}

impl EditFormat {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Yaml => ".yaml",
            Self::Toml => ".toml",
        }
    }

    pub fn render(self, entry: &Entry) -> Result<String, EditorError> {
        let rendered = match self {
            Self::Yaml => serde_yaml::to_string(entry).map_err(|err| err.to_string()),
            Self::Toml => toml::to_string(entry).map_err(|err| err.to_string()),
        };
        rendered.map_err(EditorError::Serialize)
    }

    pub fn parse(self, content: &str) -> Result<Entry, EditorError> {
        let parsed = match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|err| err.to_string()),
            Self::Toml => toml::from_str(content).map_err(|err| err.to_string()),
        };
        parsed.map_err(EditorError::Parse)
    }
}

/// Editor failure: the editor could not run or produced unusable content.
#[derive(Debug)]
pub enum EditorError {
    EmptyCommand,
    Spawn {
        program: String,
        source: std::io::Error,
    },
    ExitStatus {
        program: String,
        status: ExitStatus,
    },
    Io(std::io::Error),
    Serialize(String),
    Parse(String),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCommand => write!(f, "editor command is empty"),
            Self::Spawn { program, source } => {
                write!(f, "failed to launch editor `{program}`: {source}")
            }
            Self::ExitStatus { program, status } => {
                write!(f, "editor `{program}` exited unsuccessfully ({status})")
            }
            Self::Io(err) => write!(f, "editor temp file error: {err}"),
            Self::Serialize(message) => write!(f, "cannot serialize entry for editing: {message}"),
            Self::Parse(message) => write!(f, "invalid entry format: {message}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EditorError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Runs an external program on a temporary file.
///
/// `command` is split on whitespace: the first token is the program, the
/// rest are leading arguments, and the file path is appended last
/// (`code --wait` works, shell quoting does not).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellEditor {
    command: String,
    format: EditFormat,
}

impl ShellEditor {
    pub fn new(command: impl Into<String>, format: EditFormat) -> Self {
        Self {
            command: command.into(),
            format,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn format(&self) -> EditFormat {
        self.format
    }
}

impl EntryEditor for ShellEditor {
    fn edit(&self, entry: &Entry) -> Result<Entry, EditorError> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or(EditorError::EmptyCommand)?;
        let args: Vec<&str> = parts.collect();

        let mut staged = tempfile::Builder::new()
            .prefix("tally-entry-")
            .suffix(self.format.suffix())
            .tempfile()?;
        staged.write_all(self.format.render(entry)?.as_bytes())?;
        staged.flush()?;
        // Closes the handle; the path is still deleted when dropped.
        let temp_path = staged.into_temp_path();

        info!(
            "event=entry_edit module=editor status=start program={program} entry_id={}",
            entry.id
        );
        let status = Command::new(program)
            .args(&args)
            .arg(temp_path.as_os_str())
            .status()
            .map_err(|source| EditorError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !status.success() {
            warn!(
                "event=entry_edit module=editor status=error program={program} exit={status}"
            );
            return Err(EditorError::ExitStatus {
                program: program.to_string(),
                status,
            });
        }

        let content = fs::read_to_string(&temp_path)?;
        let edited = self.format.parse(&content)?;
        info!(
            "event=entry_edit module=editor status=ok entry_id={}",
            edited.id
        );
        Ok(edited)
    }
}
