//! Settings file loading.
//!
//! # Responsibility
//! - Load user settings from YAML or TOML, falling back to defaults.
//! - Apply `TALLY_*` environment overrides after the file is read.
//!
//! # Invariants
//! - Core services never read settings themselves; callers resolve a
//!   `Settings` value and pass plain values (paths, rules) in.

use crate::editor::{EditFormat, ShellEditor};
use crate::service::auto_tag::{AutoTagEngine, AutoTagError, AutoTagRule};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

const HOME_DIR_NAME: &str = ".tally";
const CONFIG_FILE_NAME: &str = "config.yaml";
const DEFAULT_DATA_FILE: &str = "time_entries.yaml";
const DEFAULT_EDITOR: &str = "vi";

pub const ENV_DATA_FILENAME: &str = "TALLY_DATA_FILENAME";
pub const ENV_EDITOR: &str = "TALLY_EDITOR";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        message: String,
    },
    UnsupportedFormat(PathBuf),
    AutoTag(AutoTagError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read `{}`: {source}", path.display()),
            Self::Parse { path, message } => {
                write!(f, "invalid settings file `{}`: {message}", path.display())
            }
            Self::UnsupportedFormat(path) => write!(
                f,
                "unsupported settings file `{}`; expected .yaml, .yml or .toml",
                path.display()
            ),
            Self::AutoTag(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::AutoTag(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AutoTagError> for ConfigError {
    fn from(value: AutoTagError) -> Self {
        Self::AutoTag(value)
    }
}

/// User-level settings for the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Store path; its extension selects the backend.
    pub data_filename: PathBuf,
    pub editor: String,
    pub editor_format: EditFormat,
    /// Falls back to `logging::default_log_level()` when unset.
    pub log_level: Option<String>,
    pub log_dir: PathBuf,
    pub auto_tag_rules: Vec<AutoTagRule>,
}

impl Default for Settings {
    fn default() -> Self {
        let home = home_directory();
        Self {
            data_filename: home.join(DEFAULT_DATA_FILE),
            editor: std::env::var("EDITOR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EDITOR.to_string()),
            editor_format: EditFormat::default(),
            log_level: None,
            log_dir: home.join("logs"),
            auto_tag_rules: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads `~/.tally/config.yaml` when present, then env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_config_path();
        let settings = if path.exists() {
            Self::read_file(&path)?
        } else {
            Self::default()
        };
        Ok(settings.with_env_overrides())
    }

    /// Loads a specific settings file, then env overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::read_file(path.as_ref())?.with_env_overrides())
    }

    /// Parses a YAML or TOML settings file chosen by extension.
    pub fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|value| value.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let parsed = match extension.as_str() {
            "yaml" | "yml" if content.trim().is_empty() => Ok(Self::default()),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|err| err.to_string()),
            "toml" => toml::from_str(&content).map_err(|err| err.to_string()),
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_DATA_FILENAME).ok(),
            std::env::var(ENV_EDITOR).ok(),
        )
    }

    fn with_overrides(mut self, data_filename: Option<String>, editor: Option<String>) -> Self {
        if let Some(value) = data_filename.filter(|value| !value.trim().is_empty()) {
            self.data_filename = PathBuf::from(value);
        }
        if let Some(value) = editor.filter(|value| !value.trim().is_empty()) {
            self.editor = value;
        }
        self
    }

    /// Compiles the declared auto-tag rules.
    pub fn auto_tag_engine(&self) -> Result<AutoTagEngine, ConfigError> {
        Ok(AutoTagEngine::new(&self.auto_tag_rules)?)
    }

    pub fn shell_editor(&self) -> ShellEditor {
        ShellEditor::new(self.editor.clone(), self.editor_format)
    }
}

/// `~/.tally`, or `./.tally` when no home directory is known.
pub fn home_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(HOME_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    home_directory().join(CONFIG_FILE_NAME)
}
