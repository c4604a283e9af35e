//! Shell session configuration.
//!
//! # Responsibility
//! - Collect the knobs a shell session needs in one validated value.
//!
//! # Invariants
//! - `ShellConfig::default()` always validates.
//! - A configured log directory is absolute (see `logging::init_logging`).

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Default backing file, relative to the working directory.
pub const DEFAULT_STORAGE_FILE: &str = "file.json";
/// Default interactive prompt.
pub const DEFAULT_PROMPT: &str = "(hbnb) ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyStoragePath,
    EmptyPrompt,
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStoragePath => write!(f, "storage path cannot be empty"),
            Self::EmptyPrompt => write!(f, "prompt cannot be empty"),
            Self::RelativeLogDir(path) => {
                write!(f, "log dir must be an absolute path, got `{}`", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings for one shell process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// JSON backing file for the registry.
    pub storage_path: PathBuf,
    /// Prompt written before each line is read.
    pub prompt: String,
    /// Whether the prompt is written at all (off for piped input).
    pub show_prompt: bool,
    /// Log level passed to `init_logging`.
    pub log_level: String,
    /// File log directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_FILE),
            prompt: DEFAULT_PROMPT.to_string(),
            show_prompt: true,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl ShellConfig {
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    pub fn with_prompt(mut self, show_prompt: bool) -> Self {
        self.show_prompt = show_prompt;
        self
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStoragePath);
        }
        if self.prompt.is_empty() {
            return Err(ConfigError::EmptyPrompt);
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        Ok(())
    }

    /// Prompt to write, if enabled.
    pub fn active_prompt(&self) -> Option<&str> {
        self.show_prompt.then_some(self.prompt.as_str())
    }
}
