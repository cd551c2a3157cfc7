//! Configuration management for clish.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::definitions::{DefinitionDiscovery, DEFAULT_EXTENSION, DEFAULT_SEARCH_PATH};
use crate::execution::{RunMode, ThreadConfig};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Definition discovery configuration.
    pub definitions: DefinitionsSection,
    /// Session execution configuration.
    pub shell: ShellSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Definition discovery section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionsSection {
    /// Semicolon-separated directory list.
    pub path: String,
    /// Extension of definition files.
    pub extension: String,
    /// Directory substituted for a leading `~`.
    pub home: Option<PathBuf>,
}

impl Default for DefinitionsSection {
    fn default() -> Self {
        Self {
            path: DEFAULT_SEARCH_PATH.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            home: None,
        }
    }
}

/// Session execution section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSection {
    /// Prompt shown before interactive reads.
    pub prompt: String,
    /// Run the session on a worker thread.
    pub use_thread: bool,
    /// Worker thread name.
    pub thread_name: String,
    /// Worker stack size in bytes.
    pub stack_size: Option<usize>,
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            prompt: "clish> ".to_string(),
            use_thread: false,
            thread_name: "clish-shell".to_string(),
            stack_size: None,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("CLISH_PATH").filter(|p| !p.is_empty()) {
            self.definitions.path = path;
        }

        if self.definitions.home.is_none() {
            self.definitions.home = var("HOME").filter(|h| !h.is_empty()).map(PathBuf::from);
        }

        if let Some(level) = var("CLISH_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref path) = args.path {
            self.definitions.path = path.clone();
        }

        if args.thread {
            self.shell.use_thread = true;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Build the discovery pass described by this configuration.
    pub fn discovery(&self) -> DefinitionDiscovery {
        DefinitionDiscovery::new(self.definitions.path.clone())
            .home(self.definitions.home.clone())
            .extension(self.definitions.extension.clone())
    }

    /// Worker thread settings.
    pub fn thread_config(&self) -> ThreadConfig {
        ThreadConfig {
            name: Some(self.shell.thread_name.clone()).filter(|n| !n.is_empty()),
            stack_size: self.shell.stack_size,
        }
    }

    /// Inline or threaded, per `shell.use_thread`.
    pub fn run_mode(&self) -> RunMode {
        if self.shell.use_thread {
            RunMode::Threaded(self.thread_config())
        } else {
            RunMode::Inline
        }
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
