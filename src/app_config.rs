use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::decoder::DecoderOptions;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// External decoder invocation settings
    #[serde(default)]
    pub decoder: DecoderConfig,

    /// Directory the decoder writes artifacts into; a temporary directory
    /// is used when unset
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// External decoder process settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DecoderConfig {
    // @field: Decoder executable name or path
    #[serde(default = "default_decoder_command")]
    pub command: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_decoder_command() -> String {
    "caption-inspector".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            command: default_decoder_command(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl From<&DecoderConfig> for DecoderOptions {
    fn from(config: &DecoderConfig) -> Self {
        DecoderOptions {
            command: config.command.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Log level configuration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            decoder: DecoderConfig::default(),
            output_dir: None,
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
