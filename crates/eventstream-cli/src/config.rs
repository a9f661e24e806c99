//! Configuration file handling for eventstream

use anyhow::{Context, Result};
use eventstream_client::{Framing, StreamConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default stream URL
    pub url: Option<String>,
    /// Default username
    pub username: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
    /// Session settings
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Stream options given on the command line
#[derive(Debug, Clone, Default)]
pub struct StreamArgs {
    pub retry_ms: Option<u64>,
    pub stream_timeout_secs: Option<u64>,
    pub buffered: bool,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("eventstream");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        url: Option<&str>,
        username: Option<&str>,
        output: Option<&str>,
        no_color: bool,
        stream: &StreamArgs,
    ) -> MergedConfig {
        let mut stream_config = self.stream.clone();
        if let Some(retry_ms) = stream.retry_ms {
            stream_config.retry_interval_ms = retry_ms;
        }
        if let Some(timeout) = stream.stream_timeout_secs {
            stream_config.stream_timeout_secs = Some(timeout);
        }
        if stream.buffered {
            stream_config.framing = Framing::Buffered;
        }

        MergedConfig {
            url: url.map(String::from).or_else(|| self.url.clone()),
            username: username
                .map(String::from)
                .or_else(|| self.username.clone()),
            output: output
                .map(String::from)
                .or_else(|| self.output.clone())
                .unwrap_or_else(|| "text".to_string()),
            no_color: no_color || self.no_color.unwrap_or(false),
            stream: stream_config,
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub output: String,
    pub no_color: bool,
    pub stream: StreamConfig,
}
