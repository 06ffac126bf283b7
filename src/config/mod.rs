//! Configuration hierarchy
//!
//! Values are layered with the following precedence:
//! command line > `RANGEMUX_*` environment variables > TOML file > defaults.
//! The command line layer is applied by the caller after [`RemuxConfig::load`].

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::libav::parse_log_level;
use crate::domain::model::StopPolicy;
use crate::error::{RemuxError, RemuxResult};

/// File picked up from the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "rangemux.toml";

pub const ENV_OUTPUT_FORMAT: &str = "RANGEMUX_OUTPUT_FORMAT";
pub const ENV_STOP_POLICY: &str = "RANGEMUX_STOP_POLICY";
pub const ENV_LOG_LEVEL: &str = "RANGEMUX_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "RANGEMUX_LOG_FORMAT";
pub const ENV_FFMPEG_LOG_LEVEL: &str = "RANGEMUX_FFMPEG_LOG_LEVEL";
pub const ENV_TIMEOUT_SECS: &str = "RANGEMUX_TIMEOUT_SECS";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output
    #[default]
    Pretty,
    /// Single-line output
    Compact,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = RemuxError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(RemuxError::Config {
                message: format!(
                    "Unknown log format '{}', expected pretty, compact or json",
                    other
                ),
            }),
        }
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive for our own events (`info`, `rangemux=debug`, ...)
    pub level: String,
    pub format: LogFormat,
    /// Verbosity of FFmpeg's internal logger
    pub ffmpeg_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            ffmpeg_level: "error".to_string(),
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemuxConfig {
    /// Muxer short name for clip outputs
    pub output_format: String,
    pub stop_policy: StopPolicy,
    /// Abort a clip job after this many seconds
    pub timeout_secs: Option<u64>,
    pub log: LoggingConfig,
    /// File the values were read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
    /// Number of `RANGEMUX_*` variables applied
    #[serde(skip)]
    pub env_overrides: usize,
}

impl Default for RemuxConfig {
    fn default() -> Self {
        Self {
            output_format: "mp4".to_string(),
            stop_policy: StopPolicy::Global,
            timeout_secs: None,
            log: LoggingConfig::default(),
            source: None,
            env_overrides: 0,
        }
    }
}

impl RemuxConfig {
    /// Build the file + environment layers.
    ///
    /// An explicit path must exist; otherwise [`DEFAULT_CONFIG_FILE`] is read
    /// when present in the working directory.
    pub fn load(explicit: Option<&Path>) -> RemuxResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a TOML configuration file
    pub fn from_file(path: &Path) -> RemuxResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RemuxError::Config {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let mut config = Self::from_toml_str(&content).map_err(|e| RemuxError::Config {
            message: format!("{}: {}", path.display(), e),
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> RemuxResult<Self> {
        toml::from_str(content).map_err(|e| RemuxError::Config {
            message: format!("Failed to parse TOML config: {}", e),
        })
    }

    /// Apply `RANGEMUX_*` overrides through a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> RemuxResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = 0usize;

        if let Some(value) = lookup(ENV_OUTPUT_FORMAT) {
            self.output_format = value;
            overrides += 1;
        }
        if let Some(value) = lookup(ENV_STOP_POLICY) {
            self.stop_policy = StopPolicy::parse(&value)?;
            overrides += 1;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log.level = value;
            overrides += 1;
        }
        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            self.log.format = value.parse()?;
            overrides += 1;
        }
        if let Some(value) = lookup(ENV_FFMPEG_LOG_LEVEL) {
            self.log.ffmpeg_level = value;
            overrides += 1;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            let seconds = value.trim().parse::<u64>().map_err(|e| RemuxError::Config {
                message: format!("{} must be a whole number of seconds: {}", ENV_TIMEOUT_SECS, e),
            })?;
            self.timeout_secs = Some(seconds);
            overrides += 1;
        }

        self.env_overrides += overrides;
        Ok(())
    }

    /// Report where the configuration came from.
    ///
    /// Loading happens before the subscriber exists, so this is called once
    /// logging is installed.
    pub fn log_origin(&self) {
        match &self.source {
            Some(path) => info!("Loaded configuration from {}", path.display()),
            None => debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE),
        }
        if self.env_overrides > 0 {
            debug!("Applied {} environment overrides", self.env_overrides);
        }
    }

    /// Check values that cannot be expressed in the types
    pub fn validate(&self) -> RemuxResult<()> {
        if self.output_format.trim().is_empty() {
            return Err(RemuxError::Config {
                message: "output_format must not be empty".to_string(),
            });
        }
        if self.timeout_secs == Some(0) {
            return Err(RemuxError::Config {
                message: "timeout_secs must be greater than zero".to_string(),
            });
        }
        tracing_subscriber::EnvFilter::try_new(&self.log.level).map_err(|e| {
            RemuxError::Config {
                message: format!("Invalid log level '{}': {}", self.log.level, e),
            }
        })?;
        parse_log_level(&self.log.ffmpeg_level)?;
        Ok(())
    }
}
