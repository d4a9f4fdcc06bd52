use anyhow::{Context, Result};
use resync::{FollowMode, Formatter, RetryPolicy, Schema, SyncOptions};
use resync_core::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings read from the optional `--config` TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub http: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub schema: Schema,
    #[serde(default)]
    pub follow: FollowMode,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(with = "humantime_serde", default = "default_initial_interval")]
    pub initial_interval: Duration,
    #[serde(with = "humantime_serde", default = "default_max_interval")]
    pub max_interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    /// Also write JSON logs to this file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            schema: Schema::default(),
            follow: FollowMode::default(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_interval: default_initial_interval(),
            max_interval: default_max_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: None,
        }
    }
}

/// Values given on the command line; each one beats the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub schema: Option<Schema>,
    pub follow: Option<FollowMode>,
    pub formatter: Option<Formatter>,
    pub remove: bool,
    pub batch_size: Option<usize>,
    pub max_attempts: Option<u32>,
    pub log_level: Option<String>,
    pub log_json: bool,
}

impl FileConfig {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, built-in defaults otherwise
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path).await,
            None => Ok(Self::default()),
        }
    }

    pub fn sync_options(&self, overrides: &Overrides) -> SyncOptions {
        let max_attempts = overrides.max_attempts.unwrap_or(self.sync.max_attempts);

        SyncOptions {
            schema: overrides.schema.unwrap_or(self.sync.schema),
            follow_mode: overrides.follow.unwrap_or(self.sync.follow),
            formatter: overrides.formatter,
            remove: overrides.remove,
            batch_size: overrides.batch_size.unwrap_or(self.sync.batch_size),
            retry: RetryPolicy::new(max_attempts)
                .with_intervals(self.retry.initial_interval, self.retry.max_interval),
        }
    }

    pub fn logging(&self, overrides: &Overrides) -> LoggingConfig {
        LoggingConfig {
            level: overrides
                .log_level
                .clone()
                .unwrap_or_else(|| self.logging.level.clone()),
            json: overrides.log_json || self.logging.json,
            file: self.logging.file.clone(),
        }
    }
}

// Default value functions
fn default_batch_size() -> usize { 1 }
fn default_max_attempts() -> u32 { 1 }
fn default_initial_interval() -> Duration { RetryPolicy::default().initial_interval }
fn default_max_interval() -> Duration { RetryPolicy::default().max_interval }
fn default_log_level() -> String { "info".to_string() }
