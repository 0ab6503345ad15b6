use serde::{Deserialize, Deserializer};

use crate::config::settings::PipelineSettings;

/// Main configuration structure for Sitelens
///
/// Every section is optional; a missing file section behaves like an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Resolves the analysis section into settings the pipeline can use
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings::resolve(&self.analysis)
    }
}

/// Raw analysis pipeline configuration
///
/// Values are kept as read. Anything absent, unparsable, or not positive is
/// replaced by its default when resolved into [`PipelineSettings`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    /// Seconds between scheduler ticks
    #[serde(default, rename = "poll-interval-secs", deserialize_with = "lenient_int")]
    pub poll_interval_secs: Option<i64>,

    /// Seconds an analysis may run before it is recorded as timed out
    #[serde(default, rename = "timeout-secs", deserialize_with = "lenient_int")]
    pub timeout_secs: Option<i64>,

    /// Maximum number of analyses running at once
    #[serde(default, rename = "pool-size", deserialize_with = "lenient_int")]
    pub pool_size: Option<i64>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the analyzer
    #[serde(default = "default_crawler_name", rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the analyzer
    #[serde(default = "default_crawler_version", rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path", rename = "database-path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_crawler_name() -> String {
    "sitelens".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_database_path() -> String {
    "./sitelens.db".to_string()
}

/// Accepts integers, numeric strings, and floats; anything else reads as absent
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = toml::Value::deserialize(deserializer)?;
    Ok(match value {
        toml::Value::Integer(n) => Some(n),
        toml::Value::Float(f) => Some(f as i64),
        toml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
