//! Sitelens: a background web page analyzer
//!
//! This crate periodically picks up submitted URLs, analyzes each page under a
//! bounded, timeout-guarded worker pool, and publishes every status change to
//! live subscribers.

pub mod analyzer;
pub mod config;
pub mod hub;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sitelens operations
#[derive(Debug, Error)]
pub enum SitelensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Work item not found: {0}")]
    NotFound(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("URL is empty")]
    Empty,

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Sitelens operations
pub type Result<T> = std::result::Result<T, SitelensError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analyzer::{AnalysisError, ErrorKind, HttpAnalyzer, PageAnalyzer};
pub use config::{Config, PipelineSettings};
pub use hub::{Hub, StatusEvent, Subscriber};
pub use pipeline::{Dispatcher, Intake, Scheduler};
pub use state::{AnalysisResult, Status, WorkItem};
pub use storage::{MemoryStore, SqliteStore, Store};
pub use url::normalize_url;
