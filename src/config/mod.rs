//! Configuration module for Sitelens
//!
//! This module handles loading the optional TOML configuration file, applying
//! environment overrides, and resolving the pipeline settings with their
//! fallback defaults.
//!
//! # Example
//!
//! ```no_run
//! use sitelens::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitelens.toml")).unwrap();
//! let settings = config.pipeline_settings();
//! println!("Pool size: {}", settings.pool_size);
//! ```

mod parser;
mod settings;
mod types;

// Re-export types
pub use types::{AnalysisConfig, Config, StorageConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{apply_env_overrides, load_config, load_config_from_env};
pub use settings::{
    PipelineSettings, DEFAULT_POLL_INTERVAL, DEFAULT_POOL_SIZE, DEFAULT_TASK_TIMEOUT,
};
