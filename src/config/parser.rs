use crate::config::types::Config;
use crate::ConfigError;
use std::path::Path;

/// Environment variable overriding the poll interval (seconds)
pub const ENV_INTERVAL: &str = "ANALYZE_INTERVAL";

/// Environment variable overriding the per-analysis timeout (seconds)
pub const ENV_TIMEOUT: &str = "ANALYZE_TIMEOUT";

/// Environment variable overriding the pool size
pub const ENV_WORKER_COUNT: &str = "ANALYZE_WORKER_COUNT";

/// Environment variable overriding the database path
pub const ENV_DATABASE: &str = "SITELENS_DATABASE";

/// Loads and parses a configuration file from the given path
///
/// Out-of-range analysis values are not an error here; they are replaced by
/// defaults when the settings are resolved.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Loads the configuration file (if any) and applies process environment overrides
pub fn load_config_from_env(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies overrides from an environment-like lookup
///
/// A variable that is set but not a number counts as invalid and therefore
/// resolves to the default, not to the file value.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read_int = |key: &str| lookup(key).map(|v| v.trim().parse::<i64>().unwrap_or(0));

    if let Some(value) = read_int(ENV_INTERVAL) {
        config.analysis.poll_interval_secs = Some(value);
    }
    if let Some(value) = read_int(ENV_TIMEOUT) {
        config.analysis.timeout_secs = Some(value);
    }
    if let Some(value) = read_int(ENV_WORKER_COUNT) {
        config.analysis.pool_size = Some(value);
    }
    if let Some(path) = lookup(ENV_DATABASE).filter(|p| !p.trim().is_empty()) {
        config.storage.database_path = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[analysis]
poll-interval-secs = 5
timeout-secs = 20
pool-size = 3

[user-agent]
crawler-name = "TestAnalyzer"
crawler-version = "1.0"

[storage]
database-path = "./test.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();
        let settings = config.pipeline_settings();

        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert_eq!(settings.task_timeout, Duration::from_secs(20));
        assert_eq!(settings.pool_size, 3);
        assert_eq!(config.user_agent.crawler_name, "TestAnalyzer");
        assert_eq!(config.storage.database_path, "./test.db");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.pipeline_settings(), Default::default());
        assert_eq!(config.user_agent.crawler_name, "sitelens");
        assert_eq!(config.storage.database_path, "./sitelens.db");
    }

    #[test]
    fn test_invalid_values_fall_back_silently() {
        let config_content = r#"
[analysis]
poll-interval-secs = "soon"
timeout-secs = -3
pool-size = 0
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.pipeline_settings(), Default::default());
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let file = create_temp_config("[analysis]\npool-size = \"4\"\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.pipeline_settings().pool_size, 4);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/sitelens.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let file = create_temp_config("[analysis]\npool-size = 2\ntimeout-secs = 30\n");
        let mut config = load_config(file.path()).unwrap();

        let env: HashMap<&str, &str> = [
            (ENV_WORKER_COUNT, "6"),
            (ENV_TIMEOUT, "not-a-number"),
            (ENV_DATABASE, "/tmp/override.db"),
        ]
        .into_iter()
        .collect();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        let settings = config.pipeline_settings();
        assert_eq!(settings.pool_size, 6);
        assert_eq!(settings.task_timeout, Duration::from_secs(15));
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
        assert_eq!(config.storage.database_path, "/tmp/override.db");
    }
}
