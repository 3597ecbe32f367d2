// Configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::AppConfig;

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("streamchat");

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load the user config, writing the defaults on first run
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(config_path: &Path) -> Result<AppConfig> {
    if !config_path.exists() {
        let default_config = AppConfig::default();
        save_config_to(config_path, &default_config)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(config_path).context("Failed to read config file")?;

    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;

    Ok(config)
}

pub fn save_config_to(config_path: &Path, config: &AppConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(config_path, contents).context("Failed to write config file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_env() -> TempDir {
        TempDir::new().unwrap()
    }

    #[test]
    fn test_load_config_creates_default() {
        let temp_dir = setup_test_env();
        let config_path = temp_dir.path().join("config.toml");

        let config = load_config_from(&config_path);
        assert!(
            config.is_ok(),
            "Config loading failed: {:?}",
            config.as_ref().err()
        );
        assert_eq!(config.unwrap(), AppConfig::default());
        assert!(config_path.exists());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = setup_test_env();
        let config_path = temp_dir.path().join("config.toml");

        let config = AppConfig {
            base_url: "http://dashboard:8050".to_string(),
            request_timeout: Some(120),
            ..Default::default()
        };
        save_config_to(&config_path, &config).unwrap();

        let loaded = load_config_from(&config_path).unwrap();
        assert_eq!(loaded.base_url, "http://dashboard:8050");
        assert_eq!(loaded.request_timeout, Some(120));
        assert_eq!(loaded.endpoint, "/streaming-chat");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = setup_test_env();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "base_url = \"http://localhost:9000\"\n").unwrap();

        let config = load_config_from(&config_path).unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.endpoint, "/streaming-chat");
        assert!(config.highlight);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp_dir = setup_test_env();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "base_url = [").unwrap();

        let err = load_config_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let serialized = toml::to_string(&config);
        assert!(serialized.is_ok());

        let deserialized: Result<AppConfig, _> = toml::from_str(&serialized.unwrap());
        assert!(deserialized.is_ok());
    }
}
