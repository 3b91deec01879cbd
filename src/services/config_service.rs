use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
pub const BACKEND_URL_ENV: &str = "FLATCHAT_BACKEND_URL";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not find data directory")]
    NoDataDir,
    #[error("Failed to access config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid backend URL '{0}': expected an http(s) address")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

pub fn get_app_data_dir() -> Result<PathBuf, ConfigError> {
    let data_dir = dirs::data_dir()
        .ok_or(ConfigError::NoDataDir)?
        .join("Flatchat");

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

fn get_config_path() -> Result<PathBuf, ConfigError> {
    Ok(get_app_data_dir()?.join("config.json"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    save_config_to(&get_config_path()?, config)
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn get_backend_url() -> Result<String, ConfigError> {
    Ok(effective_backend_url(&load_config()?))
}

/// Stores the backend address. Used by clients created after the call.
pub fn set_backend_url(url: &str) -> Result<(), ConfigError> {
    let url = validate_backend_url(url)?;
    let mut config = load_config().unwrap_or_default();
    config.backend_url = Some(url);
    save_config(&config)
}

pub fn validate_backend_url(url: &str) -> Result<String, ConfigError> {
    let trimmed = url.trim();
    match Url::parse(trimmed) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(trimmed.to_string()),
        _ => Err(ConfigError::InvalidUrl(url.to_string())),
    }
}

/// Backend address: environment, then config file, then the local default.
pub fn effective_backend_url(config: &Config) -> String {
    resolve_backend_url(config, std::env::var(BACKEND_URL_ENV).ok())
}

fn resolve_backend_url(config: &Config, env_value: Option<String>) -> String {
    env_value
        .filter(|value| !value.trim().is_empty())
        .or_else(|| config.backend_url.clone().filter(|value| !value.trim().is_empty()))
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

pub fn request_timeout(config: &Config) -> Duration {
    Duration::from_secs(
        config
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    )
}

pub fn get_full_config() -> Result<Config, ConfigError> {
    load_config()
}
