use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_MEETING_NAME: &str = "Untitled meeting";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the meeting service, without a trailing path.
    pub base_url: String,
    /// Per-request timeout. Upload and stop-recording block until the server has
    /// finished processing, so this is deliberately long.
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name used when the naming prompt is left blank.
    pub default_meeting_name: String,
    /// Ask for a meeting name after upload/recording. When false the default is used.
    pub prompt_for_name: bool,
    pub download_dir: Option<PathBuf>,
    pub default_download_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: 600,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_meeting_name: DEFAULT_MEETING_NAME.to_string(),
            prompt_for_name: true,
            download_dir: None,
            default_download_format: "txt".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }
}

impl SessionConfig {
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(global::default_download_dir)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }

    /// Apply a `--api-url` style override on top of the file settings.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.server.base_url = url;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(600));
        assert_eq!(config.session.default_meeting_name, "Untitled meeting");
        assert!(config.session.prompt_for_name);
        assert_eq!(config.session.default_download_format, "txt");
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nbase_url = \"http://meetings.local:9000\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.base_url, "http://meetings.local:9000");
        assert_eq!(config.server.request_timeout_seconds, 600);
        assert_eq!(config.session.default_meeting_name, DEFAULT_MEETING_NAME);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = [").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_base_url_override() {
        let config = Config::default().with_base_url(Some("http://10.0.0.2:8000".to_string()));
        assert_eq!(config.server.base_url, "http://10.0.0.2:8000");

        let config = Config::default().with_base_url(None);
        assert_eq!(config.server.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let server = ServerConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: 0,
        };
        assert_eq!(server.request_timeout(), Duration::from_secs(1));
    }
}
