//! Configuration for the SwiftShare client.
//!
//! Settings are read from a TOML file and may be overridden by environment
//! variables. A missing file is not an error: defaults are used instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::staging::BatchLimit;

/// Environment variable overriding [`ApiConfig::base_url`].
pub const ENV_API_URL: &str = "SWIFTSHARE_API_URL";
/// Environment variable carrying the identity provider's bearer token.
pub const ENV_TOKEN: &str = "SWIFTSHARE_TOKEN";
/// Environment variable overriding the config file location.
pub const ENV_CONFIG: &str = "SWIFTSHARE_CONFIG";

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Bearer token. Usually supplied through `SWIFTSHARE_TOKEN` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/auth".to_string(),
            token: None,
            timeout_secs: 60,
        }
    }
}

impl ApiConfig {
    /// Returns the request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Upload staging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum number of files in one batch.
    pub max_batch: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_batch: BatchLimit::UPLOAD_PAGE,
        }
    }
}

/// Local path settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory downloaded files are saved into.
    pub download_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
        }
    }
}

/// Share link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Origin of the public web front-end used to build share links.
    pub public_base_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:5173".to_string(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote API configuration.
    pub api: ApiConfig,
    /// Upload configuration.
    pub upload: UploadConfig,
    /// Path configuration.
    pub paths: PathConfig,
    /// Share link configuration.
    pub share: ShareConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api.base_url = url.into();
        self
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api.token = Some(token.into());
        self
    }

    /// Sets the maximum batch size.
    #[must_use]
    pub const fn with_max_batch(mut self, max: usize) -> Self {
        self.upload.max_batch = max;
        self
    }

    /// Sets the download directory.
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.download_dir = dir.into();
        self
    }

    /// Returns the default config file location.
    ///
    /// Uses `SWIFTSHARE_CONFIG` when set, falling back to
    /// `$XDG_CONFIG_HOME/swiftshare/config.toml`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            PathBuf::from(path)
        } else {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("swiftshare")
                .join("config.toml")
        }
    }

    /// Loads configuration from `path`, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads configuration from `path` without looking at the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Applies overrides looked up through `lookup` (normally the process environment).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.api.token = Some(token);
        }
    }

    /// Saves the configuration to `path` atomically (write tmp + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let toml_str = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        let tmp_path = path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, toml_str)?;

        // The file may hold a bearer token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_app_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api/auth");
        assert!(config.api.token.is_none());
        assert_eq!(config.upload.max_batch, 5);
        assert_eq!(config.paths.download_dir, PathBuf::from("."));
    }

    #[test]
    fn builder_pattern() {
        let config = AppConfig::new()
            .with_base_url("https://files.example.com/api")
            .with_token("abc")
            .with_max_batch(10)
            .with_download_dir("/tmp/dl");

        assert_eq!(config.api.base_url, "https://files.example.com/api");
        assert_eq!(config.api.token.as_deref(), Some("abc"));
        assert_eq!(config.upload.max_batch, 10);
        assert_eq!(config.paths.download_dir, PathBuf::from("/tmp/dl"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.upload.max_batch, 5);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[upload]\nmax_batch = 10\n").unwrap();

        let config = AppConfig::load_file(&path).unwrap();
        assert_eq!(config.upload.max_batch, 10);
        assert_eq!(config.api.timeout_secs, 60);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[upload\n").unwrap();

        assert!(matches!(AppConfig::load_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig::new().with_max_batch(10).with_token("secret");
        config.save(&path).unwrap();

        let loaded = AppConfig::load_file(&path).unwrap();
        assert_eq!(loaded.upload.max_batch, 10);
        assert_eq!(loaded.api.token.as_deref(), Some("secret"));
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::new().with_token("from-file");
        config.apply_env(|key| match key {
            ENV_API_URL => Some("https://api.example.com".to_string()),
            ENV_TOKEN => Some("from-env".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.token.as_deref(), Some("from-env"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = AppConfig::new().with_token("from-file");
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.api.token.as_deref(), Some("from-file"));
    }
}
