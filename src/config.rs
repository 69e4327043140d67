use config::{Config as ConfigLoader, Environment, File, FileFormat};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

/// Default API base URL (the development server of the bank backend)
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Prefix for environment overrides, e.g. `K9TX_API_URL`
pub const ENV_PREFIX: &str = "K9TX";

/// Client configuration for the bank API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankConfig {
    /// Base URL every endpoint path is appended to
    pub api_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Balance polling period in seconds
    pub balance_poll_secs: u64,
    /// Blog feed polling period in seconds
    pub blog_poll_secs: u64,
    /// Quiet period before an account number is resolved, in milliseconds
    pub account_lookup_debounce_ms: u64,
    /// Shortest account number worth resolving
    pub account_lookup_min_len: usize,
    /// Where sessions are persisted; `~/.k9tx/sessions` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 15,
            balance_poll_secs: 10,
            blog_poll_secs: 5,
            account_lookup_debounce_ms: 400,
            account_lookup_min_len: 6,
            storage_dir: None,
        }
    }
}

impl BankConfig {
    /// Create a config for the given API URL with default timings
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration in layers: defaults, then the TOML file at `path` if it
    /// exists, then `K9TX_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let defaults = Self::default();
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let settings = ConfigLoader::builder()
            .set_default("api_url", defaults.api_url.as_str())
            .and_then(|b| b.set_default("request_timeout_secs", defaults.request_timeout_secs as i64))
            .and_then(|b| b.set_default("balance_poll_secs", defaults.balance_poll_secs as i64))
            .and_then(|b| b.set_default("blog_poll_secs", defaults.blog_poll_secs as i64))
            .and_then(|b| {
                b.set_default(
                    "account_lookup_debounce_ms",
                    defaults.account_lookup_debounce_ms as i64,
                )
            })
            .and_then(|b| {
                b.set_default("account_lookup_min_len", defaults.account_lookup_min_len as i64)
            })
            .map_err(|e| Error::Config(format!("Failed to set defaults: {}", e)))?
            .add_source(File::from(path.as_path()).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| Error::Config(format!("Failed to load config: {}", e)))?;

        let config: BankConfig = settings
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file only
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        let config: BankConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("k9tx");
        path.push("config.toml");
        path
    }

    /// Check the values a client cannot work without
    pub fn validate(&self) -> Result<(), Error> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".to_string()));
        }
        if self.balance_poll_secs == 0 || self.blog_poll_secs == 0 {
            return Err(Error::Config("Polling intervals must be positive".to_string()));
        }
        Ok(())
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url, Error> {
        Url::parse(&self.api_url)
            .map_err(|e| Error::Config(format!("Invalid API URL '{}': {}", self.api_url, e)))
    }

    /// Scheme, host and port of the API; sessions are stored per origin
    pub fn origin(&self) -> Result<String, Error> {
        Ok(self.base_url()?.origin().ascii_serialization())
    }

    /// Directory holding persisted sessions
    pub fn session_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".k9tx")
                .join("sessions")
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn balance_poll_interval(&self) -> Duration {
        Duration::from_secs(self.balance_poll_secs)
    }

    pub fn blog_poll_interval(&self) -> Duration {
        Duration::from_secs(self.blog_poll_secs)
    }

    pub fn account_lookup_debounce(&self) -> Duration {
        Duration::from_millis(self.account_lookup_debounce_ms)
    }
}
