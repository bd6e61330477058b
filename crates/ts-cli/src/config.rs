//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Model used for category suggestions unless configured otherwise.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the storage database.
    pub storage_path: PathBuf,
    /// Claude API key for category suggestions.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Claude model name.
    pub model: String,
    /// Messages API endpoint.
    pub api_url: String,
    /// Seconds before a suggestion request is abandoned.
    pub request_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("storage_path", &self.storage_path)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            storage_path: data_dir.join("trackstar.db"),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: ts_llm::ANTHROPIC_API_URL.to_string(),
            request_timeout_secs: ts_llm::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, the user config file, `config_path`,
    /// `ANTHROPIC_API_KEY`, then `TRACKSTAR_*` variables. A zero
    /// `request_timeout_secs` is rejected.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::raw()
                .only(&["ANTHROPIC_API_KEY"])
                .map(|_| "api_key".into()),
        );

        // Load from environment variables (TRACKSTAR_*)
        figment = figment.merge(Env::prefixed("TRACKSTAR_"));

        let config: Self = figment.extract()?;
        if config.request_timeout_secs == 0 {
            return Err(figment::Error::from(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// The configured API key, if it is non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Returns the platform-specific config directory for trackstar.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("trackstar"))
}

/// Returns the platform-specific data directory for trackstar.
///
/// On Linux: `~/.local/share/trackstar`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("trackstar"))
}
