use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{
    locate::DEFAULT_FALLBACK_CITY, model::Coordinates, provider::ProviderId,
    workflow::RefreshMode,
};

/// Environment variable that supplies an API key for the default provider.
pub const API_KEY_ENV: &str = "CITYCAST_API_KEY";

/// Value shipped in sample configs; never a real key.
const PLACEHOLDER_API_KEY: &str = "your_weather_api_key_here";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Overrides the provider's API host, e.g. for a proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Provider used for lookups; weatherapi when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<ProviderId>,

    /// City shown when the current position cannot be determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_city: Option<String>,

    #[serde(default)]
    pub refresh_mode: RefreshMode,

    /// Fixed position used in place of geolocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,

    /// Example TOML:
    /// [providers.weatherapi]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(skip)]
    env_api_key: Option<String>,
}

impl Config {
    pub fn default_provider_id(&self) -> ProviderId {
        self.default_provider.unwrap_or(ProviderId::WeatherApi)
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id);
    }

    pub fn fallback_city(&self) -> &str {
        self.fallback_city
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_FALLBACK_CITY)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    /// `CITYCAST_API_KEY` is picked up as well.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.env_api_key = std::env::var(API_KEY_ENV).ok();
        Ok(cfg)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "citycast", "citycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        let base_url = self.provider_config(provider_id).and_then(|p| p.base_url.clone());
        self.providers
            .insert(provider_id.as_str().to_string(), ProviderConfig { api_key, base_url });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id);
        }
    }

    /// Returns API key for a provider, if a usable one is present.
    ///
    /// The environment key only applies to the default provider and only when
    /// the file holds none.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        let from_file = self
            .providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| is_usable_key(key));

        from_file.or_else(|| {
            self.env_api_key
                .as_deref()
                .filter(|key| provider_id == self.default_provider_id() && is_usable_key(key))
        })
    }

    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id).and_then(|cfg| cfg.base_url.as_deref())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    pub fn with_env_api_key(mut self, key: impl Into<String>) -> Self {
        self.env_api_key = Some(key.into());
        self
    }
}

fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != PLACEHOLDER_API_KEY
}
