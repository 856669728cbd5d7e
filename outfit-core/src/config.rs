use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path, path::PathBuf, time::Duration};

use crate::provider::{ForecastSchema, ProviderId};

pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Credentials for a single external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// forecast_schema = "three-hourly"
/// utc_offset_hours = 9
///
/// [providers.openweather]
/// api_key = "..."
///
/// [providers.gemini]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: HashMap<String, ProviderConfig>,
    pub forecast_schema: ForecastSchema,
    /// Fixed offset from UTC to the civil time of the forecast region.
    pub utc_offset_hours: i32,
    /// Language for provider weather descriptions.
    pub language: String,
    pub model: String,
    pub geocode_timeout_secs: u64,
    pub forecast_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wardrobe_path: Option<PathBuf>,
    pub bind: String,
    /// When set, the last rendered prompt is written here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_prompt_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            forecast_schema: ForecastSchema::default(),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            language: "ja".to_string(),
            model: DEFAULT_MODEL.to_string(),
            geocode_timeout_secs: 5,
            forecast_timeout_secs: 10,
            generation_timeout_secs: 60,
            wardrobe_path: None,
            bind: "0.0.0.0:8000".to_string(),
            debug_prompt_path: None,
        }
    }
}

impl Config {
    /// Load config from the platform config directory, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_overrides(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "outfit", "outfit")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Overlay secrets and paths from the environment. `lookup` is `std::env::var` in production.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for id in ProviderId::all() {
            if let Some(key) = lookup(id.env_var()).filter(|k| !k.trim().is_empty()) {
                self.upsert_provider_api_key(*id, key);
            }
        }

        if let Some(path) = lookup("OUTFIT_WARDROBE_PATH").filter(|p| !p.is_empty()) {
            self.wardrobe_path = Some(PathBuf::from(path));
        }
    }

    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    /// API key for `provider_id`, or an error telling the user how to set one.
    pub fn require_api_key(&self, provider_id: ProviderId) -> Result<&str> {
        self.provider_api_key(provider_id).ok_or_else(|| {
            anyhow!(
                "No API key configured for '{provider_id}'.\n\
                 Hint: run `outfit configure {provider_id}` or set {}.",
                provider_id.env_var()
            )
        })
    }

    pub fn wardrobe_path(&self) -> PathBuf {
        if let Some(path) = &self.wardrobe_path {
            return path.clone();
        }

        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("clothes.txt"))
            .unwrap_or_else(|_| PathBuf::from("clothes.txt"))
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }

    pub fn forecast_timeout(&self) -> Duration {
        Duration::from_secs(self.forecast_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}
