use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::constants::{self, intervals};
use crate::feedback::FeedbackSettings;
use crate::http::HttpSettings;
use crate::storage::FileStorage;
use crate::stores::StoreSettings;

pub const USER_ID_ENV: &str = "IKUYO_USER_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub api: ApiConfig,

    pub feedback: FeedbackConfig,

    pub cache: CacheConfig,

    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human format.
    pub json_logs: bool,

    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend root including the version prefix, e.g. `http://host:8000/api/v1`.
    pub base_url: String,

    pub timeout_seconds: u64,

    /// Sent as `X-User-Id` on every request.
    pub user_id: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_API_BASE_URL.to_string(),
            timeout_seconds: intervals::REQUEST_TIMEOUT.as_secs(),
            user_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Requests faster than this never show the loading indicator.
    pub loading_delay_ms: u64,

    pub toast_duration_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            loading_delay_ms: millis(intervals::LOADING_SHOW_DELAY),
            toast_duration_ms: millis(intervals::TOAST_DURATION),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub calendar_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            calendar_ttl_secs: intervals::CALENDAR_CACHE_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub persist_debounce_ms: u64,

    /// Where page snapshots are kept between runs. Defaults to the platform
    /// data directory.
    pub session_file: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persist_debounce_ms: millis(intervals::PERSIST_DEBOUNCE),
            session_file: None,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Overrides file values with `IKUYO_API_BASE_URL` and `IKUYO_USER_ID`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = var(constants::API_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = base_url;
        }
        if let Some(user_id) = var(USER_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.user_id = Some(user_id);
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ikuyo").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ikuyo").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("API base URL must use http or https, got {}", url.scheme());
        }

        if self.api.timeout_seconds == 0 {
            anyhow::bail!("API timeout must be > 0");
        }

        if self.cache.calendar_ttl_secs == 0 {
            anyhow::bail!("Calendar cache TTL must be > 0");
        }

        Ok(())
    }

    #[must_use]
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_seconds),
            user_id: self.api.user_id.clone(),
        }
    }

    #[must_use]
    pub const fn feedback_settings(&self) -> FeedbackSettings {
        FeedbackSettings {
            loading_delay: Duration::from_millis(self.feedback.loading_delay_ms),
            toast_duration: Duration::from_millis(self.feedback.toast_duration_ms),
        }
    }

    #[must_use]
    pub const fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            calendar_ttl: Duration::from_secs(self.cache.calendar_ttl_secs),
            persist_debounce: Duration::from_millis(self.storage.persist_debounce_ms),
        }
    }

    #[must_use]
    pub fn session_path(&self) -> Option<PathBuf> {
        self.storage
            .session_file
            .as_ref()
            .map(PathBuf::from)
            .or_else(FileStorage::default_path)
    }
}
