use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{api, paging, viewport};
use crate::domain::PageSizes;
use crate::services::display::DisplayFilters;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub api: ApiConfig,

    pub paging: PagingConfig,

    pub viewport: ViewportConfig,

    pub display: DisplayFilters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Card search endpoint; query parameters are appended to it.
    pub endpoint: String,

    /// Bucket URL that serves images by `imageKey`.
    pub image_base_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,

    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: api::DEFAULT_ENDPOINT.to_string(),
            image_base_url: api::DEFAULT_IMAGE_BASE_URL.to_string(),
            request_timeout_seconds: 30,
            user_agent: api::USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    pub initial_page_size: usize,

    pub more_page_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            initial_page_size: paging::INITIAL_PAGE_SIZE,
            more_page_size: paging::MORE_PAGE_SIZE,
        }
    }
}

impl PagingConfig {
    #[must_use]
    pub const fn page_sizes(&self) -> PageSizes {
        PageSizes {
            initial: self.initial_page_size,
            more: self.more_page_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Distance outside the viewport at which images start loading.
    pub prefetch_margin_px: u32,

    /// Leading grid items that skip the observer and load eagerly.
    pub priority_items: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            prefetch_margin_px: viewport::PREFETCH_MARGIN_PX,
            priority_items: viewport::DEFAULT_GRID_COLUMNS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
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

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cardgrid").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cardgrid").join("config.toml"));
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
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.endpoint.trim().is_empty() {
            anyhow::bail!("Card API endpoint cannot be empty");
        }

        url::Url::parse(&self.api.endpoint)
            .with_context(|| format!("Invalid card API endpoint: {}", self.api.endpoint))?;

        if self.paging.initial_page_size == 0 || self.paging.more_page_size == 0 {
            anyhow::bail!("Page sizes must be > 0");
        }

        if self.api.request_timeout_seconds == 0 {
            anyhow::bail!("Request timeout must be > 0");
        }

        Ok(())
    }
}
