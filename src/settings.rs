//! Persistent key-value settings (`apiUrl`, `captureCount`).
//!
//! Settings live in a small JSON file and are read and written
//! asynchronously by every surface. A missing or unparseable file falls
//! back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Capture endpoint base URL used when none has been configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// On-disk shape; absent keys keep their wire absence so defaults apply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SettingsData {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capture_count: Option<u64>,
}

/// Settings store shared by every surface of the agent
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<SettingsData>,
}

impl SettingsStore {
    /// Open or create the settings file at the given path
    ///
    /// Seeds `apiUrl` with the default on first open, matching the
    /// install-time behavior of the configuration surface.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();

        let mut data = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Failed to parse settings file: {}, using defaults", e);
                    SettingsData::default()
                }
            },
            Err(_) => {
                info!("No settings file at {:?}, using defaults", path);
                SettingsData::default()
            }
        };

        if data.api_url.is_none() {
            data.api_url = Some(DEFAULT_API_URL.to_string());
            persist(&path, &data)?;
        }

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Create a store with no backing file (for embedding and tests)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(SettingsData::default()),
        }
    }

    /// Default settings file location under the platform config dir
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("capture-agent")
            .join("settings.json")
    }

    /// Configured capture endpoint base URL, falling back to the default
    pub async fn api_url(&self) -> String {
        self.data
            .read()
            .await
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Raw `apiUrl` value, `None` when nothing has been stored
    pub async fn raw_api_url(&self) -> Option<String> {
        self.data.read().await.api_url.clone()
    }

    pub async fn set_api_url(&self, url: String) -> Result<(), SettingsError> {
        let mut data = self.data.write().await;
        data.api_url = Some(url);
        self.write_file(&data)
    }

    /// Stored capture count; absent means 0
    pub async fn capture_count(&self) -> u64 {
        self.data.read().await.capture_count.unwrap_or(0)
    }

    pub async fn set_capture_count(&self, count: u64) -> Result<(), SettingsError> {
        let mut data = self.data.write().await;
        data.capture_count = Some(count);
        self.write_file(&data)
    }

    fn write_file(&self, data: &SettingsData) -> Result<(), SettingsError> {
        match &self.path {
            Some(path) => persist(path, data),
            None => Ok(()),
        }
    }
}

fn persist(path: &Path, data: &SettingsData) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = serde_json::to_string_pretty(data)?;
    std::fs::write(path, contents)?;
    Ok(())
}
