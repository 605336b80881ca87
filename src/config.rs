//! Application configuration management.
//!
//! Configuration is stored at `~/.config/jadwal/config.json` and carries the
//! origin shell assets are fetched from plus an optional data directory
//! override. `JADWAL_ORIGIN` and `JADWAL_DATA_DIR` take precedence over the
//! file (a `.env` file is loaded at startup).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data/cache directory paths
const APP_NAME: &str = "jadwal";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Schedule blob file name (the single persisted storage key)
const STORE_FILE: &str = "schedules.json";

/// Origin used for shell assets when none is configured
const DEFAULT_ORIGIN: &str = "http://localhost:8080";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub origin: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Origin for shell assets: env var, then config file, then default.
    pub fn origin(&self) -> String {
        std::env::var("JADWAL_ORIGIN")
            .ok()
            .or_else(|| self.origin.clone())
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string())
    }

    /// Path of the persisted schedule blob.
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("JADWAL_DATA_DIR") {
            return Ok(PathBuf::from(dir).join(STORE_FILE));
        }
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.join(STORE_FILE));
        }
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(STORE_FILE))
    }

    /// Root directory holding shell cache generations.
    pub fn cache_root(&self) -> Result<PathBuf> {
        let cache_dir =
            dirs::cache_dir().ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("shell"))
    }
}
