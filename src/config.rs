//! Configuration loading
//!
//! Resolution order:
//! 1. Explicit path passed by the caller
//! 2. `PANO_TOUR_CONFIG` environment variable
//! 3. `<config dir>/pano-tour/config.toml`
//! 4. Compiled defaults
//!
//! A missing file is not an error: the compiled defaults are used and a
//! warning is logged. A file that exists but does not parse is an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const CONFIG_ENV_VAR: &str = "PANO_TOUR_CONFIG";

const APP_DIR: &str = "pano-tour";

/// Target size and JPEG quality for an uploaded image
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct CompressionPreset {
    /// Longest edge in pixels
    pub max_dimension: u32,
    /// JPEG quality in (0, 1]
    pub quality: f32,
}

impl CompressionPreset {
    pub const PANORAMA: Self = Self {
        max_dimension: 3840,
        quality: 0.95,
    };

    pub const LOGO: Self = Self {
        max_dimension: 512,
        quality: 0.9,
    };
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ImageSettings {
    pub panorama: CompressionPreset,
    pub logo: CompressionPreset,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            panorama: CompressionPreset::PANORAMA,
            logo: CompressionPreset::LOGO,
        }
    }
}

/// Viewer options shared by every scene
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerSettings {
    pub auto_load: bool,
    /// Degrees per second; negative rotates left
    pub auto_rotate: f64,
    pub compass: bool,
    pub show_zoom_ctrl: bool,
    pub show_fullscreen_ctrl: bool,
    /// Label of the synthetic back link
    pub back_label: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            auto_load: true,
            auto_rotate: -2.0,
            compass: true,
            show_zoom_ctrl: true,
            show_fullscreen_ctrl: true,
            back_label: "Back".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Application configuration
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the blob store and the local store
    pub data_dir: PathBuf,
    pub database_file: String,
    pub local_store_file: String,
    /// Size limit of the local key/value store
    pub local_store_quota_bytes: usize,
    pub admin_password: String,
    pub images: ImageSettings,
    pub viewer: ViewerSettings,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: "pano_tour.db".to_string(),
            local_store_file: "local_store.json".to_string(),
            local_store_quota_bytes: 5 * 1024 * 1024,
            admin_password: "admin123".to_string(),
            images: ImageSettings::default(),
            viewer: ViewerSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration following the resolution order
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .or_else(default_config_path);

        match path {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => {
                warn!("could not determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Path of the SQLite blob store
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Path of the local key/value store
    pub fn local_store_path(&self) -> PathBuf {
        self.data_dir.join(&self.local_store_file)
    }

    /// Single-admin gate
    pub fn verify_admin(&self, password: &str) -> bool {
        !self.admin_password.is_empty() && password == self.admin_password
    }
}

/// `<config dir>/pano-tour/config.toml`
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// `<data dir>/pano-tour`, falling back to the home directory and then
/// the working directory
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./pano_tour_data"))
}
