//! Configuration management for photogallery.
//!
//! Configuration is loaded with figment from defaults, an optional TOML file
//! and `PHOTOGALLERY_` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::capture::CaptureSettings;
use crate::error::{Error, Result};
use crate::gallery::Theme;
use crate::providers::{CameraOptions, CameraType, LocationOptions, MediaType, Platform};
use crate::storage::photos::DEFAULT_PHOTOS_KEY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "photogallery";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "photos.db";

/// Default directory for imported captures, under the data directory.
const LIBRARY_DIR_NAME: &str = "library";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PHOTOGALLERY_`, sections
///    separated by `__`, e.g. `PHOTOGALLERY_LOCATION__TIMEOUT_MS`)
/// 2. TOML config file at `~/.config/photogallery/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Capture configuration.
    pub capture: CaptureConfig,
    /// Geolocation configuration.
    pub location: LocationConfig,
    /// Appearance configuration.
    pub appearance: AppearanceConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/photogallery/photos.db`
    pub database_path: Option<PathBuf>,
    /// Key the photo list is stored under.
    pub photos_key: String,
    /// Where captures are copied when `save_to_photos` is on.
    /// Defaults to `~/.local/share/photogallery/library`
    pub library_dir: Option<PathBuf>,
}

/// Capture-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Platform semantics to use. Detected when unset.
    pub platform: Option<Platform>,
    /// Camera to open.
    pub camera_type: CameraType,
    /// Also keep a copy of each capture in the photo library.
    pub save_to_photos: bool,
}

/// Geolocation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Geotag captures.
    pub enabled: bool,
    /// Prefer GPS over network positioning.
    pub high_accuracy: bool,
    /// How long to wait for a position fix, in milliseconds.
    pub timeout_ms: u64,
    /// Oldest cached position to accept, in milliseconds.
    pub maximum_age_ms: u64,
}

/// Appearance configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Start in dark mode. Light when unset.
    pub dark_mode: Option<bool>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            photos_key: DEFAULT_PHOTOS_KEY.to_string(),
            library_dir: None,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            platform: None,
            camera_type: CameraType::Back,
            save_to_photos: true,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 1_000,
        }
    }
}

impl Config {
    /// Load configuration from defaults, the config file (the default path
    /// unless `config_path` is given) and the environment. A missing file is
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("PHOTOGALLERY_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration the way [`load_from`](Self::load_from) does, but
    /// insist that `path` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, or if loading, parsing or
    /// validation fails.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigValidation {
                message: format!("configuration file not found: {}", path.display()),
            });
        }
        Self::load_from(Some(path.to_path_buf()))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.photos_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "photos_key must not be empty".to_string(),
            });
        }

        if self.location.timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "timeout_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the library directory, resolving defaults if not set.
    #[must_use]
    pub fn library_dir(&self) -> PathBuf {
        self.storage
            .library_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(LIBRARY_DIR_NAME))
    }

    /// The platform to run as.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.capture.platform.unwrap_or_else(Platform::current)
    }

    /// Get the location timeout as a Duration.
    #[must_use]
    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location.timeout_ms)
    }

    /// Initial theme of the gallery.
    #[must_use]
    pub fn theme(&self) -> Theme {
        Theme::from_dark_mode(self.appearance.dark_mode.unwrap_or(false))
    }

    /// Build the capture workflow settings.
    #[must_use]
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            platform: self.platform(),
            location_enabled: self.location.enabled,
            location: LocationOptions {
                enable_high_accuracy: self.location.high_accuracy,
                timeout: self.location_timeout(),
                maximum_age: Duration::from_millis(self.location.maximum_age_ms),
            },
            camera: CameraOptions {
                media_type: MediaType::Photo,
                save_to_photos: self.capture.save_to_photos,
                camera_type: self.capture.camera_type,
            },
        }
    }
}
