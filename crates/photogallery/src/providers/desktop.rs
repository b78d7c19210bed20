//! Desktop implementations of the platform providers.
//!
//! A desktop has no camera preview to drive, so "taking a picture" means
//! importing an existing image file. Permissions are implicit and the
//! position comes from the command line or configuration.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use super::{
    Asset, CameraOptions, CameraProvider, CameraResponse, LocationOptions, LocationProvider,
    Notifier, Permission, PermissionProvider, PermissionResult, Position,
};
use crate::error::{Error, Result};
use crate::record::Coordinates;

/// Error code reported when the source image cannot be read.
pub const SOURCE_UNAVAILABLE: &str = "source_unavailable";

/// Grants every permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantAll;

#[async_trait::async_trait]
impl PermissionProvider for GrantAll {
    async fn request(&self, permission: Permission) -> Result<PermissionResult> {
        debug!("Granting {} permission", permission);
        Ok(PermissionResult::Granted)
    }
}

/// Reports a fixed position, or no position at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation {
    coords: Option<Coordinates>,
}

impl FixedLocation {
    /// Create a location source that always answers with `coords`.
    #[must_use]
    pub fn new(coords: Option<Coordinates>) -> Self {
        Self { coords }
    }
}

#[async_trait::async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self, _options: &LocationOptions) -> Result<Position> {
        self.coords
            .map(|coords| Position { coords })
            .ok_or_else(|| Error::location("no position configured"))
    }
}

/// A camera that "captures" by importing an image file.
///
/// With no source file the session counts as cancelled. When the options ask
/// to save to the photo library and a library directory is configured, the
/// file is copied there and the copy becomes the asset.
#[derive(Debug, Clone, Default)]
pub struct FileCamera {
    source: Option<PathBuf>,
    library_dir: Option<PathBuf>,
}

impl FileCamera {
    /// Create a camera that imports `source`.
    #[must_use]
    pub fn new(source: Option<PathBuf>, library_dir: Option<PathBuf>) -> Self {
        Self {
            source,
            library_dir,
        }
    }

    async fn import(&self, source: &Path, options: &CameraOptions) -> Result<Asset> {
        let source = tokio::fs::canonicalize(source).await?;
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        let stored = match (&self.library_dir, options.save_to_photos) {
            (Some(dir), true) => {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|source| Error::DirectoryCreate {
                        path: dir.clone(),
                        source,
                    })?;
                let name = format!(
                    "{}_{}",
                    Local::now().format("%Y%m%d_%H%M%S%3f"),
                    file_name.as_deref().unwrap_or("photo")
                );
                let target = dir.join(name);
                tokio::fs::copy(&source, &target).await?;
                info!("Saved photo to library at {}", target.display());
                target
            }
            _ => source,
        };

        Ok(Asset {
            uri: Some(file_uri(&stored)),
            file_name,
            width: None,
            height: None,
        })
    }
}

#[async_trait::async_trait]
impl CameraProvider for FileCamera {
    async fn launch(&self, options: &CameraOptions) -> CameraResponse {
        let Some(source) = &self.source else {
            return CameraResponse::Cancelled;
        };

        debug!(
            "Importing {} ({:?} camera)",
            source.display(),
            options.camera_type
        );
        match self.import(source, options).await {
            Ok(asset) => CameraResponse::Assets(vec![asset]),
            Err(e) => CameraResponse::Error {
                code: SOURCE_UNAVAILABLE.to_string(),
                message: Some(format!("{}: {e}", source.display())),
            },
        }
    }
}

/// Writes alerts to the log and to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, title: &str, message: &str) {
        warn!(title = %title, "{}", message);
        eprintln!("{title}: {message}");
    }
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}
