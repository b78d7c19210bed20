//! Platform provider abstraction.
//!
//! The capture workflow talks to the camera, geolocation, permission and
//! notification services of the host platform only through the traits in
//! this module. The wire types mirror what those services accept and return.

pub mod desktop;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::Coordinates;

/// The platform the gallery runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Android: camera and location need runtime permission grants.
    Android,
    /// iOS: permissions are handled by the system when the service is used.
    Ios,
    /// Desktop shells, no separate permission model.
    Desktop,
}

impl Platform {
    /// Detect the platform this binary was built for.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(target_os = "ios") {
            Self::Ios
        } else {
            Self::Desktop
        }
    }

    /// Whether camera and location must be requested before use.
    #[must_use]
    pub fn has_runtime_permissions(self) -> bool {
        matches!(self, Self::Android)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Android => write!(f, "android"),
            Self::Ios => write!(f, "ios"),
            Self::Desktop => write!(f, "desktop"),
        }
    }
}

/// A runtime permission the workflow may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Use of the camera.
    Camera,
    /// Precise (GPS) location.
    FineLocation,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera => write!(f, "camera"),
            Self::FineLocation => write!(f, "fine_location"),
        }
    }
}

/// Answer to a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionResult {
    /// The user granted the permission.
    Granted,
    /// The user denied the permission this time.
    Denied,
    /// The user denied the permission and asked not to be prompted again.
    NeverAskAgain,
}

impl PermissionResult {
    /// Only an explicit grant counts.
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Kind of media the camera should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still photo.
    #[default]
    Photo,
}

/// Which camera to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraType {
    /// Rear camera.
    #[default]
    Back,
    /// Front (selfie) camera.
    Front,
}

/// Options passed to the camera provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraOptions {
    /// Media to capture.
    pub media_type: MediaType,
    /// Also store the picture in the device photo library.
    pub save_to_photos: bool,
    /// Camera to open.
    pub camera_type: CameraType,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            media_type: MediaType::Photo,
            save_to_photos: true,
            camera_type: CameraType::Back,
        }
    }
}

/// One image handed back by the camera.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Handle to the image, owned by the platform media layer.
    #[serde(default)]
    pub uri: Option<String>,
    /// File name, if the platform reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Asset {
    /// Asset with only a URI.
    #[must_use]
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }
}

/// The three ways a camera session can end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraResponse {
    /// The user backed out without taking a picture.
    Cancelled,
    /// The camera could not be used.
    Error {
        /// Provider error code.
        code: String,
        /// Provider message, if any.
        message: Option<String>,
    },
    /// A picture was taken.
    Assets(Vec<Asset>),
}

/// Raw image-picker response as the platform bridge reports it.
///
/// `{"didCancel": true}`, `{"errorCode": .., "errorMessage": ..}` or
/// `{"assets": [{"uri": ..}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PickerResponse {
    /// Set when the user cancelled.
    pub did_cancel: bool,
    /// Set when the camera failed.
    pub error_code: Option<String>,
    /// Human readable failure message.
    pub error_message: Option<String>,
    /// Captured assets.
    pub assets: Option<Vec<Asset>>,
}

impl From<PickerResponse> for CameraResponse {
    fn from(raw: PickerResponse) -> Self {
        if raw.did_cancel {
            Self::Cancelled
        } else if let Some(code) = raw.error_code.filter(|c| !c.is_empty()) {
            Self::Error {
                code,
                message: raw.error_message,
            }
        } else {
            Self::Assets(raw.assets.unwrap_or_default())
        }
    }
}

/// Options passed to the geolocation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationOptions {
    /// Prefer GPS over network positioning.
    pub enable_high_accuracy: bool,
    /// How long the provider may take.
    #[serde(with = "millis")]
    pub timeout: Duration,
    /// Oldest cached position that is still acceptable.
    #[serde(with = "millis")]
    pub maximum_age: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            maximum_age: Duration::from_millis(1_000),
        }
    }
}

/// A position fix from the geolocation provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Where the device is.
    pub coords: Coordinates,
}

/// Grants or denies runtime permissions.
#[async_trait::async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Ask the user for `permission`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform could not process the request.
    async fn request(&self, permission: Permission) -> Result<PermissionResult>;
}

/// Resolves the current device position.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    /// Get the current position.
    ///
    /// # Errors
    ///
    /// Returns an error if no position could be determined.
    async fn current_position(&self, options: &LocationOptions) -> Result<Position>;
}

/// Opens the camera and reports how the session ended.
#[async_trait::async_trait]
pub trait CameraProvider: Send + Sync {
    /// Launch the camera with `options`.
    async fn launch(&self, options: &CameraOptions) -> CameraResponse;
}

/// Shows a user-visible alert.
pub trait Notifier: Send + Sync {
    /// Display `message` under `title`.
    fn alert(&self, title: &str, message: &str);
}

/// The set of platform services a capture needs.
#[derive(Clone)]
pub struct Providers {
    /// Runtime permissions.
    pub permissions: Arc<dyn PermissionProvider>,
    /// Geolocation.
    pub location: Arc<dyn LocationProvider>,
    /// Camera.
    pub camera: Arc<dyn CameraProvider>,
    /// User-visible alerts.
    pub notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
