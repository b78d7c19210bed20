//! Core photo record types for photogallery.
//!
//! This module defines the metadata kept for every captured photo and the
//! JSON shape it is persisted in.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format used for the capture timestamp (`DD/MM/YYYY HH:MM:SS`).
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Create a new coordinate pair.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Six decimal places, latitude first.
impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Metadata for one captured photo.
///
/// Records are created once, when the camera hands back an asset, and are
/// never modified afterwards. The serialized form is
/// `{"uri": .., "date": .., "coords": {"latitude": .., "longitude": ..}}`
/// with `coords` omitted when no position was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    uri: String,

    #[serde(rename = "date")]
    captured_at: String,

    #[serde(
        rename = "coords",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    coordinates: Option<Coordinates>,
}

impl PhotoRecord {
    /// Create a record captured at the given local time.
    #[must_use]
    pub fn new(
        uri: impl Into<String>,
        captured_at: NaiveDateTime,
        coordinates: Option<Coordinates>,
    ) -> Self {
        Self {
            uri: uri.into(),
            captured_at: format_timestamp(&captured_at),
            coordinates,
        }
    }

    /// Create a record stamped with the current local time.
    #[must_use]
    pub fn captured_now(uri: impl Into<String>, coordinates: Option<Coordinates>) -> Self {
        Self::new(uri, Local::now().naive_local(), coordinates)
    }

    /// Opaque handle to the image, unique within the gallery.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Capture timestamp as `DD/MM/YYYY HH:MM:SS`.
    #[must_use]
    pub fn captured_at(&self) -> &str {
        &self.captured_at
    }

    /// Where the photo was taken, if known.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Case-insensitive substring match against the timestamp.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn date_contains(&self, needle: &str) -> bool {
        self.captured_at.to_lowercase().contains(needle)
    }
}

/// Format a local timestamp the way records store it.
#[must_use]
pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
