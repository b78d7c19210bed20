//! `photogallery` - capture, geotag, store and browse photos
//!
//! The core of a small photo gallery app: a capture workflow that asks for
//! permissions, tags the photo with the current position and opens the
//! camera; a persisted photo list; a searchable gallery; and a detail screen
//! that can delete a photo. Platform services sit behind the traits in
//! [`providers`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod capture;
pub mod cli;
pub mod config;
pub mod detail;
pub mod error;
pub mod gallery;
pub mod logging;
pub mod providers;
pub mod record;
pub mod storage;

pub use capture::{CaptureListener, CaptureOutcome, CaptureSettings, CaptureWorkflow};
pub use config::Config;
pub use detail::{DetailEvent, DetailRoute, DetailView, Navigation};
pub use error::{Error, Result};
pub use gallery::{filter_records, Gallery, GalleryChange, Theme};
pub use logging::init_logging;
pub use providers::{Platform, Providers};
pub use record::{Coordinates, PhotoRecord};
pub use storage::{KeyValueStore, MemoryStore, PhotoStore, SqliteStore};
