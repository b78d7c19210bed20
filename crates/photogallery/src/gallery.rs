//! The gallery screen.
//!
//! [`Gallery`] owns the in-memory photo list and is the only component that
//! writes it to storage. Every mutation goes through [`Gallery::apply`],
//! which changes the list and then persists the whole of it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info};

use crate::capture::{CaptureListener, CaptureOutcome, CaptureWorkflow};
use crate::detail::{DetailEvent, DetailRoute, DetailView};
use crate::error::Result;
use crate::record::{Coordinates, PhotoRecord};
use crate::storage::PhotoStore;

/// Number of thumbnails per grid row.
pub const GRID_COLUMNS: usize = 2;

/// Light or dark appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background.
    #[default]
    Light,
    /// Dark background.
    Dark,
}

impl Theme {
    /// Dark when `dark` is set.
    #[must_use]
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    /// The other theme.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Colours for this theme.
    #[must_use]
    pub fn palette(self) -> Palette {
        match self {
            Self::Light => Palette {
                background: "#fff",
                icon: "black",
                search_background: "#f0f0f0",
                search_text: "#000",
                placeholder: "#000",
                theme_icon: "moon",
                theme_icon_color: "black",
            },
            Self::Dark => Palette {
                background: "#222222",
                icon: "white",
                search_background: "#1A1A40",
                search_text: "#fff",
                placeholder: "#ccc",
                theme_icon: "sunny",
                theme_icon_color: "yellow",
            },
        }
    }
}

/// Colours and icons of the gallery screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Screen background.
    pub background: &'static str,
    /// Camera button colour.
    pub icon: &'static str,
    /// Search box background.
    pub search_background: &'static str,
    /// Search box text.
    pub search_text: &'static str,
    /// Search box placeholder.
    pub placeholder: &'static str,
    /// Icon of the theme toggle.
    pub theme_icon: &'static str,
    /// Colour of the theme toggle.
    pub theme_icon_color: &'static str,
}

/// A change to the photo list.
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryChange {
    /// A new photo, goes to the front.
    Captured(PhotoRecord),
    /// Remove the photo with this URI.
    Deleted(String),
}

/// Records whose timestamp contains `text`, ignoring case, in list order.
#[must_use]
pub fn filter_records<'a>(records: &'a [PhotoRecord], text: &str) -> Vec<&'a PhotoRecord> {
    let needle = text.to_lowercase();
    records.iter().filter(|r| r.date_contains(&needle)).collect()
}

/// State of the gallery screen.
#[derive(Debug)]
pub struct Gallery {
    store: PhotoStore,
    photos: Vec<PhotoRecord>,
    search: String,
    theme: Theme,
    camera_open: bool,
    mounted: bool,
    events_tx: UnboundedSender<DetailEvent>,
    events_rx: UnboundedReceiver<DetailEvent>,
}

impl Gallery {
    /// Create an empty gallery backed by `store`. Call [`mount`](Self::mount)
    /// to load the saved photos.
    #[must_use]
    pub fn new(store: PhotoStore, theme: Theme) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store,
            photos: Vec::new(),
            search: String::new(),
            theme,
            camera_open: false,
            mounted: false,
            events_tx,
            events_rx,
        }
    }

    /// Load the saved photos. Only the first call reads storage.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.photos = self.store.load();
        self.mounted = true;
        info!("Gallery mounted with {} photos", self.photos.len());
    }

    /// All photos, most recent first.
    #[must_use]
    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    /// Find a photo by URI.
    #[must_use]
    pub fn find(&self, uri: &str) -> Option<&PhotoRecord> {
        self.photos.iter().find(|p| p.uri() == uri)
    }

    /// Current search text.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Replace the search text.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    /// Photos matching the search text.
    #[must_use]
    pub fn visible(&self) -> Vec<&PhotoRecord> {
        filter_records(&self.photos, &self.search)
    }

    /// Visible photos laid out in rows of [`GRID_COLUMNS`].
    #[must_use]
    pub fn grid(&self) -> Vec<Vec<&PhotoRecord>> {
        self.visible()
            .chunks(GRID_COLUMNS)
            .map(<[&PhotoRecord]>::to_vec)
            .collect()
    }

    /// Current theme.
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Switch between light and dark.
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    /// Colours for the current theme.
    #[must_use]
    pub fn palette(&self) -> Palette {
        self.theme.palette()
    }

    /// Whether the capture UI is showing.
    #[must_use]
    pub fn is_camera_open(&self) -> bool {
        self.camera_open
    }

    /// Show the capture UI.
    pub fn open_camera(&mut self) {
        self.camera_open = true;
    }

    /// Apply a change to the list, then persist the whole list.
    ///
    /// A failed save is logged; the in-memory list keeps the change.
    pub fn apply(&mut self, change: GalleryChange) {
        match change {
            GalleryChange::Captured(record) => {
                self.photos.retain(|p| p.uri() != record.uri());
                self.photos.insert(0, record);
            }
            GalleryChange::Deleted(uri) => {
                let before = self.photos.len();
                self.photos.retain(|p| p.uri() != uri);
                if self.photos.len() == before {
                    debug!("No photo with uri {} to delete", uri);
                    return;
                }
                info!("Deleted {}", uri);
            }
        }
        self.persist();
    }

    /// Record a freshly captured photo, stamped with the current time.
    pub fn add_captured(&mut self, uri: &str, coordinates: Option<Coordinates>) {
        self.apply(GalleryChange::Captured(PhotoRecord::captured_now(
            uri,
            coordinates,
        )));
    }

    /// Remove a photo by URI.
    pub fn delete(&mut self, uri: &str) {
        self.apply(GalleryChange::Deleted(uri.to_string()));
    }

    /// Open the capture UI and run one capture with this gallery as listener.
    ///
    /// # Errors
    ///
    /// Returns an error if another capture is already running on `workflow`.
    pub async fn capture(&mut self, workflow: &CaptureWorkflow) -> Result<CaptureOutcome> {
        self.open_camera();
        let result = workflow.run(self).await;
        if result.is_err() {
            self.camera_open = false;
        }
        result
    }

    /// Navigate to the detail screen of `uri`.
    #[must_use]
    pub fn open_detail(&self, uri: &str) -> Option<DetailView> {
        self.find(uri)
            .map(|record| DetailView::new(DetailRoute::from(record), Some(self.events_tx.clone())))
    }

    /// Apply every event detail screens have sent back. Returns how many
    /// were processed.
    pub fn process_detail_events(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                DetailEvent::Deleted { uri } => self.apply(GalleryChange::Deleted(uri)),
            }
            processed += 1;
        }
        processed
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.photos) {
            error!("Failed to save photos: {}", e);
        }
    }
}

impl CaptureListener for Gallery {
    fn on_captured(&mut self, uri: &str, coordinates: Option<Coordinates>) {
        self.add_captured(uri, coordinates);
    }

    fn on_finished(&mut self) {
        self.camera_open = false;
    }
}
