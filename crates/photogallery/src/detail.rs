//! The detail screen.
//!
//! A [`DetailView`] shows one photo and its metadata. It never touches the
//! gallery's list: deleting sends a [`DetailEvent`] back across the
//! navigation boundary and the gallery applies it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::record::{Coordinates, PhotoRecord};

/// Parameters passed from the gallery to the detail screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRoute {
    /// Image handle.
    pub uri: String,
    /// Capture timestamp.
    pub date: String,
    /// Where the photo was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coordinates>,
}

impl From<&PhotoRecord> for DetailRoute {
    fn from(record: &PhotoRecord) -> Self {
        Self {
            uri: record.uri().to_string(),
            date: record.captured_at().to_string(),
            coords: record.coordinates(),
        }
    }
}

/// Messages sent from a detail screen back to the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailEvent {
    /// The user confirmed deleting this photo.
    Deleted {
        /// URI of the deleted photo.
        uri: String,
    },
}

/// Where the UI should go after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Remain on the current screen.
    Stay,
    /// Return to the gallery.
    Back,
}

/// Confirmation asked before deleting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePrompt {
    /// Dialog title.
    pub title: &'static str,
    /// Dialog body.
    pub message: &'static str,
    /// Label of the button that keeps the photo.
    pub cancel_label: &'static str,
    /// Label of the destructive button.
    pub confirm_label: &'static str,
}

/// The confirmation shown by every detail screen.
pub const DELETE_PROMPT: DeletePrompt = DeletePrompt {
    title: "Delete photo",
    message: "Are you sure you want to delete this photo?",
    cancel_label: "Cancel",
    confirm_label: "Delete",
};

/// One photo, full screen.
#[derive(Debug)]
pub struct DetailView {
    route: DetailRoute,
    events: Option<UnboundedSender<DetailEvent>>,
}

impl DetailView {
    /// Open a detail screen.
    ///
    /// Without an event sender the delete action still navigates back but
    /// nobody is told about it.
    #[must_use]
    pub fn new(route: DetailRoute, events: Option<UnboundedSender<DetailEvent>>) -> Self {
        Self { route, events }
    }

    /// The route this screen was opened with.
    #[must_use]
    pub fn route(&self) -> &DetailRoute {
        &self.route
    }

    /// Image to display.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.route.uri
    }

    /// `Date/time: <timestamp>`
    #[must_use]
    pub fn date_label(&self) -> String {
        format!("Date/time: {}", self.route.date)
    }

    /// `Coordinates: <lat>, <lon>` with six decimals, if known.
    #[must_use]
    pub fn coordinates_label(&self) -> Option<String> {
        self.route.coords.map(|c| format!("Coordinates: {c}"))
    }

    /// The information panel, line by line.
    #[must_use]
    pub fn info_lines(&self) -> Vec<String> {
        let mut lines = vec!["Information:".to_string(), self.date_label()];
        lines.extend(self.coordinates_label());
        lines
    }

    /// Start the delete action; the UI must confirm or cancel.
    #[must_use]
    pub fn request_delete(&self) -> DeletePrompt {
        DELETE_PROMPT
    }

    /// The user kept the photo.
    #[must_use]
    pub fn cancel_delete(&self) -> Navigation {
        Navigation::Stay
    }

    /// The user confirmed: notify the gallery and go back.
    #[must_use]
    pub fn confirm_delete(self) -> Navigation {
        if let Some(events) = &self.events {
            let event = DetailEvent::Deleted {
                uri: self.route.uri.clone(),
            };
            if events.send(event).is_err() {
                debug!("Gallery closed before delete of {} was delivered", self.route.uri);
            }
        }
        Navigation::Back
    }
}
