//! Persistence of the photo list.
//!
//! The whole gallery lives under a single key as a JSON array of records.
//! Every save rewrites the full array; there are no partial updates.

use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::Result;
use crate::record::PhotoRecord;

/// Default key the photo list is stored under.
pub const DEFAULT_PHOTOS_KEY: &str = "@photos";

/// Loads and saves the photo list.
pub struct PhotoStore {
    kv: Box<dyn KeyValueStore>,
    key: String,
}

impl std::fmt::Debug for PhotoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl PhotoStore {
    /// Store the photo list under [`DEFAULT_PHOTOS_KEY`].
    #[must_use]
    pub fn new(kv: impl KeyValueStore + 'static) -> Self {
        Self::with_key(kv, DEFAULT_PHOTOS_KEY)
    }

    /// Store the photo list under a custom key.
    #[must_use]
    pub fn with_key(kv: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        Self {
            kv: Box::new(kv),
            key: key.into(),
        }
    }

    /// The key the list is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored photo list.
    ///
    /// Never fails: a missing key, an unreadable store or a corrupt value
    /// all yield an empty list. The last two are logged, and a corrupt value
    /// is removed from the store.
    #[must_use]
    pub fn load(&self) -> Vec<PhotoRecord> {
        let json = match self.kv.get_item(&self.key) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to load photos: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<PhotoRecord>>(&json) {
            Ok(records) => {
                debug!("Loaded {} photos from '{}'", records.len(), self.key);
                records
            }
            Err(e) => {
                warn!("Discarding undecodable photo list under '{}': {}", self.key, e);
                if let Err(e) = self.kv.remove_item(&self.key) {
                    warn!("Failed to remove photo list: {}", e);
                }
                Vec::new()
            }
        }
    }

    /// Overwrite the stored list with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying write fails.
    /// Nothing is retried.
    pub fn save(&self, records: &[PhotoRecord]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.kv.set_item(&self.key, &json)?;
        debug!("Saved {} photos to '{}'", records.len(), self.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::record::Coordinates;
    use crate::storage::{MemoryStore, SqliteStore};
    use chrono::NaiveDate;

    fn record(uri: &str, day: u32, coords: Option<Coordinates>) -> PhotoRecord {
        let at = NaiveDate::from_ymd_opt(2025, 9, day)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        PhotoRecord::new(uri, at, coords)
    }

    #[test]
    fn test_load_empty_store() {
        let store = PhotoStore::new(MemoryStore::new());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let store = PhotoStore::new(SqliteStore::open_in_memory().unwrap());
        let records = vec![
            record("c", 3, Some(Coordinates::new(-23.55, -46.63))),
            record("b", 2, None),
            record("a", 1, Some(Coordinates::new(10.0, 20.0))),
        ];

        store.save(&records).unwrap();

        assert_eq!(store.load(), records);
    }

    #[test]
    fn test_save_overwrites_full_list() {
        let store = PhotoStore::new(MemoryStore::new());
        store.save(&[record("a", 1, None), record("b", 2, None)]).unwrap();
        store.save(&[record("b", 2, None)]).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].uri(), "b");
    }

    #[test]
    fn test_persisted_json_shape() {
        let kv = MemoryStore::new();
        let store = PhotoStore::new(kv.clone());
        store
            .save(&[record("photo-uri", 16, Some(Coordinates::new(10.0, 20.0)))])
            .unwrap();

        let raw = kv.get_item(DEFAULT_PHOTOS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "uri": "photo-uri",
                "date": "16/09/2025 12:30:00",
                "coords": {"latitude": 10.0, "longitude": 20.0}
            }])
        );
    }

    #[test]
    fn test_load_fails_soft_on_corrupt_json() {
        init_test_logging();
        let kv = MemoryStore::new();
        kv.set_item(DEFAULT_PHOTOS_KEY, "{not json").unwrap();

        let store = PhotoStore::new(kv.clone());
        assert!(store.load().is_empty());
        assert!(kv.get_item(DEFAULT_PHOTOS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_json_survives_when_removal_fails() {
        init_test_logging();
        let kv = MemoryStore::new();
        kv.set_item(DEFAULT_PHOTOS_KEY, "[{").unwrap();
        kv.set_fail_writes(true);

        let store = PhotoStore::new(kv.clone());
        assert!(store.load().is_empty());
        assert_eq!(kv.get_item(DEFAULT_PHOTOS_KEY).unwrap().as_deref(), Some("[{"));
    }

    #[test]
    fn test_gps_coordinates_survive_roundtrip() {
        let store = PhotoStore::new(SqliteStore::open_in_memory().unwrap());
        let records = vec![
            record(
                "a",
                1,
                Some(Coordinates::new(1.238_380_268_003_237, 117.666_635_372_370_21)),
            ),
            record(
                "b",
                2,
                Some(Coordinates::new(0.1 + 0.2, 115.497_025_911_504_55)),
            ),
            record("c", 3, Some(Coordinates::new(-(1.0_f64 / 3.0), 2.0_f64.sqrt()))),
        ];

        store.save(&records).unwrap();

        assert_eq!(store.load(), records);
    }

    #[test]
    fn test_load_fails_soft_on_read_error() {
        init_test_logging();
        let kv = MemoryStore::new();
        let store = PhotoStore::new(kv.clone());
        store.save(&[record("a", 1, None)]).unwrap();

        kv.set_fail_reads(true);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_reports_write_error() {
        let kv = MemoryStore::new();
        kv.set_fail_writes(true);

        let store = PhotoStore::new(kv);
        assert!(store.save(&[record("a", 1, None)]).is_err());
    }

    #[test]
    fn test_custom_key() {
        let kv = MemoryStore::new();
        let store = PhotoStore::with_key(kv.clone(), "@other");
        store.save(&[]).unwrap();

        assert_eq!(store.key(), "@other");
        assert!(kv.get_item("@other").unwrap().is_some());
        assert!(kv.get_item(DEFAULT_PHOTOS_KEY).unwrap().is_none());
    }
}
