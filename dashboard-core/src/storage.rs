//! Persisted saved-location list.
//!
//! The list lives as one JSON value under [`SAVED_LOCATIONS_KEY`] in a
//! [`KeyValueStore`]. It is read once when the orchestrator starts and
//! rewritten in full after every mutation, including when it becomes empty.

use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{error::StorageError, model::Location};

pub const SAVED_LOCATIONS_KEY: &str = "savedLocations";

/// Durable string key-value storage.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError {
    let path = path.display().to_string();
    move |source| StorageError::Io { path, source }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path)(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        // Write-then-rename so a crash mid-write never leaves a truncated list.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_error(&path))?;
        Ok(())
    }
}

/// In-process store, for embedding hosts without durable storage and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.entries_mut().insert(key.to_string(), value.to_string());
        store
    }

    fn entries_mut(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries_mut().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Ordered favourites, unique by coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedLocationSet {
    locations: Vec<Location>,
}

impl SavedLocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the persisted list. Missing, unreadable or corrupt data yields an
    /// empty set; the failure is logged, never returned.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let raw = match store.get(SAVED_LOCATIONS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read saved locations, starting empty");
                return Self::new();
            }
        };

        match serde_json::from_str::<Vec<Location>>(&raw) {
            Ok(locations) => {
                let mut set = Self::new();
                for location in locations {
                    set.add(location);
                }
                tracing::debug!(count = set.len(), "loaded saved locations");
                set
            }
            Err(err) => {
                tracing::warn!(error = %err, "saved locations are corrupt, starting empty");
                Self::new()
            }
        }
    }

    /// Rewrite the whole list under [`SAVED_LOCATIONS_KEY`].
    pub fn persist(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.locations)?;
        store.set(SAVED_LOCATIONS_KEY, &json)
    }

    /// Append unless a location with the same coordinates is already saved.
    /// Returns whether the set changed.
    pub fn add(&mut self, location: Location) -> bool {
        if self.contains(&location) {
            return false;
        }
        self.locations.push(location);
        true
    }

    /// Remove the entry at `index`; out of range is a no-op returning `None`.
    pub fn remove(&mut self, index: usize) -> Option<Location> {
        if index < self.locations.len() { Some(self.locations.remove(index)) } else { None }
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.locations.iter().any(|saved| saved.same_place(location))
    }

    pub fn get(&self, index: usize) -> Option<&Location> {
        self.locations.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn as_slice(&self) -> &[Location] {
        &self.locations
    }
}

impl<'a> IntoIterator for &'a SavedLocationSet {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
