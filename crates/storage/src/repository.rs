//! Drive repository

use crate::{Drive, DriveId, StorageError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Sink for finalized drives, keyed by drive id. The session controller
/// only ever consumes this interface; the backing store is injected.
pub trait DriveRepository: Send + Sync + 'static {
    /// Persist a finalized drive.
    fn add(&self, drive: Drive);

    /// Remove a drive by id.
    fn remove(&self, id: &DriveId) -> Option<Drive>;
}

impl<T: DriveRepository> DriveRepository for std::sync::Arc<T> {
    fn add(&self, drive: Drive) {
        self.as_ref().add(drive);
    }

    fn remove(&self, id: &DriveId) -> Option<Drive> {
        self.as_ref().remove(id)
    }
}

/// In-memory drive store with optional JSON drive-history snapshots.
pub struct DriveStore {
    drives: Mutex<HashMap<DriveId, Drive>>,
}

impl DriveStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            drives: Mutex::new(HashMap::new()),
        }
    }

    /// Insert or replace a drive.
    pub fn insert(&self, drive: Drive) -> Result<(), StorageError> {
        let mut drives = self
            .drives
            .lock()
            .map_err(|e| StorageError::Store(format!("lock error: {e}")))?;
        debug!(id = %drive.id, violations = drive.violations.len(), "storing drive");
        drives.insert(drive.id, drive);
        Ok(())
    }

    /// Delete a drive by id.
    pub fn delete(&self, id: &DriveId) -> Result<Drive, StorageError> {
        let mut drives = self
            .drives
            .lock()
            .map_err(|e| StorageError::Store(format!("lock error: {e}")))?;
        drives.remove(id).ok_or(StorageError::NotFound)
    }

    /// Fetch a drive by id.
    pub fn get(&self, id: &DriveId) -> Result<Drive, StorageError> {
        let drives = self
            .drives
            .lock()
            .map_err(|e| StorageError::Store(format!("lock error: {e}")))?;
        drives.get(id).cloned().ok_or(StorageError::NotFound)
    }

    /// All stored drives, most recent first.
    pub fn list(&self) -> Result<Vec<Drive>, StorageError> {
        let drives = self
            .drives
            .lock()
            .map_err(|e| StorageError::Store(format!("lock error: {e}")))?;
        let mut all: Vec<Drive> = drives.values().cloned().collect();
        all.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(all)
    }

    /// Number of stored drives.
    pub fn len(&self) -> usize {
        self.drives.lock().map(|d| d.len()).unwrap_or(0)
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the drive history as JSON.
    pub fn save_to(&self, path: &Path) -> Result<(), StorageError> {
        let drives = self
            .drives
            .lock()
            .map_err(|e| StorageError::Store(format!("lock error: {e}")))?;
        let all: Vec<&Drive> = drives.values().collect();
        let encoded = serde_json::to_string_pretty(&all)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        std::fs::write(path, encoded)?;
        info!(count = all.len(), path = %path.display(), "drive history saved");
        Ok(())
    }

    /// Load drive history from a JSON file, replacing current contents.
    pub fn load_from(&self, path: &Path) -> Result<usize, StorageError> {
        let encoded = std::fs::read_to_string(path)?;
        let loaded: Vec<Drive> =
            serde_json::from_str(&encoded).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut drives = self
            .drives
            .lock()
            .map_err(|e| StorageError::Store(format!("lock error: {e}")))?;
        drives.clear();
        let count = loaded.len();
        for drive in loaded {
            drives.insert(drive.id, drive);
        }
        info!(count, path = %path.display(), "drive history loaded");
        Ok(count)
    }
}

impl Default for DriveStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveRepository for DriveStore {
    fn add(&self, drive: Drive) {
        let id = drive.id;
        if let Err(e) = self.insert(drive) {
            warn!(%id, error = %e, "failed to store drive");
        }
    }

    fn remove(&self, id: &DriveId) -> Option<Drive> {
        self.delete(id).ok()
    }
}
