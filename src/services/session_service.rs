//! Anonymous session identity and the durable client storage it lives in.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use thiserror::Error;

pub const SESSION_KEY: &str = "itinera_guest_session_id";
pub const GUEST_SESSION_PREFIX: &str = "guest_";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage read failed: {0}")]
    Read(String),

    #[error("Storage write failed: {0}")]
    Write(String),
}

/// Key-value storage that survives restarts of the client.
pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self
            .values
            .lock()
            .map_err(|e| StorageError::Read(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        values.remove(key);
        Ok(())
    }
}

/// JSON object on disk, one entry per key.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::Read(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StorageError::Read(e.to_string())),
        }
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(values).map_err(|e| StorageError::Write(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| StorageError::Write(e.to_string()))
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|e| StorageError::Read(e.to_string()))?;
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|e| StorageError::Write(e.to_string()))?;
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|e| StorageError::Write(e.to_string()))?;
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

pub fn generate_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("{}{}_{}", GUEST_SESSION_PREFIX, Utc::now().timestamp_millis(), suffix)
}

/// Hands out the stable anonymous id for this storage scope.
pub struct SessionIdentityProvider {
    storage: std::sync::Arc<dyn DurableStorage>,
}

impl SessionIdentityProvider {
    pub fn new(storage: std::sync::Arc<dyn DurableStorage>) -> Self {
        Self { storage }
    }

    /// Never fails: unreadable storage yields a fresh session instead.
    pub fn get_or_create_session_id(&self) -> String {
        match self.storage.get(SESSION_KEY) {
            Ok(Some(existing)) if !existing.trim().is_empty() => return existing,
            Ok(_) => {}
            Err(e) => log::warn!("Could not read guest session id, starting a new session: {}", e),
        }

        let session_id = generate_session_id();
        if let Err(e) = self.storage.set(SESSION_KEY, &session_id) {
            log::warn!("Could not persist guest session id: {}", e);
        }
        session_id
    }
}

#[cfg(test)]
pub(crate) struct BrokenStorage;

#[cfg(test)]
impl DurableStorage for BrokenStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Read("quota exceeded".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Write("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Write("quota exceeded".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_session_id_is_stable_within_storage_scope() {
        let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::default());
        let provider = SessionIdentityProvider::new(storage.clone());

        let first = provider.get_or_create_session_id();
        let second = SessionIdentityProvider::new(storage).get_or_create_session_id();

        assert_eq!(first, second);
        assert!(first.starts_with(GUEST_SESSION_PREFIX));
    }

    #[test]
    fn test_separate_scopes_get_distinct_ids() {
        let a = SessionIdentityProvider::new(Arc::new(MemoryStorage::default()));
        let b = SessionIdentityProvider::new(Arc::new(MemoryStorage::default()));
        assert_ne!(a.get_or_create_session_id(), b.get_or_create_session_id());
    }

    #[test]
    fn test_broken_storage_still_yields_an_id() {
        let provider = SessionIdentityProvider::new(Arc::new(BrokenStorage));
        let id = provider.get_or_create_session_id();
        assert!(id.starts_with(GUEST_SESSION_PREFIX));
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let path = std::env::temp_dir().join(format!("itinera-storage-{}.json", uuid::Uuid::new_v4()));

        let first = SessionIdentityProvider::new(Arc::new(FileStorage::new(&path)))
            .get_or_create_session_id();
        let reopened = SessionIdentityProvider::new(Arc::new(FileStorage::new(&path)))
            .get_or_create_session_id();
        assert_eq!(first, reopened);

        let storage = FileStorage::new(&path);
        storage.remove(SESSION_KEY).unwrap();
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);

        let _ = fs::remove_file(&path);
    }
}
