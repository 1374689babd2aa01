//! Durable key-value slot for the persisted session.
//!
//! Only the session manager writes here. Every write and clear is complete
//! by the time the call returns; readers never see half a record.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store lock poisoned")]
    Poisoned,

    #[error("could not resolve a data directory for the session store")]
    NoDataDir,
}

/// Local durable storage, addressed by slot name.
pub trait SessionStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a slot that does not exist is not an error.
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    slots: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a slot, e.g. with a record left behind by an earlier run.
    pub fn with_slot(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut slots) = self.slots.write() {
            slots.insert(key.into(), value.into());
        }
        self
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let slots = self.slots.read().map_err(|_| StoreError::Poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| StoreError::Poisoned)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| StoreError::Poisoned)?;
        slots.remove(key);
        Ok(())
    }
}

/// One JSON file per slot inside a directory.
///
/// Writes go to a temporary sibling first and are renamed over the slot.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<OS data dir>/construcard`, falling back to `~/.local/share/construcard`.
    pub fn default_dir() -> Result<PathBuf, StoreError> {
        let mut dir = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut h| {
                    h.push(".local");
                    h.push("share");
                    h
                })
            })
            .ok_or(StoreError::NoDataDir)?;
        dir.push("construcard");
        Ok(dir)
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.slot_path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // Binary garbage in the slot is a corrupt record, not an I/O failure.
            Err(e) if e.kind() == ErrorKind::InvalidData => Ok(Some(String::new())),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.slot_path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
