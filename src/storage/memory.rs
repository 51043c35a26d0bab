use std::cell::{Cell, RefCell};
use std::io;
use std::path::{Path, PathBuf};

use crate::{
    models::store::AppData,
    storage::{Storage, StorageError, decode_or_default, encode},
};

const MEMORY_ORIGIN: &str = "<memory>";

/// Keeps the serialized record in a single in-process slot.
///
/// Goes through the same encode/decode path as the file storage, so it also
/// exercises migrations and the malformed-data fallback.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: RefCell<Option<String>>,
    fail_writes: Cell<bool>,
    saves: Cell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.slot.replace(Some(contents.into()));
        storage
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    /// Makes every following `save` fail without touching the slot
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<AppData, StorageError> {
        match self.slot.borrow().as_deref() {
            Some(contents) if !contents.is_empty() => {
                decode_or_default(contents, Path::new(MEMORY_ORIGIN))
            }
            _ => Ok(AppData::default()),
        }
    }

    fn save(&self, data: &AppData) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            return Err(StorageError::SaveFailed {
                path: PathBuf::from(MEMORY_ORIGIN),
                source: io::Error::other("writes are disabled"),
            });
        }
        let json = encode(data)?;
        self.slot.replace(Some(json));
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
