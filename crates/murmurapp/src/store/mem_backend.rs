use super::backend::StorageBackend;
use crate::error::{MurmurError, Result};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the store is single-threaded.
/// This avoids the overhead of `RwLock` while still allowing the
/// `StorageBackend` trait to use `&self` for all methods.
#[derive(Default)]
pub struct MemBackend {
    blobs: RefCell<BTreeMap<String, String>>,
    writes: Cell<usize>,
    simulate_write_error: Cell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Number of successful blob writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Test helper to plant a raw blob (e.g. a corrupt or legacy one).
    pub fn insert_raw(&self, key: &str, contents: &str) {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), contents.to_string());
    }
}

impl StorageBackend for MemBackend {
    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn write_blob(&self, key: &str, contents: &str) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(MurmurError::Store("Simulated write error".to_string()));
        }
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), contents.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn delete_blob(&self, key: &str) -> Result<()> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.blobs.borrow().keys().cloned().collect())
    }
}
