use crate::error::Result;

/// Abstract interface for durable key/value blob storage.
///
/// This trait handles the "how" of storage (filesystem vs memory), while
/// [`super::AudioStore`] handles the "what" (records, indexes, cascades).
/// Every method takes `&self`: backends are stateless I/O or use interior
/// mutability.
///
/// Keys are flat strings such as `murmur.store.v2`. Values are opaque UTF-8
/// strings; the store only ever writes JSON and the literals `true`/`false`.
pub trait StorageBackend {
    /// Read the blob stored under `key`.
    /// Returns Ok(None) if nothing was ever written there.
    /// Returns Err only on actual I/O errors.
    fn read_blob(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob under `key`.
    /// MUST be atomic: readers see the old blob or the new one, never a mix.
    fn write_blob(&self, key: &str, contents: &str) -> Result<()>;

    /// Delete the blob under `key`. Deleting a missing key is not an error.
    fn delete_blob(&self, key: &str) -> Result<()>;

    /// List every key currently holding a blob.
    fn list_keys(&self) -> Result<Vec<String>>;

    // --- Persisted flags ---

    /// Read a boolean flag. Missing or unparsable flags read as `false`.
    fn read_flag(&self, key: &str) -> Result<bool> {
        Ok(self
            .read_blob(key)?
            .is_some_and(|raw| raw.trim() == "true"))
    }

    fn write_flag(&self, key: &str, value: bool) -> Result<()> {
        self.write_blob(key, if value { "true" } else { "false" })
    }
}

impl<B: StorageBackend + ?Sized> StorageBackend for &B {
    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        (**self).read_blob(key)
    }

    fn write_blob(&self, key: &str, contents: &str) -> Result<()> {
        (**self).write_blob(key, contents)
    }

    fn delete_blob(&self, key: &str) -> Result<()> {
        (**self).delete_blob(key)
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        (**self).list_keys()
    }
}
