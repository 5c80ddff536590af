use loam_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. Content-addressing guarantees this:
///   the same bytes always produce the same ID.
/// - `put` is idempotent: storing existing content is a no-op that returns
///   the same ID.
/// - The store never interprets object contents -- it is a pure key-value store.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Store `data` and return its content-addressed ID.
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId>;

    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>>;

    /// Check whether an object exists in the store.
    fn contains(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Remove an object by ID. Returns `true` if the object existed.
    ///
    /// Only the staging index calls this, to release blobs that no staged
    /// entry references any more.
    fn remove(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read an object, failing with [`StoreError::NotFound`] if it is absent.
    fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }
}
