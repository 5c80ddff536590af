use std::collections::HashMap;
use std::sync::RwLock;

use loam_types::ObjectId;

use crate::error::StoreResult;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Blobs are held behind a `RwLock` for
/// safe concurrent access and are cloned on read.
pub struct InMemoryObjectStore {
    blobs: RwLock<HashMap<ObjectId, Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Return a sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId> {
        let id = ObjectId::from_bytes(data);
        let mut map = self.blobs.write().expect("lock poisoned");
        // Same ID always maps to the same bytes.
        map.entry(id).or_insert_with(|| data.to_vec());
        Ok(id)
    }

    fn read(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn contains(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }

    fn remove(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(id).is_some())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn put_and_read() {
        let store = InMemoryObjectStore::new();
        let id = store.put(b"hello world").unwrap();
        assert_eq!(id, ObjectId::from_bytes(b"hello world"));
        assert_eq!(store.read(&id).unwrap().unwrap(), b"hello world");
    }

    #[test]
    fn put_deduplicates() {
        let store = InMemoryObjectStore::new();
        let id1 = store.put(b"identical content").unwrap();
        let id2 = store.put(b"identical content").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_bytes(b"missing");
        assert!(store.read(&id).unwrap().is_none());
        assert!(matches!(store.get(&id), Err(StoreError::NotFound(x)) if x == id));
    }

    #[test]
    fn remove_is_reported_once() {
        let store = InMemoryObjectStore::new();
        let id = store.put(b"to-delete").unwrap();
        assert!(store.contains(&id).unwrap());
        assert!(store.remove(&id).unwrap());
        assert!(!store.contains(&id).unwrap());
        assert!(!store.remove(&id).unwrap());
    }

    #[test]
    fn accounting_helpers() {
        let store = InMemoryObjectStore::default();
        assert!(store.is_empty());
        store.put(b"12345").unwrap();
        store.put(b"123456789").unwrap();
        assert_eq!(store.total_bytes(), 14);
        let ids = store.all_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] <= ids[1]);
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        let id = store.put(b"shared data").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let data = store.get(&id).unwrap();
                    assert_eq!(ObjectId::from_bytes(&data), id);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::new();
        store.put(b"x").unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryObjectStore"));
        assert!(debug.contains("object_count"));
    }
}
