//! Object store collaborator interface
//!
//! The bulk configuration documents live in a remote object store. This
//! module defines the narrow seam the rest of the library consumes: get and
//! put of a blob by bucket and key, with not-found as a value rather than an
//! error. Production wiring supplies a real client behind this trait; tests
//! and local tooling use [`InMemoryObjectStore`].

use crate::domain::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// One blob fetched from the object store
#[derive(Debug, Clone)]
pub struct FetchedObject {
    /// Raw object bytes
    pub body: Vec<u8>,

    /// Opaque revision identifier, when the store versions objects
    pub version_id: Option<String>,

    /// Object last-modified timestamp
    pub last_modified: Option<DateTime<Utc>>,
}

/// Blob storage seam
///
/// Implementations must map their own not-found signal to `Ok(None)`;
/// connection and timeout failures propagate as errors unchanged apart from
/// bucket/key context.
pub trait ObjectStore: Send + Sync {
    /// Fetch an object, or `None` if the key does not exist
    fn get_object(&self, bucket: &str, key: &str) -> Result<Option<FetchedObject>>;

    /// Store an object
    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}

/// In-memory object store for tests and local tooling
///
/// Objects written through `put_object` get a monotonically increasing
/// version id and a fresh last-modified timestamp, mirroring what a
/// versioned bucket reports.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<(String, String), FetchedObject>>,
    next_version: Mutex<u64>,
}

impl InMemoryObjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without going through `put_object`
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        let version = {
            let mut next = self.next_version.lock().expect("version lock poisoned");
            *next += 1;
            *next
        };
        self.objects.lock().expect("object lock poisoned").insert(
            (bucket.to_string(), key.to_string()),
            FetchedObject {
                body: body.into(),
                version_id: Some(version.to_string()),
                last_modified: Some(Utc::now()),
            },
        );
    }

    /// Whether an object exists under `bucket`/`key`
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .expect("object lock poisoned")
            .contains_key(&(bucket.to_string(), key.to_string()))
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Option<FetchedObject>> {
        Ok(self
            .objects
            .lock()
            .expect("object lock poisoned")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.insert(bucket, key, body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_object_is_none() {
        let store = InMemoryObjectStore::new();
        let fetched = store.get_object("bucket", "missing/key").unwrap();
        assert!(fetched.is_none());
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let store = InMemoryObjectStore::new();
        store
            .put_object("bucket", "some/key", b"contents".to_vec())
            .unwrap();

        let fetched = store.get_object("bucket", "some/key").unwrap().unwrap();
        assert_eq!(fetched.body, b"contents");
        assert!(fetched.version_id.is_some());
        assert!(fetched.last_modified.is_some());
    }

    #[test]
    fn test_versions_increase_per_write() {
        let store = InMemoryObjectStore::new();
        store.insert("bucket", "key", b"one".to_vec());
        let first = store.get_object("bucket", "key").unwrap().unwrap();
        store.insert("bucket", "key", b"two".to_vec());
        let second = store.get_object("bucket", "key").unwrap().unwrap();

        assert_ne!(first.version_id, second.version_id);
        assert_eq!(second.body, b"two");
    }
}
