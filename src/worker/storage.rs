//! In-memory cache storage: named buckets of request/response pairs.
//!
//! Mirrors the shape of the browser's `CacheStorage`/`Cache` pair. A
//! [`CacheStorage`] is a cheap handle (clone it freely); all clones see the same
//! buckets. Buckets are kept in creation order, which is the order
//! [`CacheStorage::match_request`] searches them in.
//!
//! Writes are last-write-wins per key. There is no locking across operations,
//! only around each individual read or write, so concurrent fetches for the
//! same URL race and the later `put` wins.

use super::http::{RequestKey, Response};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

/// A captured response: everything needed to rebuild it any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: SystemTime,
}

impl CacheEntry {
    /// Consume a response copy and capture it for storage.
    pub fn capture(response: Response, stored_at: SystemTime) -> Self {
        let (status, status_text, headers, body) = response.into_parts();
        Self {
            status,
            status_text,
            headers,
            body,
            stored_at,
        }
    }

    /// Build a fresh, independently readable response from this entry.
    pub fn to_response(&self) -> Response {
        Response::from_parts(
            self.status,
            self.status_text.clone(),
            self.headers.clone(),
            self.body.clone(),
        )
    }
}

#[derive(Debug, Default)]
struct Bucket {
    name: String,
    entries: BTreeMap<RequestKey, CacheEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    buckets: Arc<Mutex<Vec<Bucket>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Bucket>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a bucket, creating it if it doesn't exist yet.
    pub fn open(&self, name: &str) -> Cache {
        let mut buckets = self.lock();
        if !buckets.iter().any(|b| b.name == name) {
            buckets.push(Bucket {
                name: name.to_string(),
                entries: BTreeMap::new(),
            });
        }
        Cache {
            name: name.to_string(),
            storage: self.clone(),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.lock().iter().any(|b| b.name == name)
    }

    /// Bucket names in creation order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().iter().map(|b| b.name.clone()).collect()
    }

    /// Delete a bucket. Returns whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        let mut buckets = self.lock();
        let before = buckets.len();
        buckets.retain(|b| b.name != name);
        buckets.len() != before
    }

    /// Look `key` up in every bucket, oldest first.
    pub fn match_request(&self, key: &RequestKey) -> Option<Response> {
        self.lock()
            .iter()
            .find_map(|b| b.entries.get(key))
            .map(CacheEntry::to_response)
    }
}

/// Handle to one named bucket.
#[derive(Debug, Clone)]
pub struct Cache {
    name: String,
    storage: CacheStorage,
}

impl Cache {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn with_bucket<T>(&self, f: impl FnOnce(&mut Bucket) -> T) -> Option<T> {
        let mut buckets = self.storage.lock();
        buckets.iter_mut().find(|b| b.name == self.name).map(f)
    }

    /// Store an entry, replacing any previous one for the same key.
    ///
    /// Returns `false` when the bucket has been deleted since this handle was
    /// opened; the write is dropped rather than resurrecting the bucket.
    pub fn put(&self, key: RequestKey, entry: CacheEntry) -> bool {
        self.with_bucket(|b| {
            b.entries.insert(key, entry);
        })
        .is_some()
    }

    /// Store several entries under one lock.
    pub fn put_all(&self, entries: Vec<(RequestKey, CacheEntry)>) -> bool {
        self.with_bucket(|b| b.entries.extend(entries)).is_some()
    }

    pub fn match_request(&self, key: &RequestKey) -> Option<Response> {
        self.with_bucket(|b| b.entries.get(key).map(CacheEntry::to_response))
            .flatten()
    }

    /// The stored entry itself, including when it was captured.
    pub fn entry(&self, key: &RequestKey) -> Option<CacheEntry> {
        self.with_bucket(|b| b.entries.get(key).cloned()).flatten()
    }

    /// Cached keys, in key order.
    pub fn keys(&self) -> Vec<RequestKey> {
        self.with_bucket(|b| b.entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.with_bucket(|b| b.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
