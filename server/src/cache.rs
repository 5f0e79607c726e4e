use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::config::DEFAULT_CACHE_CAPACITY;
use crate::models::TagMap;

/// Bounded store of extracted tag maps keyed by request URL.
///
/// Least-recently-used entries are replaced once `capacity` distinct URLs are
/// held. There is no time-based expiry.
///
/// Cheaply cloneable — all clones share the same underlying store via `Arc`.
#[derive(Clone)]
pub struct MetadataCache {
    entries: Arc<Mutex<LruCache<String, Arc<TagMap>>>>,
}

impl MetadataCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Look up `url`, marking it most-recently-used on a hit.
    pub fn get(&self, url: &str) -> Option<Arc<TagMap>> {
        self.entries.lock().get(url).cloned()
    }

    /// Store `tags` under `url`.
    ///
    /// Overwrites and refreshes an existing entry; otherwise evicts the
    /// least-recently-used entry when full.
    pub fn put(&self, url: impl Into<String>, tags: Arc<TagMap>) {
        let url = url.into();
        if let Some((evicted, _)) = self.entries.lock().push(url.clone(), tags) {
            if evicted != url {
                tracing::debug!(url = %evicted, "Evicted least-recently-used cache entry");
            }
        }
    }

    /// Presence check that leaves recency untouched.
    pub fn contains(&self, url: &str) -> bool {
        self.entries.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
