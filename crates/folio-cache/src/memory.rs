//! In-memory cache implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::{Cache, CacheBucket};

type Buckets = HashMap<String, HashMap<String, Vec<u8>>>;

/// Process-shared in-memory [`Cache`].
///
/// Cloned handles share the same maps, so several page services in one
/// process see each other's entries and invalidations.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    buckets: Arc<RwLock<Buckets>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all buckets.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.read().unwrap().values().map(HashMap::len).sum()
    }

    /// Returns `true` if no bucket holds an entry.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(MemoryCacheBucket {
            buckets: Arc::clone(&self.buckets),
            name: name.to_owned(),
        })
    }
}

struct MemoryCacheBucket {
    buckets: Arc<RwLock<Buckets>>,
    name: String,
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let buckets = self.buckets.read().ok()?;
        buckets.get(&self.name)?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &[u8]) {
        let Ok(mut buckets) = self.buckets.write() else {
            tracing::warn!(bucket = %self.name, "memory cache lock poisoned, dropping write");
            return;
        };
        buckets
            .entry(self.name.clone())
            .or_default()
            .insert(key.to_owned(), value.to_vec());
    }

    fn delete(&self, key: &str) {
        if let Ok(mut buckets) = self.buckets.write()
            && let Some(entries) = buckets.get_mut(&self.name)
        {
            entries.remove(key);
        }
    }
}
