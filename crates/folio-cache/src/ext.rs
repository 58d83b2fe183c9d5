//! Extension trait for [`CacheBucket`] with typed convenience methods.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// Typed convenience methods for [`CacheBucket`].
///
/// Provides `get_json`/`set_json` for serde-serializable types. [`CacheBucket`] stays
/// object-safe and byte-oriented; a blanket impl gives every bucket, boxed or
/// not, the typed methods.
///
/// # Example
///
/// ```
/// use folio_cache::{Cache, CacheBucketExt, MemoryCache};
/// use std::collections::BTreeMap;
///
/// let cache = MemoryCache::new();
/// let bucket = cache.bucket("pages");
///
/// let paths = BTreeMap::from([("en".to_owned(), "about/team".to_owned())]);
/// bucket.set_json("page_3_url", &paths);
/// let cached: Option<BTreeMap<String, String>> = bucket.get_json("page_3_url");
/// assert_eq!(cached, Some(paths));
/// ```
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve a JSON-deserialized value from the cache.
    ///
    /// Returns `None` on cache miss or deserialization failure.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store a value as JSON in the cache.
    ///
    /// Silently does nothing if serialization fails.
    fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(bytes) = serde_json::to_vec(value) {
            self.set(key, &bytes);
        }
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Cache, MemoryCache, NullCache};

    #[test]
    fn test_json_round_trip_through_boxed_bucket() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("pages");

        bucket.set_json("first_root_id", &7_u64);

        assert_eq!(bucket.get_json::<u64>("first_root_id"), Some(7));
    }

    #[test]
    fn test_get_json_discards_garbage() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("pages");

        bucket.set("page_1", b"not json");

        assert_eq!(bucket.get_json::<u64>("page_1"), None);
    }

    #[test]
    fn test_null_cache_typed_miss() {
        let bucket = NullCache.bucket("pages");

        bucket.set_json("k", &"v");

        assert_eq!(bucket.get_json::<String>("k"), None);
    }
}
