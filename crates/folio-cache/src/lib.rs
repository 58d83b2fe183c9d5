//! Cache abstraction layer for Folio.
//!
//! This crate provides generic caching traits that decouple cache consumers
//! from the underlying storage mechanism. Two traits form the core API:
//!
//! - [`Cache`]: Factory for named cache buckets
//! - [`CacheBucket`]: Key-value store with explicit deletion
//!
//! Caches are disposable. Every backend swallows its own failures and reports
//! a miss instead, so callers can always fall back to recomputation.
//!
//! # Implementations
//!
//! - [`NullCache`] / [`NullCacheBucket`]: No-op implementations (always miss)
//! - [`MemoryCache`]: Process-shared in-memory maps
//! - [`FileCache`]: File-based implementation with version validation
//!
//! # Example
//!
//! ```
//! use folio_cache::{Cache, MemoryCache};
//!
//! let cache = MemoryCache::new();
//! let bucket = cache.bucket("pages");
//! bucket.set("page_1_url", br#"{"en":"about"}"#);
//! assert!(bucket.get("page_1_url").is_some());
//! bucket.delete("page_1_url");
//! assert_eq!(bucket.get("page_1_url"), None);
//! ```

mod ext;
mod file;
mod memory;

pub use ext::CacheBucketExt;
pub use file::FileCache;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
///
/// Each bucket stores key-value pairs. Entries live until they are
/// overwritten, deleted or the backend drops them.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `None` on cache miss.
    ///
    /// # Arguments
    ///
    /// * `key` - Cache key (e.g., `page_4`)
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a value in the cache, overwriting any existing entry.
    ///
    /// # Arguments
    ///
    /// * `key` - Cache key (e.g., `page_4`)
    /// * `value` - Raw bytes to cache
    fn set(&self, key: &str, value: &[u8]);

    /// Remove an entry. Deleting a missing key is not an error.
    fn delete(&self, key: &str);
}

/// Factory for named cache [`CacheBucket`]s.
///
/// A `Cache` produces buckets that are logically isolated from each other.
/// For example, a file-based cache might store each bucket in a separate
/// subdirectory.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket.
    ///
    /// Calling `bucket` multiple times with the same name returns handles
    /// that share the same underlying storage.
    ///
    /// # Arguments
    ///
    /// * `name` - Bucket name (e.g., "pages")
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`] that never stores or retrieves data.
///
/// Every `get` returns `None`; every `set` is silently discarded.
/// Used as the bucket type for [`NullCache`].
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: &[u8]) {}

    fn delete(&self, _key: &str) {}
}

/// No-op [`Cache`] that always returns [`NullCacheBucket`]s.
///
/// Use when caching is disabled. All operations are no-ops and all lookups
/// return `None`.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}
