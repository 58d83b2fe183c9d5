//! Derived per-page data kept in the shared cache.
//!
//! Everything here can be recomputed from the store. Entries live in the
//! `pages` bucket:
//!
//! ```text
//! page_{id}               language -> content type -> {body, creation_date}
//! page_{id}_url           language -> complete slug
//! page_broken_link_{id}   present when a link checker flagged the page
//! first_root_id           id of the first root
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use folio_cache::{Cache, CacheBucket, CacheBucketExt};
use folio_store::PageId;
use serde::{Deserialize, Serialize};

/// Bucket holding all page-derived entries.
pub(crate) const BUCKET: &str = "pages";

const FIRST_ROOT_KEY: &str = "first_root_id";

/// Current body of one content slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedContent {
    /// Content body.
    pub body: String,
    /// Creation date of the revision the body came from.
    pub creation_date: DateTime<Utc>,
}

/// Current content of a page: language -> content type -> body.
///
/// A language that was queried and had no content maps to an empty map.
pub type ContentMap = BTreeMap<String, BTreeMap<String, CachedContent>>;

/// Complete slugs of a page by language.
pub type UrlPaths = BTreeMap<String, String>;

fn content_key(id: PageId) -> String {
    format!("page_{id}")
}

fn url_key(id: PageId) -> String {
    format!("page_{id}_url")
}

fn broken_link_key(id: PageId) -> String {
    format!("page_broken_link_{id}")
}

/// Typed access to the `pages` bucket.
pub(crate) struct DerivedCache {
    bucket: Box<dyn CacheBucket>,
}

impl DerivedCache {
    pub(crate) fn new(cache: &dyn Cache) -> Self {
        Self {
            bucket: cache.bucket(BUCKET),
        }
    }

    pub(crate) fn content(&self, id: PageId) -> Option<ContentMap> {
        self.bucket.get_json(&content_key(id))
    }

    pub(crate) fn set_content(&self, id: PageId, content: &ContentMap) {
        self.bucket.set_json(&content_key(id), content);
    }

    pub(crate) fn url_paths(&self, id: PageId) -> Option<UrlPaths> {
        self.bucket.get_json(&url_key(id))
    }

    pub(crate) fn set_url_paths(&self, id: PageId, paths: &UrlPaths) {
        self.bucket.set_json(&url_key(id), paths);
    }

    pub(crate) fn first_root(&self) -> Option<PageId> {
        self.bucket.get_json(FIRST_ROOT_KEY)
    }

    pub(crate) fn set_first_root(&self, id: PageId) {
        self.bucket.set_json(FIRST_ROOT_KEY, &id);
    }

    pub(crate) fn clear_first_root(&self) {
        self.bucket.delete(FIRST_ROOT_KEY);
    }

    pub(crate) fn has_broken_link(&self, id: PageId) -> bool {
        self.bucket.get(&broken_link_key(id)).is_some()
    }

    pub(crate) fn set_broken_link(&self, id: PageId) {
        self.bucket.set_json(&broken_link_key(id), &true);
    }

    /// Drop every entry derived from one page, plus the first-root entry.
    pub(crate) fn invalidate_page(&self, id: PageId) {
        self.bucket.delete(&content_key(id));
        self.bucket.delete(&url_key(id));
        self.bucket.delete(&broken_link_key(id));
        self.clear_first_root();
    }

    /// Drop only the URL paths of a page.
    pub(crate) fn invalidate_url(&self, id: PageId) {
        self.bucket.delete(&url_key(id));
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use folio_cache::MemoryCache;
    use pretty_assertions::assert_eq;

    use super::*;

    fn content() -> ContentMap {
        let entry = CachedContent {
            body: "Home".to_owned(),
            creation_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        BTreeMap::from([
            (
                "en".to_owned(),
                BTreeMap::from([("title".to_owned(), entry)]),
            ),
            ("fr".to_owned(), BTreeMap::new()),
        ])
    }

    #[test]
    fn test_content_round_trip_keeps_empty_languages() {
        let cache = DerivedCache::new(&MemoryCache::new());

        cache.set_content(PageId(1), &content());

        assert_eq!(cache.content(PageId(1)), Some(content()));
    }

    #[test]
    fn test_keys_are_stable() {
        let shared = MemoryCache::new();
        let cache = DerivedCache::new(&shared);
        cache.set_content(PageId(4), &content());
        cache.set_url_paths(PageId(4), &UrlPaths::new());
        cache.set_broken_link(PageId(4));
        cache.set_first_root(PageId(1));

        let bucket = shared.bucket(BUCKET);
        for key in ["page_4", "page_4_url", "page_broken_link_4", "first_root_id"] {
            assert!(bucket.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_invalidate_page_clears_page_entries_and_first_root() {
        let shared = MemoryCache::new();
        let cache = DerivedCache::new(&shared);
        cache.set_content(PageId(2), &content());
        cache.set_url_paths(
            PageId(2),
            &UrlPaths::from([("en".to_owned(), "about".to_owned())]),
        );
        cache.set_broken_link(PageId(2));
        cache.set_first_root(PageId(1));
        cache.set_content(PageId(3), &content());

        cache.invalidate_page(PageId(2));

        assert_eq!(cache.content(PageId(2)), None);
        assert_eq!(cache.url_paths(PageId(2)), None);
        assert!(!cache.has_broken_link(PageId(2)));
        assert_eq!(cache.first_root(), None);
        assert!(cache.content(PageId(3)).is_some());
    }

    #[test]
    fn test_invalidate_url_keeps_content() {
        let cache = DerivedCache::new(&MemoryCache::new());
        cache.set_content(PageId(2), &content());
        cache.set_url_paths(PageId(2), &UrlPaths::new());

        cache.invalidate_url(PageId(2));

        assert_eq!(cache.url_paths(PageId(2)), None);
        assert!(cache.content(PageId(2)).is_some());
    }
}
