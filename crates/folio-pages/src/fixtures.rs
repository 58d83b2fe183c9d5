//! Shared setup for unit tests.

use std::sync::Arc;

use folio_cache::MemoryCache;
use folio_store::{MemoryStore, PageId, PageNode, PageStore};

use crate::{Pages, PagesConfig};

pub(crate) struct Fixture {
    pub(crate) pages: Pages,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) cache: MemoryCache,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::with_config(PagesConfig::default())
    }

    pub(crate) fn with_config(config: PagesConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = MemoryCache::new();
        let pages = Pages::new(
            Arc::clone(&store) as Arc<dyn PageStore>,
            &cache,
            config,
        )
        .unwrap();
        Self {
            pages,
            store,
            cache,
        }
    }

    pub(crate) fn store_handle(&self) -> Arc<dyn PageStore> {
        Arc::clone(&self.store) as Arc<dyn PageStore>
    }

    /// Save a new page with an English slug.
    pub(crate) fn add(&self, parent: Option<PageId>, slug: &str) -> PageId {
        let page = match parent {
            Some(parent) => PageNode::new().with_parent(parent),
            None => PageNode::new(),
        };
        let id = self.pages.save_page(page).unwrap().id.unwrap();
        self.pages.save_content(id, "en", "slug", slug).unwrap();
        id
    }

    pub(crate) fn node(&self, id: PageId) -> PageNode {
        self.pages.page(id).unwrap().unwrap()
    }
}
