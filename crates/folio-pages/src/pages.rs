//! The page service.
//!
//! Provides [`Pages`], which ties the store, the nested-set forest and the
//! derived caches together behind one thread-safe handle.
//!
//! # Thread Safety
//!
//! `Pages` is designed for concurrent access:
//! - `forest()` returns `Arc<Forest>` with minimal locking (just Arc clone)
//! - structural writes (insert, move, delete, reload) are serialized by a
//!   mutex, planned on a copy of the tree as currently stored and published
//!   with a single swap, so readers never observe partial renumbering
//! - the store applies each structural write in one step and rejects it if
//!   the numbering it was planned on changed meanwhile, which keeps several
//!   `Pages` handles over one store consistent
//! - attribute and content writes skip the structure lock; they only
//!   invalidate derived caches
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use folio_cache::MemoryCache;
//! use folio_pages::{Pages, PagesConfig};
//! use folio_store::{MemoryStore, PageNode};
//!
//! let pages = Pages::new(Arc::new(MemoryStore::new()), &MemoryCache::new(), PagesConfig::default())?;
//! let home = pages.save_page(PageNode::new())?;
//! pages.save_content(home.id.unwrap(), "en", "slug", "home")?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use folio_cache::Cache;
use folio_store::{
    ContentKey, ContentRevision, NewRevision, PageId, PageNode, PageStatus, PageStore,
    StructureChange, TreeNode, UrlAlias,
};
use folio_tree::{Forest, Placement, RemoveMode};

use crate::alias::{DefaultNormalizer, UrlNormalizer};
use crate::config::PagesConfig;
use crate::error::PageError;
use crate::memo::LocalMemo;
use crate::page_cache::DerivedCache;

/// Page tree with content resolution and derived caches.
///
/// # Thread Safety
///
/// - Uses internal `RwLock<Arc<Forest>>` for the current forest snapshot
/// - Uses `Mutex<()>` for serializing structural writes
pub struct Pages {
    pub(crate) store: Arc<dyn PageStore>,
    pub(crate) cache: DerivedCache,
    pub(crate) config: PagesConfig,
    normalizer: Box<dyn UrlNormalizer>,
    /// Mutex for serializing structural writes.
    structure_lock: Mutex<()>,
    /// Current forest snapshot (atomically swappable).
    current_forest: RwLock<Arc<Forest>>,
    pub(crate) memo: LocalMemo,
}

/// Rebuild the forest index from every page record in the store.
fn load_forest(store: &dyn PageStore) -> Result<Forest, PageError> {
    Ok(StoredTree::read(store)?.forest)
}

/// The tree as stored, read at the start of a structural write.
struct StoredTree {
    nodes: HashMap<PageId, TreeNode>,
    forest: Forest,
}

impl StoredTree {
    fn read(store: &dyn PageStore) -> Result<Self, PageError> {
        let nodes: HashMap<PageId, TreeNode> = store
            .pages()?
            .iter()
            .filter_map(PageNode::tree_node)
            // Records without numbering are still being inserted elsewhere.
            .filter(|node| node.position.left != 0)
            .map(|node| (node.id, node))
            .collect();
        let forest = Forest::from_nodes(nodes.values().copied())?;
        Ok(Self { nodes, forest })
    }

    /// Store write turning the stored tree into `next`.
    ///
    /// Every node whose stored link or numbering differs from `next` is
    /// rewritten, and the stored values of those nodes and of `removed` are
    /// expected to be unchanged when the write lands.
    fn change_to(&self, next: &Forest, removed: &[PageId]) -> StructureChange {
        let mut change = StructureChange {
            removed: removed.to_vec(),
            ..StructureChange::default()
        };
        for node in next.nodes() {
            let stored = self.nodes.get(&node.id);
            if stored == Some(&node) {
                continue;
            }
            change.expected.extend(stored.copied());
            change.positions.push(node);
        }
        change
            .expected
            .extend(removed.iter().filter_map(|id| self.nodes.get(id).copied()));
        change
    }
}

impl Pages {
    /// Create the service and load the forest from the store.
    ///
    /// # Arguments
    ///
    /// * `store` - Page, revision and alias persistence
    /// * `cache` - Shared cache; derived entries go to its `pages` bucket
    /// * `config` - Languages, templates and policies
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the pages cannot be read and
    /// [`PageError::Conflict`] if their numbering is corrupted.
    pub fn new(
        store: Arc<dyn PageStore>,
        cache: &dyn Cache,
        config: PagesConfig,
    ) -> Result<Self, PageError> {
        let forest = load_forest(store.as_ref())?;
        tracing::info!(
            pages = forest.len(),
            trees = forest.roots().len(),
            "Loaded page forest"
        );

        Ok(Self {
            store,
            cache: DerivedCache::new(cache),
            config,
            normalizer: Box::new(DefaultNormalizer),
            structure_lock: Mutex::new(()),
            current_forest: RwLock::new(Arc::new(forest)),
            memo: LocalMemo::default(),
        })
    }

    /// Replace the alias URL normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: impl UrlNormalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PagesConfig {
        &self.config
    }

    /// Get the current forest snapshot.
    ///
    /// The snapshot stays consistent while held; structural writes publish a
    /// new one.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn forest(&self) -> Arc<Forest> {
        self.current_forest.read().unwrap().clone()
    }

    fn publish(&self, forest: Forest) {
        *self.current_forest.write().unwrap() = Arc::new(forest);
    }

    /// Read the stored tree for a structural write. Must be called with the
    /// structure lock held.
    ///
    /// Other handles on the same store may have changed the tree since this
    /// one last loaded it. In that case the stored tree becomes the current
    /// snapshot and the local memo is dropped before the write is planned.
    fn stored_tree(&self) -> Result<(StoredTree, Arc<Forest>), PageError> {
        let stored = StoredTree::read(self.store.as_ref())?;
        let published = self.forest();
        if published.nodes() == stored.forest.nodes() {
            return Ok((stored, published));
        }

        tracing::info!(
            pages = stored.forest.len(),
            "Page tree changed in the store, resynchronizing"
        );
        let current = Arc::new(stored.forest.clone());
        *self.current_forest.write().unwrap() = Arc::clone(&current);
        self.memo.clear();
        self.cache.clear_first_root();
        Ok((stored, current))
    }

    /// Rebuild the forest from the store and drop the local memo.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] or [`PageError::Conflict`] as
    /// [`Pages::new`] does; the previous snapshot stays active on error.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn reload(&self) -> Result<(), PageError> {
        let _guard = self.structure_lock.lock().unwrap();
        let forest = load_forest(self.store.as_ref())?;
        tracing::info!(pages = forest.len(), "Reloaded page forest");
        self.publish(forest);
        self.memo.clear();
        self.cache.clear_first_root();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Look up a page.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the store fails.
    pub fn page(&self, id: PageId) -> Result<Option<PageNode>, PageError> {
        Ok(self.store.page(id)?)
    }

    /// All pages in tree order.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the store fails.
    pub fn pages(&self) -> Result<Vec<PageNode>, PageError> {
        Ok(self.store.pages()?)
    }

    pub(crate) fn require(&self, id: PageId) -> Result<PageNode, PageError> {
        self.store.page(id)?.ok_or(PageError::NotFound(id))
    }

    /// Tree roots in order.
    pub fn roots(&self) -> Vec<PageId> {
        self.forest().roots().to_vec()
    }

    /// Children of a page in sibling order.
    pub fn children(&self, id: PageId) -> Vec<PageId> {
        self.forest().children(id).to_vec()
    }

    /// Ancestors of a page, nearest first when `ascending`.
    pub fn ancestors(&self, id: PageId, ascending: bool) -> Vec<PageId> {
        self.forest().ancestors(id, ascending)
    }

    /// Descendants of a page in document order.
    pub fn descendants(&self, id: PageId) -> Vec<PageId> {
        self.forest().descendants(id)
    }

    /// Next page when reading the page's tree front to back.
    pub fn next_in_book(&self, id: PageId) -> Option<PageId> {
        folio_tree::next_in_book(&self.forest(), id)
    }

    /// Previous page when reading the page's tree front to back.
    pub fn previous_in_book(&self, id: PageId) -> Option<PageId> {
        folio_tree::previous_in_book(&self.forest(), id)
    }

    /// The root of the first tree.
    ///
    /// Served from the local memo, then the shared cache; recomputed from the
    /// forest otherwise. Only a found root is cached.
    pub fn first_root(&self) -> Option<PageId> {
        if let Some(id) = self.memo.first_root() {
            return Some(id);
        }
        if let Some(id) = self.cache.first_root() {
            self.memo.set_first_root(id);
            return Some(id);
        }
        let id = self.forest().first_root()?;
        tracing::debug!(%id, "Computed first root");
        self.cache.set_first_root(id);
        self.memo.set_first_root(id);
        Some(id)
    }

    /// True if the page is the root of the first tree.
    pub fn is_first_root(&self, id: PageId) -> bool {
        self.forest().is_root(id) && self.first_root() == Some(id)
    }

    /// Pages a page may be moved next to or under: everything except the
    /// page itself and its descendants, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NotFound`] if the page is not in the tree.
    pub fn valid_targets(&self, id: PageId) -> Result<Vec<PageId>, PageError> {
        let forest = self.forest();
        if !forest.contains(id) {
            return Err(PageError::NotFound(id));
        }
        Ok(forest
            .iter()
            .filter(|&other| other != id && !forest.is_descendant_of(other, id))
            .collect())
    }

    /// The page this page redirects to, if it names one that still exists.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the store fails.
    pub fn redirect_target(&self, page: &PageNode) -> Result<Option<PageNode>, PageError> {
        match page.redirect_to {
            Some(target) => self.page(target),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Publication
    // ------------------------------------------------------------------

    /// Status shown to visitors right now.
    pub fn calculated_status(&self, page: &PageNode) -> PageStatus {
        self.config.publication.calculated_status(page, Utc::now())
    }

    /// True if visitors can reach the page right now.
    pub fn is_visible(&self, page: &PageNode) -> bool {
        self.config.publication.is_visible(page, Utc::now())
    }

    /// Children whose calculated status is Published, in sibling order.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the store fails.
    pub fn published_children(&self, id: PageId) -> Result<Vec<PageNode>, PageError> {
        let now = Utc::now();
        let mut published = Vec::new();
        for child in self.children(id) {
            if let Some(page) = self.store.page(child)?
                && self.config.publication.calculated_status(&page, now) == PageStatus::Published
            {
                published.push(page);
            }
        }
        Ok(published)
    }

    /// Published children, newest publication date first.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the store fails.
    pub fn published_children_by_date(&self, id: PageId) -> Result<Vec<PageNode>, PageError> {
        let mut children = self.published_children(id)?;
        children.sort_by(|a, b| b.publication_date.cmp(&a.publication_date));
        Ok(children)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Save a page, stamping it with the current time.
    ///
    /// See [`Pages::save_page_at`].
    ///
    /// # Errors
    ///
    /// See [`Pages::save_page_at`].
    pub fn save_page(&self, page: PageNode) -> Result<PageNode, PageError> {
        self.save_page_at(page, Utc::now())
    }

    /// Save a page as of `now`.
    ///
    /// The page is normalized first (publication date, modification date,
    /// default site). A page without identity is inserted as the last child
    /// of its parent, or as the last root. Saving an existing page never
    /// changes the tree; use [`Pages::move_page`] for that. Derived caches of
    /// the page are dropped, including its broken-link flag.
    ///
    /// Returns the stored page.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NotFound`] if the page or its new parent is
    /// unknown.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn save_page_at(
        &self,
        mut page: PageNode,
        now: DateTime<Utc>,
    ) -> Result<PageNode, PageError> {
        self.config
            .publication
            .normalize_on_save(&mut page, now, self.config.default_site);

        let Some(id) = page.id else {
            return self.insert_page(page);
        };
        if self.store.page(id)?.is_none() {
            return Err(PageError::NotFound(id));
        }
        self.store.update_page(&page)?;
        self.invalidate(id);
        self.require(id)
    }

    fn insert_page(&self, page: PageNode) -> Result<PageNode, PageError> {
        let _guard = self.structure_lock.lock().unwrap();
        let (stored, current) = self.stored_tree()?;

        let placement = match page.parent {
            Some(parent) if !current.contains(parent) => return Err(PageError::NotFound(parent)),
            Some(parent) => Placement::LastChildOf(parent),
            None => Placement::Root,
        };

        let record = self.store.insert_page(page)?;
        let id = record.id.ok_or_else(|| {
            PageError::InvalidState("store returned a page without identity".to_owned())
        })?;

        let mut next = Forest::clone(&current);
        if let Err(err) = next.insert(id, placement) {
            self.store.apply_structure(&StructureChange::removal(&[id]))?;
            return Err(PageError::from_tree(err));
        }
        if let Err(err) = self.store.apply_structure(&stored.change_to(&next, &[])) {
            self.store.apply_structure(&StructureChange::removal(&[id]))?;
            return Err(err.into());
        }

        self.publish(next);
        self.invalidate(id);
        self.refresh_first_root(current.first_root());
        tracing::info!(%id, ?placement, "Created page");

        self.require(id)
    }

    /// Append a content revision stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the page is unknown to the store.
    pub fn save_content(
        &self,
        page: PageId,
        language: &str,
        content_type: &str,
        body: &str,
    ) -> Result<ContentRevision, PageError> {
        self.save_revision(NewRevision {
            key: ContentKey::new(page, language, content_type),
            body: body.to_owned(),
            creation_date: Utc::now(),
        })
    }

    /// Append a content revision and drop the page's derived caches.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the page is unknown to the store.
    pub fn save_revision(&self, revision: NewRevision) -> Result<ContentRevision, PageError> {
        let stored = self.store.insert_revision(revision)?;
        self.invalidate(stored.page);
        tracing::debug!(
            page = %stored.page,
            language = %stored.language,
            content_type = %stored.content_type,
            "Saved content revision"
        );
        Ok(stored)
    }

    /// Move a page together with its subtree.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NotFound`] if the page or anchor is unknown and
    /// [`PageError::Conflict`] if the page would land inside itself. Forest
    /// and store are untouched on error.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn move_page(&self, id: PageId, placement: Placement) -> Result<(), PageError> {
        let _guard = self.structure_lock.lock().unwrap();
        let (stored, current) = self.stored_tree()?;

        let mut next = Forest::clone(&current);
        let changed = next
            .move_node(id, placement)
            .map_err(PageError::from_tree)?;
        self.store.apply_structure(&stored.change_to(&next, &[]))?;

        self.publish(next);
        self.invalidate(id);
        self.refresh_first_root(current.first_root());
        tracing::info!(%id, ?placement, changed = changed.len(), "Moved page");
        Ok(())
    }

    /// Delete a page.
    ///
    /// With [`RemoveMode::Cascade`] the whole subtree goes; with
    /// [`RemoveMode::ReparentChildren`] the children take the page's place.
    /// Revisions of deleted pages are deleted too; aliases and redirects
    /// pointing at them are cleared.
    ///
    /// Returns the deleted page ids, the named page first.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NotFound`] if the page is unknown.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn delete_page(&self, id: PageId, mode: RemoveMode) -> Result<Vec<PageId>, PageError> {
        let _guard = self.structure_lock.lock().unwrap();
        let (stored, current) = self.stored_tree()?;

        let mut next = Forest::clone(&current);
        let removal = next.remove(id, mode).map_err(PageError::from_tree)?;
        let reparented = match mode {
            RemoveMode::Cascade => Vec::new(),
            RemoveMode::ReparentChildren => current.children(id).to_vec(),
        };

        self.store.apply_structure(&stored.change_to(&next, &removal.removed))?;

        self.publish(next);
        for &gone in &removal.removed {
            self.cache.invalidate_page(gone);
            self.memo.forget(gone);
        }
        for child in reparented {
            self.invalidate_urls(child);
        }
        self.refresh_first_root(current.first_root());
        tracing::info!(%id, ?mode, removed = removal.removed.len(), "Deleted page");

        Ok(removal.removed)
    }

    // ------------------------------------------------------------------
    // Derived caches
    // ------------------------------------------------------------------

    /// Drop the derived caches of a page.
    ///
    /// Clears the page's content, URL paths, broken-link flag and memo, plus
    /// the first-root entry. With cascading invalidation the URL paths of
    /// every descendant go too, since they embed this page's slug.
    pub fn invalidate(&self, id: PageId) {
        self.cache.invalidate_page(id);
        self.memo.forget(id);
        if self.config.cascade_invalidation {
            for descendant in self.descendants(id) {
                self.cache.invalidate_url(descendant);
                self.memo.forget_urls(descendant);
            }
        }
        tracing::debug!(%id, "Invalidated page caches");
    }

    /// Drop the URL paths of a page and, when cascading, its descendants.
    fn invalidate_urls(&self, id: PageId) {
        self.cache.invalidate_url(id);
        self.memo.forget_urls(id);
        if self.config.cascade_invalidation {
            for descendant in self.descendants(id) {
                self.cache.invalidate_url(descendant);
                self.memo.forget_urls(descendant);
            }
        }
    }

    /// Reset the first root after a structural write and, when its slug is
    /// hidden, drop the URL paths of the trees that gained or lost it.
    fn refresh_first_root(&self, previous: Option<PageId>) {
        self.cache.clear_first_root();
        self.memo.clear_first_root();

        let forest = self.forest();
        let current = forest.first_root();
        if current == previous || !self.config.hide_root_slug {
            return;
        }
        for root in [previous, current].into_iter().flatten() {
            if forest.contains(root) {
                self.invalidate_urls(root);
            }
        }
    }

    /// Drop the local memo; the shared cache is untouched.
    pub fn clear_local_memo(&self) {
        self.memo.clear();
    }

    /// Flag a page as containing broken links. Cleared by the next save.
    pub fn mark_broken_link(&self, id: PageId) {
        self.cache.set_broken_link(id);
    }

    /// True if a link checker flagged the page since its last save.
    pub fn has_broken_link(&self, id: PageId) -> bool {
        self.cache.has_broken_link(id)
    }

    // ------------------------------------------------------------------
    // Aliases
    // ------------------------------------------------------------------

    /// Page an alias URL points at.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the store fails.
    pub fn resolve_alias(&self, url: &str) -> Result<Option<PageId>, PageError> {
        let url = self.normalizer.normalize(url);
        Ok(self.store.alias(&url)?.and_then(|alias| alias.page))
    }

    /// Create or repoint an alias. The URL is normalized first.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the target page is unknown.
    pub fn save_alias(&self, url: &str, page: Option<PageId>) -> Result<UrlAlias, PageError> {
        let alias = UrlAlias {
            url: self.normalizer.normalize(url),
            page,
        };
        self.store.upsert_alias(alias.clone())?;
        Ok(alias)
    }

    /// Remove an alias. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the store fails.
    pub fn delete_alias(&self, url: &str) -> Result<bool, PageError> {
        let url = self.normalizer.normalize(url);
        Ok(self.store.delete_alias(&url)?)
    }
}
