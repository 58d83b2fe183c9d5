//! In-memory store.
//!
//! Provides [`MemoryStore`], a [`PageStore`] backed by plain maps behind a
//! single `RwLock`. It seeds from a [`StoreSnapshot`], which is also the JSON
//! format the command line reads.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use folio_tree::PageId;
use serde::{Deserialize, Serialize};

use crate::record::{ContentKey, ContentRevision, NewRevision, PageNode, RevisionId, UrlAlias};
use crate::store::{PageStore, StoreError, StoreErrorKind, StructureChange};

const BACKEND: &str = "Memory";

/// Serializable dump of every record in a store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Pages, in any order.
    #[serde(default)]
    pub pages: Vec<PageNode>,
    /// Content revisions, in any order.
    #[serde(default)]
    pub revisions: Vec<ContentRevision>,
    /// URL aliases.
    #[serde(default)]
    pub aliases: Vec<UrlAlias>,
}

#[derive(Debug, Default)]
struct Tables {
    pages: BTreeMap<PageId, PageNode>,
    revisions: BTreeMap<RevisionId, ContentRevision>,
    aliases: BTreeMap<String, UrlAlias>,
    next_page: u64,
    next_revision: u64,
}

impl Tables {
    fn allocate_page(&mut self) -> PageId {
        self.next_page += 1;
        PageId(self.next_page)
    }

    fn allocate_revision(&mut self) -> RevisionId {
        self.next_revision += 1;
        RevisionId(self.next_revision)
    }

    fn slot<'a>(
        &'a self,
        key: &'a ContentKey,
        cutoff: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = &'a ContentRevision> + 'a {
        self.revisions.values().filter(move |revision| {
            revision.page == key.page
                && revision.language == key.language
                && revision.content_type == key.content_type
                && cutoff.is_none_or(|cutoff| revision.creation_date <= cutoff)
        })
    }
}

/// In-memory [`PageStore`].
///
/// # Example
///
/// ```ignore
/// use folio_store::{MemoryStore, PageNode, PageStore};
///
/// let store = MemoryStore::new();
/// let page = store.insert_page(PageNode::new())?;
/// assert!(store.page(page.id.unwrap())?.is_some());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the records of a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::Invalid`] if a page has no identity, and
    /// [`StoreErrorKind::AlreadyExists`] if identities repeat. Revisions and
    /// aliases must point at pages present in the snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut tables = Tables::default();

        for page in snapshot.pages {
            let Some(id) = page.id else {
                return Err(invalid("page without identity"));
            };
            if tables.pages.insert(id, page).is_some() {
                return Err(StoreError::new(StoreErrorKind::AlreadyExists)
                    .with_backend(BACKEND)
                    .with_entity(format!("page {id}")));
            }
            tables.next_page = tables.next_page.max(id.0);
        }

        for revision in snapshot.revisions {
            if !tables.pages.contains_key(&revision.page) {
                return Err(StoreError::page_not_found(revision.page).with_backend(BACKEND));
            }
            let id = revision.id;
            if tables.revisions.insert(id, revision).is_some() {
                return Err(StoreError::new(StoreErrorKind::AlreadyExists)
                    .with_backend(BACKEND)
                    .with_entity(format!("revision {}", id.0)));
            }
            tables.next_revision = tables.next_revision.max(id.0);
        }

        for alias in snapshot.aliases {
            if let Some(page) = alias.page
                && !tables.pages.contains_key(&page)
            {
                return Err(StoreError::page_not_found(page).with_backend(BACKEND));
            }
            tables.aliases.insert(alias.url.clone(), alias);
        }

        tracing::debug!(
            pages = tables.pages.len(),
            revisions = tables.revisions.len(),
            aliases = tables.aliases.len(),
            "Loaded memory store"
        );

        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Create a store from a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::Invalid`] if the JSON does not parse, or any
    /// error [`MemoryStore::from_snapshot`] reports.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let snapshot: StoreSnapshot = serde_json::from_str(json).map_err(|e| {
            StoreError::new(StoreErrorKind::Invalid)
                .with_backend(BACKEND)
                .with_entity("snapshot")
                .with_source(e)
        })?;
        Self::from_snapshot(snapshot)
    }

    /// Dump every record.
    ///
    /// Pages come out in tree order, revisions by identity and aliases by URL.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let tables = self.tables.read().unwrap();
        StoreSnapshot {
            pages: ordered_pages(&tables),
            revisions: tables.revisions.values().cloned().collect(),
            aliases: tables.aliases.values().cloned().collect(),
        }
    }
}

fn invalid(entity: &str) -> StoreError {
    StoreError::new(StoreErrorKind::Invalid)
        .with_backend(BACKEND)
        .with_entity(entity)
}

/// Validate a structural write against the current tables.
fn check_structure(
    tables: &Tables,
    change: &StructureChange,
    doomed: &HashSet<PageId>,
) -> Result<(), StoreError> {
    for expected in &change.expected {
        let stored = tables.pages.get(&expected.id).and_then(PageNode::tree_node);
        if stored.as_ref() != Some(expected) {
            return Err(StoreError::numbering_conflict(expected.id).with_backend(BACKEND));
        }
    }
    if let Some(missing) = change
        .positions
        .iter()
        .find(|node| doomed.contains(&node.id) || !tables.pages.contains_key(&node.id))
    {
        return Err(StoreError::page_not_found(missing.id).with_backend(BACKEND));
    }

    // Pages without numbering yet (left == 0) are still being inserted.
    let placed: HashSet<PageId> = change.positions.iter().map(|node| node.id).collect();
    let taken: HashSet<(u32, u32)> = tables
        .pages
        .iter()
        .filter(|(id, page)| {
            !placed.contains(id) && !doomed.contains(id) && page.position.left != 0
        })
        .map(|(_, page)| (page.position.tree_id, page.position.left))
        .collect();
    if let Some(clash) = change
        .positions
        .iter()
        .find(|node| taken.contains(&(node.position.tree_id, node.position.left)))
    {
        return Err(StoreError::numbering_conflict(clash.id).with_backend(BACKEND));
    }
    Ok(())
}

fn ordered_pages(tables: &Tables) -> Vec<PageNode> {
    let mut pages: Vec<PageNode> = tables.pages.values().cloned().collect();
    pages.sort_by_key(|page| (page.position.tree_id, page.position.left, page.id));
    pages
}

impl PageStore for MemoryStore {
    fn page(&self, id: PageId) -> Result<Option<PageNode>, StoreError> {
        let tables = self.tables.read().unwrap();
        Ok(tables.pages.get(&id).cloned())
    }

    fn pages(&self) -> Result<Vec<PageNode>, StoreError> {
        let tables = self.tables.read().unwrap();
        Ok(ordered_pages(&tables))
    }

    fn insert_page(&self, mut page: PageNode) -> Result<PageNode, StoreError> {
        let mut tables = self.tables.write().unwrap();
        let id = match page.id {
            Some(id) if tables.pages.contains_key(&id) => {
                return Err(StoreError::new(StoreErrorKind::AlreadyExists)
                    .with_backend(BACKEND)
                    .with_entity(format!("page {id}")));
            }
            Some(id) => {
                tables.next_page = tables.next_page.max(id.0);
                id
            }
            None => tables.allocate_page(),
        };
        page.id = Some(id);
        tables.pages.insert(id, page.clone());
        Ok(page)
    }

    fn update_page(&self, page: &PageNode) -> Result<(), StoreError> {
        let id = page.id.ok_or_else(|| invalid("page without identity"))?;
        let mut tables = self.tables.write().unwrap();
        let stored = tables
            .pages
            .get_mut(&id)
            .ok_or_else(|| StoreError::page_not_found(id).with_backend(BACKEND))?;

        let parent = stored.parent;
        let position = stored.position;
        *stored = page.clone();
        stored.parent = parent;
        stored.position = position;
        Ok(())
    }

    fn apply_structure(&self, change: &StructureChange) -> Result<(), StoreError> {
        let doomed: HashSet<PageId> = change.removed.iter().copied().collect();
        let mut tables = self.tables.write().unwrap();
        check_structure(&tables, change, &doomed)?;

        tables.pages.retain(|id, _| !doomed.contains(id));
        tables
            .revisions
            .retain(|_, revision| !doomed.contains(&revision.page));

        for page in tables.pages.values_mut() {
            if page.redirect_to.is_some_and(|target| doomed.contains(&target)) {
                page.redirect_to = None;
            }
        }
        for alias in tables.aliases.values_mut() {
            if alias.page.is_some_and(|target| doomed.contains(&target)) {
                alias.page = None;
            }
        }
        for node in &change.positions {
            if let Some(page) = tables.pages.get_mut(&node.id) {
                page.parent = node.parent;
                page.position = node.position;
            }
        }
        Ok(())
    }

    fn insert_revision(&self, revision: NewRevision) -> Result<ContentRevision, StoreError> {
        let mut tables = self.tables.write().unwrap();
        if !tables.pages.contains_key(&revision.key.page) {
            return Err(StoreError::page_not_found(revision.key.page).with_backend(BACKEND));
        }

        let id = tables.allocate_revision();
        let NewRevision {
            key,
            body,
            creation_date,
        } = revision;
        let stored = ContentRevision {
            id,
            page: key.page,
            language: key.language,
            content_type: key.content_type,
            body,
            creation_date,
        };
        tables.revisions.insert(id, stored.clone());
        Ok(stored)
    }

    fn latest_revision(
        &self,
        key: &ContentKey,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Option<ContentRevision>, StoreError> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .slot(key, cutoff)
            .max_by_key(|revision| (revision.creation_date, revision.id))
            .cloned())
    }

    fn revisions(&self, key: &ContentKey) -> Result<Vec<ContentRevision>, StoreError> {
        let tables = self.tables.read().unwrap();
        let mut revisions: Vec<ContentRevision> = tables.slot(key, None).cloned().collect();
        revisions.sort_by_key(|revision| (revision.creation_date, revision.id));
        Ok(revisions)
    }

    fn content_types(
        &self,
        page: PageId,
        language: &str,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.read().unwrap();
        let mut types: Vec<String> = tables
            .revisions
            .values()
            .filter(|revision| {
                revision.page == page
                    && revision.language == language
                    && cutoff.is_none_or(|cutoff| revision.creation_date <= cutoff)
            })
            .map(|revision| revision.content_type.clone())
            .collect();
        types.sort();
        types.dedup();
        Ok(types)
    }

    fn alias(&self, url: &str) -> Result<Option<UrlAlias>, StoreError> {
        let tables = self.tables.read().unwrap();
        Ok(tables.aliases.get(url).cloned())
    }

    fn upsert_alias(&self, alias: UrlAlias) -> Result<(), StoreError> {
        let mut tables = self.tables.write().unwrap();
        if let Some(page) = alias.page
            && !tables.pages.contains_key(&page)
        {
            return Err(StoreError::page_not_found(page).with_backend(BACKEND));
        }
        tables.aliases.insert(alias.url.clone(), alias);
        Ok(())
    }

    fn delete_alias(&self, url: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().unwrap();
        Ok(tables.aliases.remove(url).is_some())
    }
}
