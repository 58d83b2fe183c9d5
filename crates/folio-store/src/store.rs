//! Store trait and error types.
//!
//! Provides the [`PageStore`] trait for abstracting page, content and alias
//! persistence, along with [`StoreError`] for unified error handling across
//! backends.
//!
//! # Query contract
//!
//! The core only needs an ordered-record store:
//! - pages ordered by `(tree_id, left)`
//! - revisions looked up by slot, latest by `creation_date`, optionally capped
//!   by a cutoff (the page's freeze date)
//! - aliases looked up by their normalized URL

use chrono::{DateTime, Utc};
use folio_tree::{PageId, TreeNode};

use crate::record::{ContentKey, ContentRevision, NewRevision, PageNode, UrlAlias};

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorKind {
    /// Record does not exist.
    NotFound,
    /// Record already exists (for insert operations).
    AlreadyExists,
    /// Record is malformed or violates a store constraint.
    Invalid,
    /// Stored numbering changed since the caller read it.
    Conflict,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (not found, invalid record).
    #[default]
    Permanent,
    /// Retry immediately (lock contention, connection reset).
    Temporary,
}

/// Store error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StoreError {
    /// Semantic error category.
    pub kind: StoreErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Record context (e.g., "page 4").
    pub entity: Option<String>,
    /// Backend identifier (e.g., "Memory").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Create a new store error.
    #[must_use]
    pub fn new(kind: StoreErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            entity: None,
            backend: None,
            source: None,
        }
    }

    /// Attach record context.
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a conflict error for a page whose numbering moved under the
    /// caller. Worth retrying after re-reading the tree.
    #[must_use]
    pub fn numbering_conflict(id: PageId) -> Self {
        Self::new(StoreErrorKind::Conflict)
            .with_status(ErrorStatus::Temporary)
            .with_entity(format!("page {id}"))
    }

    /// Create a not found error for a page.
    #[must_use]
    pub fn page_not_found(id: PageId) -> Self {
        Self::new(StoreErrorKind::NotFound).with_entity(format!("page {id}"))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (page 4)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StoreErrorKind::NotFound => "Not found",
            StoreErrorKind::AlreadyExists => "Already exists",
            StoreErrorKind::Invalid => "Invalid record",
            StoreErrorKind::Conflict => "Conflict",
            StoreErrorKind::Unavailable => "Unavailable",
            StoreErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(entity) = &self.entity {
            write!(f, " ({entity})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// A structural write computed from a read of the stored tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructureChange {
    /// Parent links and numbering, as read, of every page the change touches.
    pub expected: Vec<TreeNode>,
    /// New parent links and numbering.
    pub positions: Vec<TreeNode>,
    /// Pages to delete.
    pub removed: Vec<PageId>,
}

impl StructureChange {
    /// Delete pages without touching anything else.
    #[must_use]
    pub fn removal(ids: &[PageId]) -> Self {
        Self {
            removed: ids.to_vec(),
            ..Self::default()
        }
    }
}

/// Persistence abstraction for pages, content revisions and aliases.
///
/// Implementations only execute queries; caching, invalidation and tree
/// maintenance belong to the caller. Absence is reported as `Ok(None)` or an
/// empty list, never as an error.
pub trait PageStore: Send + Sync {
    /// Look up a page by identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn page(&self, id: PageId) -> Result<Option<PageNode>, StoreError>;

    /// All pages ordered by `(tree_id, left)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn pages(&self) -> Result<Vec<PageNode>, StoreError>;

    /// Insert a page, assigning an identity when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with [`StoreErrorKind::AlreadyExists`] if the
    /// page already carries an identity that is taken.
    fn insert_page(&self, page: PageNode) -> Result<PageNode, StoreError>;

    /// Update the attributes of an existing page.
    ///
    /// The parent link and numbering are left as stored; structural changes
    /// go through [`PageStore::apply_structure`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with [`StoreErrorKind::NotFound`] if the page is
    /// unknown and [`StoreErrorKind::Invalid`] if it has no identity.
    fn update_page(&self, page: &PageNode) -> Result<(), StoreError>;

    /// Apply a structural write in one step: delete
    /// [`StructureChange::removed`] together with their revisions, then write
    /// [`StructureChange::positions`].
    ///
    /// Aliases and redirects pointing at a deleted page are cleared. Nothing
    /// is written unless every entry of [`StructureChange::expected`] still
    /// matches the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with [`StoreErrorKind::Conflict`] if an expected
    /// record changed or a new position is held by a page outside the change,
    /// and [`StoreErrorKind::NotFound`] if a positioned page is unknown or
    /// deleted by the same change.
    fn apply_structure(&self, change: &StructureChange) -> Result<(), StoreError>;

    /// Append a content revision.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] with [`StoreErrorKind::NotFound`] if the owning
    /// page is unknown.
    fn insert_revision(&self, revision: NewRevision) -> Result<ContentRevision, StoreError>;

    /// Latest revision of a slot, ignoring revisions created after `cutoff`.
    ///
    /// Among revisions with equal timestamps the later insert wins.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn latest_revision(
        &self,
        key: &ContentKey,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Option<ContentRevision>, StoreError>;

    /// Every revision of a slot, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn revisions(&self, key: &ContentKey) -> Result<Vec<ContentRevision>, StoreError>;

    /// Distinct content types a page has in a language, ignoring revisions
    /// created after `cutoff`. Sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn content_types(
        &self,
        page: PageId,
        language: &str,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<String>, StoreError>;

    /// Look up an alias by its normalized URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn alias(&self, url: &str) -> Result<Option<UrlAlias>, StoreError>;

    /// Insert or replace an alias keyed by its URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn upsert_alias(&self, alias: UrlAlias) -> Result<(), StoreError>;

    /// Remove an alias. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn delete_alias(&self, url: &str) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_new() {
        let err = StoreError::new(StoreErrorKind::NotFound);

        assert_eq!(err.kind, StoreErrorKind::NotFound);
        assert_eq!(err.status, ErrorStatus::Permanent);
        assert!(err.entity.is_none());
        assert!(err.backend.is_none());
    }

    #[test]
    fn test_store_error_with_status() {
        let err = StoreError::new(StoreErrorKind::Unavailable).with_status(ErrorStatus::Temporary);

        assert_eq!(err.status, ErrorStatus::Temporary);
    }

    #[test]
    fn test_store_error_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad json");
        let err = StoreError::new(StoreErrorKind::Invalid).with_source(io_err);

        assert!(err.downcast_source::<std::io::Error>().is_some());
    }

    #[test]
    fn test_page_not_found() {
        let err = StoreError::page_not_found(PageId(4));

        assert_eq!(err.kind, StoreErrorKind::NotFound);
        assert_eq!(err.entity.as_deref(), Some("page 4"));
    }

    #[test]
    fn test_numbering_conflict_is_temporary() {
        let err = StoreError::numbering_conflict(PageId(2));

        assert_eq!(err.kind, StoreErrorKind::Conflict);
        assert_eq!(err.status, ErrorStatus::Temporary);
        assert_eq!(err.to_string(), "Conflict (page 2)");
    }

    #[test]
    fn test_store_error_display_simple() {
        let err = StoreError::new(StoreErrorKind::NotFound);

        assert_eq!(err.to_string(), "Not found");
    }

    #[test]
    fn test_store_error_display_full() {
        let io_err = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad json");
        let err = StoreError::new(StoreErrorKind::Invalid)
            .with_backend("Memory")
            .with_entity("snapshot")
            .with_source(io_err);

        assert_eq!(err.to_string(), "[Memory] Invalid record: bad json (snapshot)");
    }

    #[test]
    fn test_store_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StoreError>();
    }

    #[test]
    fn test_error_status_default() {
        assert_eq!(ErrorStatus::default(), ErrorStatus::Permanent);
    }
}
