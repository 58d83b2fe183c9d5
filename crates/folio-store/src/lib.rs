//! Persistence layer for the Folio page tree.
//!
//! This crate defines the records Folio keeps (pages, content revisions and
//! URL aliases) and a [`PageStore`] trait that abstracts where they live. The
//! page service in `folio-pages` only talks to the trait, which keeps the
//! tree, caching and publication logic independent of the backend.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`PageNode`], [`ContentRevision`] and [`UrlAlias`] records
//! - [`PageStore`] trait with page, revision and alias queries
//! - [`MemoryStore`] implementation, seeded from a JSON [`StoreSnapshot`]
//!
//! # Example
//!
//! ```ignore
//! use folio_store::{ContentKey, MemoryStore, PageStore};
//!
//! let store = MemoryStore::from_json(&std::fs::read_to_string("pages.json")?)?;
//! for page in store.pages()? {
//!     println!("{:?} at level {}", page.id, page.position.level);
//! }
//! ```

mod memory;
mod record;
mod store;

pub use folio_tree::{PageId, TreeNode, TreePosition};
pub use memory::{MemoryStore, StoreSnapshot};
pub use record::{
    ContentKey, ContentRevision, NewRevision, PageNode, PageStatus, RevisionId, UrlAlias,
};
pub use store::{ErrorStatus, PageStore, StoreError, StoreErrorKind, StructureChange};
