//! Nested-set page forest for Folio.
//!
//! This crate provides the tree index that every other Folio crate builds on:
//!
//! - [`Forest`]: an ordered forest of pages encoded as nested intervals
//! - [`Placement`] / [`RemoveMode`]: how structural edits position nodes
//! - [`next_in_book`] / [`previous_in_book`]: document-order navigation
//!
//! # Nested-set encoding
//!
//! Every node holds a [`TreePosition`]: the id of the tree it belongs to, a
//! `left`/`right` interval and its depth. A node's interval strictly contains
//! the intervals of all its descendants, so ancestor and descendant queries
//! are range reads over the numbering:
//!
//! ```text
//! tree 1:  home [1, 8]
//!          +-- about [2, 5]
//!          |   +-- team [3, 4]
//!          +-- blog [6, 7]
//! ```
//!
//! # Example
//!
//! ```
//! use folio_tree::{Forest, PageId, Placement, next_in_book};
//!
//! let mut forest = Forest::new();
//! forest.insert(PageId(1), Placement::Root).unwrap();
//! forest.insert(PageId(2), Placement::LastChildOf(PageId(1))).unwrap();
//!
//! assert_eq!(forest.ancestors(PageId(2), true), vec![PageId(1)]);
//! assert_eq!(next_in_book(&forest, PageId(1)), Some(PageId(2)));
//! ```

mod book;
mod edit;
mod forest;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use book::{next_in_book, previous_in_book};
pub use edit::{Placement, RemoveMode, Removal};
pub use forest::Forest;

/// Identity of a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order descriptor of a node inside the forest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreePosition {
    /// Tree the node belongs to. Roots are ordered by ascending tree id.
    pub tree_id: u32,
    /// Left bound of the node's interval.
    pub left: u32,
    /// Right bound of the node's interval.
    pub right: u32,
    /// Depth of the node; roots are at level 0.
    pub level: u32,
}

impl TreePosition {
    /// True if `other` lies strictly inside this interval of the same tree.
    #[must_use]
    pub fn contains(&self, other: &TreePosition) -> bool {
        self.tree_id == other.tree_id && self.left < other.left && other.right < self.right
    }

    /// Number of descendants encoded by the interval width.
    #[must_use]
    pub fn descendant_count(&self) -> u32 {
        (self.right - self.left - 1) / 2
    }

    /// True if the interval has no room for descendants.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.right == self.left + 1
    }
}

/// A node as persisted by a store: identity, parent link and numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Node identity.
    pub id: PageId,
    /// Parent node, `None` for roots.
    pub parent: Option<PageId>,
    /// Nested-set numbering.
    pub position: TreePosition,
}

/// Error returned when a structural operation would break the forest.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Node is not part of the forest.
    #[error("Unknown node: {0}")]
    UnknownNode(PageId),
    /// Node is already part of the forest.
    #[error("Node already exists: {0}")]
    DuplicateNode(PageId),
    /// Node would be placed relative to itself.
    #[error("Cannot move node {0} relative to itself")]
    MoveIntoSelf(PageId),
    /// Node would be placed under one of its own descendants.
    #[error("Cannot move node {node} under its descendant {target}")]
    MoveIntoDescendant {
        /// Node being moved.
        node: PageId,
        /// Descendant chosen as the new anchor.
        target: PageId,
    },
    /// Persisted numbering disagrees with the parent links.
    #[error("Corrupted numbering at node {id}: {reason}")]
    Corrupted {
        /// First node found inconsistent.
        id: PageId,
        /// Description of the inconsistency.
        reason: String,
    },
}
