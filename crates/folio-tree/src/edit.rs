//! Structural edits on a [`Forest`].
//!
//! Each edit validates everything it needs before touching the forest, so an
//! error always leaves the forest exactly as it was. After a successful edit
//! the whole forest is renumbered and the nodes whose parent or numbering
//! changed are returned for persistence.

use std::collections::HashMap;

use crate::forest::Forest;
use crate::{PageId, TreeError, TreeNode, TreePosition};

/// Where a node goes in the forest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Root of a new tree after all existing trees.
    Root,
    /// First child of the given node.
    FirstChildOf(PageId),
    /// Last child of the given node.
    LastChildOf(PageId),
    /// Sibling immediately before the given node.
    Before(PageId),
    /// Sibling immediately after the given node.
    After(PageId),
}

impl Placement {
    /// Node the placement is relative to.
    #[must_use]
    pub fn anchor(self) -> Option<PageId> {
        match self {
            Self::Root => None,
            Self::FirstChildOf(id)
            | Self::LastChildOf(id)
            | Self::Before(id)
            | Self::After(id) => Some(id),
        }
    }
}

/// What happens to the children of a removed node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemoveMode {
    /// Remove the whole subtree.
    #[default]
    Cascade,
    /// Splice the children into the removed node's place.
    ReparentChildren,
}

/// Outcome of [`Forest::remove`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Removal {
    /// Nodes no longer in the forest, removed node first.
    pub removed: Vec<PageId>,
    /// Remaining nodes whose parent or numbering changed.
    pub changed: Vec<TreeNode>,
}

/// Parent links and numbering before an edit, used to report changes.
struct Before {
    parents: HashMap<PageId, Option<PageId>>,
    positions: HashMap<PageId, TreePosition>,
}

impl Forest {
    /// Add a new node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateNode`] if `id` is already present and
    /// [`TreeError::UnknownNode`] if the placement anchor is missing.
    pub fn insert(&mut self, id: PageId, placement: Placement) -> Result<Vec<TreeNode>, TreeError> {
        if self.contains(id) {
            return Err(TreeError::DuplicateNode(id));
        }
        if let Some(anchor) = placement.anchor()
            && !self.contains(anchor)
        {
            return Err(TreeError::UnknownNode(anchor));
        }

        let before = self.before();
        self.parents.insert(id, None);
        self.children.insert(id, Vec::new());
        self.attach(id, placement);
        self.renumber();

        let changed = self.changes_since(&before);
        tracing::debug!(%id, ?placement, changed = changed.len(), "Inserted node");
        Ok(changed)
    }

    /// Move a node together with its subtree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if the node or anchor is missing,
    /// [`TreeError::MoveIntoSelf`] if the anchor is the node itself and
    /// [`TreeError::MoveIntoDescendant`] if the anchor lies in its subtree.
    pub fn move_node(
        &mut self,
        id: PageId,
        placement: Placement,
    ) -> Result<Vec<TreeNode>, TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        if let Some(anchor) = placement.anchor() {
            if !self.contains(anchor) {
                return Err(TreeError::UnknownNode(anchor));
            }
            if anchor == id {
                return Err(TreeError::MoveIntoSelf(id));
            }
            if self.is_descendant_of(anchor, id) {
                return Err(TreeError::MoveIntoDescendant {
                    node: id,
                    target: anchor,
                });
            }
        }

        let before = self.before();
        self.detach(id);
        self.attach(id, placement);
        self.renumber();

        let changed = self.changes_since(&before);
        tracing::debug!(%id, ?placement, changed = changed.len(), "Moved node");
        Ok(changed)
    }

    /// Remove a node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if the node is missing.
    pub fn remove(&mut self, id: PageId, mode: RemoveMode) -> Result<Removal, TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }

        let before = self.before();
        let removed = match mode {
            RemoveMode::Cascade => {
                let mut removed = vec![id];
                removed.extend(self.descendants(id));
                self.detach(id);
                for gone in &removed {
                    self.parents.remove(gone);
                    self.children.remove(gone);
                }
                removed
            }
            RemoveMode::ReparentChildren => {
                let parent = self.parent(id);
                let orphans = self.children.remove(&id).unwrap_or_default();
                let siblings = self.sibling_list_mut(parent);
                if let Some(index) = siblings.iter().position(|&s| s == id) {
                    siblings.remove(index);
                    for (offset, &orphan) in orphans.iter().enumerate() {
                        siblings.insert(index + offset, orphan);
                    }
                }
                for orphan in orphans {
                    self.parents.insert(orphan, parent);
                }
                self.parents.remove(&id);
                vec![id]
            }
        };
        self.renumber();

        let changed = self.changes_since(&before);
        tracing::debug!(%id, ?mode, removed = removed.len(), changed = changed.len(), "Removed node");
        Ok(Removal { removed, changed })
    }

    fn before(&self) -> Before {
        Before {
            parents: self.parents.clone(),
            positions: self.numbering.positions.clone(),
        }
    }

    fn changes_since(&self, before: &Before) -> Vec<TreeNode> {
        self.nodes()
            .into_iter()
            .filter(|node| {
                before.positions.get(&node.id) != Some(&node.position)
                    || before.parents.get(&node.id) != Some(&node.parent)
            })
            .collect()
    }

    fn sibling_list_mut(&mut self, parent: Option<PageId>) -> &mut Vec<PageId> {
        match parent {
            Some(parent) => self.children.entry(parent).or_default(),
            None => &mut self.roots,
        }
    }

    fn detach(&mut self, id: PageId) {
        let parent = self.parent(id);
        self.sibling_list_mut(parent).retain(|&s| s != id);
        self.parents.insert(id, None);
    }

    /// Link a detached node into its new sibling list. Anchors are validated.
    fn attach(&mut self, id: PageId, placement: Placement) {
        let (parent, index) = match placement {
            Placement::Root => (None, None),
            Placement::FirstChildOf(parent) => (Some(parent), Some(0)),
            Placement::LastChildOf(parent) => (Some(parent), None),
            Placement::Before(anchor) | Placement::After(anchor) => {
                let parent = self.parent(anchor);
                let offset = usize::from(matches!(placement, Placement::After(_)));
                let index = self
                    .sibling_list_mut(parent)
                    .iter()
                    .position(|&s| s == anchor)
                    .map(|i| i + offset);
                (parent, index)
            }
        };

        let siblings = self.sibling_list_mut(parent);
        match index {
            Some(index) if index <= siblings.len() => siblings.insert(index, id),
            _ => siblings.push(id),
        }
        self.parents.insert(id, parent);
    }
}
