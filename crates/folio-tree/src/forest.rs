//! Nested-set forest index.
//!
//! The forest keeps two views of the same structure:
//!
//! - the ordered sibling lists (`roots` and `children`) which structural edits
//!   operate on
//! - the derived numbering (`positions`, `by_left`, `by_right`) which every
//!   read query uses
//!
//! The numbering is recomputed from the sibling lists after each edit, so the
//! two views never disagree once an edit returns.

use std::collections::{BTreeMap, HashMap};

use crate::{PageId, TreeError, TreeNode, TreePosition};

/// Derived nested-set numbering of a forest.
#[derive(Clone, Debug, Default)]
pub(crate) struct Numbering {
    pub(crate) positions: HashMap<PageId, TreePosition>,
    by_left: BTreeMap<(u32, u32), PageId>,
    by_right: HashMap<(u32, u32), PageId>,
}

impl Numbering {
    fn record(&mut self, id: PageId, position: TreePosition) {
        self.positions.insert(id, position);
        self.by_left.insert((position.tree_id, position.left), id);
        self.by_right.insert((position.tree_id, position.right), id);
    }
}

/// Ordered forest of pages with nested-set numbering.
///
/// Read queries are range lookups over the numbering and never allocate more
/// than their result. Structural edits live in [`crate::Placement`] based
/// methods (`insert`, `move_node`, `remove`) and renumber the whole forest.
///
/// The forest is a plain value: to publish edits atomically, clone it, edit
/// the clone and swap it in.
#[derive(Clone, Debug, Default)]
pub struct Forest {
    pub(crate) roots: Vec<PageId>,
    pub(crate) children: HashMap<PageId, Vec<PageId>>,
    pub(crate) parents: HashMap<PageId, Option<PageId>>,
    pub(crate) numbering: Numbering,
}

fn corrupted(id: PageId, reason: impl Into<String>) -> TreeError {
    TreeError::Corrupted {
        id,
        reason: reason.into(),
    }
}

impl Forest {
    /// Create an empty forest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a forest from persisted nodes.
    ///
    /// Nodes may come in any order. The numbering stored on each node must
    /// agree with the parent links: every node's interval must sit inside its
    /// parent's, siblings must follow each other without gaps and every tree
    /// must start at `left == 1`. Tree ids only need to order the roots; they
    /// are compacted to `1..=n` in the rebuilt forest.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateNode`] if an id appears twice and
    /// [`TreeError::Corrupted`] if the numbering disagrees with the parent links.
    pub fn from_nodes(nodes: impl IntoIterator<Item = TreeNode>) -> Result<Self, TreeError> {
        let mut nodes: Vec<TreeNode> = nodes.into_iter().collect();
        nodes.sort_by_key(|n| (n.position.tree_id, n.position.left));

        let mut forest = Self::new();
        let mut stored: HashMap<PageId, TreePosition> = HashMap::with_capacity(nodes.len());

        for node in &nodes {
            if stored.contains_key(&node.id) {
                return Err(TreeError::DuplicateNode(node.id));
            }
            if node.position.left >= node.position.right {
                return Err(corrupted(node.id, "left bound is not below right bound"));
            }

            match node.parent {
                None => forest.roots.push(node.id),
                Some(parent) => {
                    let Some(parent_position) = stored.get(&parent) else {
                        return Err(corrupted(
                            node.id,
                            format!("parent {parent} does not enclose the node"),
                        ));
                    };
                    if !parent_position.contains(&node.position) {
                        return Err(corrupted(
                            node.id,
                            format!("interval lies outside parent {parent}"),
                        ));
                    }
                    forest.children.entry(parent).or_default().push(node.id);
                }
            }

            stored.insert(node.id, node.position);
            forest.parents.insert(node.id, node.parent);
            forest.children.entry(node.id).or_default();
        }

        forest.renumber();

        for node in &nodes {
            let Some(actual) = forest.position(node.id) else {
                return Err(corrupted(node.id, "node lost while renumbering"));
            };
            let expected = node.position;
            if (actual.left, actual.right, actual.level)
                != (expected.left, expected.right, expected.level)
            {
                return Err(corrupted(
                    node.id,
                    format!(
                        "stored [{}, {}] level {} but structure implies [{}, {}] level {}",
                        expected.left,
                        expected.right,
                        expected.level,
                        actual.left,
                        actual.right,
                        actual.level
                    ),
                ));
            }
        }

        tracing::debug!(nodes = forest.len(), trees = forest.roots.len(), "Loaded forest");
        Ok(forest)
    }

    /// Recompute the numbering from the sibling lists.
    ///
    /// Roots get tree ids `1..=n` in list order; each tree is numbered by a
    /// pre/post-order walk starting at `left == 1`.
    pub(crate) fn renumber(&mut self) {
        fn number(
            id: PageId,
            tree_id: u32,
            level: u32,
            counter: &mut u32,
            children: &HashMap<PageId, Vec<PageId>>,
            numbering: &mut Numbering,
        ) {
            let left = *counter;
            *counter += 1;
            if let Some(kids) = children.get(&id) {
                for &child in kids {
                    number(child, tree_id, level + 1, counter, children, numbering);
                }
            }
            let right = *counter;
            *counter += 1;
            numbering.record(
                id,
                TreePosition {
                    tree_id,
                    left,
                    right,
                    level,
                },
            );
        }

        let mut numbering = Numbering::default();
        for (tree_id, &root) in (1u32..).zip(self.roots.iter()) {
            let mut counter = 1;
            number(root, tree_id, 0, &mut counter, &self.children, &mut numbering);
        }
        self.numbering = numbering;
    }

    /// Number of nodes in the forest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// True if the forest holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// True if `id` is part of the forest.
    #[must_use]
    pub fn contains(&self, id: PageId) -> bool {
        self.parents.contains_key(&id)
    }

    /// Numbering of a node.
    #[must_use]
    pub fn position(&self, id: PageId) -> Option<TreePosition> {
        self.numbering.positions.get(&id).copied()
    }

    /// Parent of a node, `None` for roots and unknown nodes.
    #[must_use]
    pub fn parent(&self, id: PageId) -> Option<PageId> {
        self.parents.get(&id).copied().flatten()
    }

    /// True if `id` is a known node without a parent.
    #[must_use]
    pub fn is_root(&self, id: PageId) -> bool {
        matches!(self.parents.get(&id), Some(None))
    }

    /// Roots in tree order.
    #[must_use]
    pub fn roots(&self) -> &[PageId] {
        &self.roots
    }

    /// The root of the first tree.
    #[must_use]
    pub fn first_root(&self) -> Option<PageId> {
        self.roots.first().copied()
    }

    /// Root of the tree containing `id`.
    #[must_use]
    pub fn root_of(&self, id: PageId) -> Option<PageId> {
        let position = self.position(id)?;
        self.numbering
            .by_left
            .get(&(position.tree_id, 1))
            .copied()
    }

    /// Ancestors of a node.
    ///
    /// With `ascending == false` the root comes first; with `ascending == true`
    /// the parent comes first and the root last.
    #[must_use]
    pub fn ancestors(&self, id: PageId, ascending: bool) -> Vec<PageId> {
        let Some(position) = self.position(id) else {
            return Vec::new();
        };

        let mut ancestors: Vec<PageId> = self
            .numbering
            .by_left
            .range((position.tree_id, 0)..(position.tree_id, position.left))
            .filter(|(_, candidate)| {
                self.position(**candidate)
                    .is_some_and(|p| p.right > position.right)
            })
            .map(|(_, &candidate)| candidate)
            .collect();

        if ascending {
            ancestors.reverse();
        }
        ancestors
    }

    /// Descendants of a node in document order.
    #[must_use]
    pub fn descendants(&self, id: PageId) -> Vec<PageId> {
        let Some(position) = self.position(id) else {
            return Vec::new();
        };
        self.numbering
            .by_left
            .range((position.tree_id, position.left + 1)..(position.tree_id, position.right))
            .map(|(_, &d)| d)
            .collect()
    }

    /// Number of descendants of a node.
    #[must_use]
    pub fn descendant_count(&self, id: PageId) -> usize {
        self.position(id)
            .map_or(0, |p| p.descendant_count() as usize)
    }

    /// Last descendant of a node in document order.
    #[must_use]
    pub fn last_descendant(&self, id: PageId) -> Option<PageId> {
        let position = self.position(id)?;
        self.numbering
            .by_left
            .range((position.tree_id, position.left + 1)..(position.tree_id, position.right))
            .next_back()
            .map(|(_, &d)| d)
    }

    /// Descendants without children of their own.
    #[must_use]
    pub fn leaf_nodes(&self, id: PageId) -> Vec<PageId> {
        self.descendants(id)
            .into_iter()
            .filter(|&d| self.position(d).is_some_and(|p| p.is_leaf()))
            .collect()
    }

    /// Direct children in sibling order.
    #[must_use]
    pub fn children(&self, id: PageId) -> &[PageId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Nodes sharing the parent of `id`. Roots are siblings of each other.
    #[must_use]
    pub fn siblings(&self, id: PageId, include_self: bool) -> Vec<PageId> {
        let Some(&parent) = self.parents.get(&id) else {
            return Vec::new();
        };
        let list = match parent {
            Some(parent) => self.children(parent),
            None => self.roots(),
        };
        list.iter()
            .copied()
            .filter(|&s| include_self || s != id)
            .collect()
    }

    /// Sibling immediately after `id`.
    #[must_use]
    pub fn next_sibling(&self, id: PageId) -> Option<PageId> {
        let position = self.position(id)?;
        if self.is_root(id) {
            return self.roots.get(position.tree_id as usize).copied();
        }
        self.numbering
            .by_left
            .get(&(position.tree_id, position.right + 1))
            .copied()
    }

    /// Sibling immediately before `id`.
    #[must_use]
    pub fn previous_sibling(&self, id: PageId) -> Option<PageId> {
        let position = self.position(id)?;
        if self.is_root(id) {
            let index = (position.tree_id as usize).checked_sub(2)?;
            return self.roots.get(index).copied();
        }
        self.numbering
            .by_right
            .get(&(position.tree_id, position.left - 1))
            .copied()
    }

    /// True if `id` lies strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, id: PageId, ancestor: PageId) -> bool {
        match (self.position(ancestor), self.position(id)) {
            (Some(outer), Some(inner)) => outer.contains(&inner),
            _ => false,
        }
    }

    /// All node ids in document order, tree by tree.
    pub fn iter(&self) -> impl Iterator<Item = PageId> + '_ {
        self.numbering.by_left.values().copied()
    }

    /// All nodes with parent links and numbering, in document order.
    #[must_use]
    pub fn nodes(&self) -> Vec<TreeNode> {
        self.iter()
            .filter_map(|id| {
                Some(TreeNode {
                    id,
                    parent: self.parent(id),
                    position: self.position(id)?,
                })
            })
            .collect()
    }

    /// Check the nested-set invariants of the whole forest.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Corrupted`] naming the first offending node.
    pub fn verify(&self) -> Result<(), TreeError> {
        for node in self.nodes() {
            let position = node.position;
            if position.left >= position.right {
                return Err(corrupted(node.id, "left bound is not below right bound"));
            }
            match node.parent {
                None if position.left != 1 || position.level != 0 => {
                    return Err(corrupted(node.id, "root does not open its tree"));
                }
                None => {}
                Some(parent) => {
                    let Some(outer) = self.position(parent) else {
                        return Err(corrupted(node.id, format!("parent {parent} is missing")));
                    };
                    if !outer.contains(&position) || outer.level + 1 != position.level {
                        return Err(corrupted(
                            node.id,
                            format!("interval is not nested in parent {parent}"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
