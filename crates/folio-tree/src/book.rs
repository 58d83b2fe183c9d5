//! Book traversal: reading a tree front to back like a table of contents.
//!
//! Both directions stay inside the tree of the starting node; neither ever
//! steps from one root to the next.

use crate::PageId;
use crate::forest::Forest;

/// Next node in prefix depth-first order within the same tree.
///
/// Returns the first child if there is one, otherwise the next sibling,
/// otherwise the next sibling of the nearest ancestor below the tree root.
#[must_use]
pub fn next_in_book(forest: &Forest, id: PageId) -> Option<PageId> {
    if let Some(&first) = forest.children(id).first() {
        return Some(first);
    }
    // A root's siblings live in other trees.
    if forest.is_root(id) {
        return None;
    }
    if let Some(next) = forest.next_sibling(id) {
        return Some(next);
    }

    let ancestors = forest.ancestors(id, true);
    let below_root = ancestors.len().saturating_sub(1);
    ancestors
        .into_iter()
        .take(below_root)
        .find_map(|ancestor| forest.next_sibling(ancestor))
}

/// Previous node in prefix depth-first order within the same tree.
///
/// Returns the last descendant of the previous sibling (or the sibling
/// itself when it has none), otherwise the parent. Tree roots have no
/// previous node.
#[must_use]
pub fn previous_in_book(forest: &Forest, id: PageId) -> Option<PageId> {
    if !forest.contains(id) || forest.is_root(id) {
        return None;
    }
    match forest.previous_sibling(id) {
        Some(sibling) => Some(forest.last_descendant(sibling).unwrap_or(sibling)),
        None => forest.parent(id),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Placement;

    /// 1 -> [2 -> [3 -> [4]], 5]; 6 -> [7]; 8
    fn book() -> Forest {
        let mut forest = Forest::new();
        forest.insert(PageId(1), Placement::Root).unwrap();
        for (id, parent) in [(2, 1), (3, 2), (4, 3), (5, 1)] {
            forest
                .insert(PageId(id), Placement::LastChildOf(PageId(parent)))
                .unwrap();
        }
        forest.insert(PageId(6), Placement::Root).unwrap();
        forest
            .insert(PageId(7), Placement::LastChildOf(PageId(6)))
            .unwrap();
        forest.insert(PageId(8), Placement::Root).unwrap();
        forest
    }

    fn walk_forward(forest: &Forest, start: PageId) -> Vec<PageId> {
        let mut order = vec![start];
        let mut current = start;
        while let Some(next) = next_in_book(forest, current) {
            order.push(next);
            current = next;
        }
        order
    }

    #[test]
    fn test_forward_walk_is_prefix_order() {
        let forest = book();

        assert_eq!(
            walk_forward(&forest, PageId(1)),
            vec![PageId(1), PageId(2), PageId(3), PageId(4), PageId(5)]
        );
    }

    #[test]
    fn test_forward_walk_stops_at_tree_end() {
        let forest = book();

        assert_eq!(next_in_book(&forest, PageId(5)), None);
        assert_eq!(next_in_book(&forest, PageId(7)), None);
        assert_eq!(next_in_book(&forest, PageId(8)), None);
    }

    #[test]
    fn test_next_climbs_to_ancestor_sibling() {
        let forest = book();

        assert_eq!(next_in_book(&forest, PageId(4)), Some(PageId(5)));
    }

    #[test]
    fn test_previous_descends_into_sibling() {
        let forest = book();

        assert_eq!(previous_in_book(&forest, PageId(5)), Some(PageId(4)));
        assert_eq!(previous_in_book(&forest, PageId(2)), Some(PageId(1)));
        assert_eq!(previous_in_book(&forest, PageId(1)), None);
        assert_eq!(previous_in_book(&forest, PageId(6)), None);
        assert_eq!(previous_in_book(&forest, PageId(99)), None);
    }

    #[test]
    fn test_previous_inverts_next_everywhere() {
        let forest = book();

        for id in forest.iter() {
            if let Some(next) = next_in_book(&forest, id) {
                assert_eq!(previous_in_book(&forest, next), Some(id), "from {id}");
                assert_eq!(forest.root_of(next), forest.root_of(id));
            }
        }
    }

    #[test]
    fn test_unknown_node_has_no_neighbours() {
        let forest = book();

        assert_eq!(next_in_book(&forest, PageId(99)), None);
    }
}
