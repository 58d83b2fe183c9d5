use folio_store::{PageId, StoreError};
use folio_tree::TreeError;

/// Error returned by [`Pages`](crate::Pages) operations.
///
/// Absence is never an error: lookups of missing pages, revisions or aliases
/// return `None`.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// A mutation names a page that does not exist.
    #[error("Page not found: {0}")]
    NotFound(PageId),
    /// The operation needs an identity the page does not have yet.
    #[error("Invalid page state: {0}")]
    InvalidState(String),
    /// A structural mutation was rejected; forest and store are untouched.
    #[error("Tree conflict: {0}")]
    Conflict(#[from] TreeError),
    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PageError {
    /// Map a tree error, reporting unknown nodes as missing pages.
    pub(crate) fn from_tree(err: TreeError) -> Self {
        match err {
            TreeError::UnknownNode(id) => Self::NotFound(id),
            other => Self::Conflict(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_node_becomes_not_found() {
        let err = PageError::from_tree(TreeError::UnknownNode(PageId(3)));

        assert!(matches!(err, PageError::NotFound(PageId(3))));
    }

    #[test]
    fn test_other_tree_errors_are_conflicts() {
        let err = PageError::from_tree(TreeError::MoveIntoSelf(PageId(3)));

        assert!(matches!(err, PageError::Conflict(TreeError::MoveIntoSelf(_))));
        assert_eq!(
            err.to_string(),
            "Tree conflict: Cannot move node 3 relative to itself"
        );
    }
}
