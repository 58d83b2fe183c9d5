//! Persisted records: pages, content revisions and URL aliases.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use folio_tree::{PageId, TreeNode, TreePosition};
use serde::{Deserialize, Serialize};

/// Stored publication status of a page.
///
/// The status actually shown to visitors also depends on the publication
/// window; see the publication policy in `folio-pages`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Work in progress, never visible.
    #[default]
    Draft,
    /// Visible and listed.
    Published,
    /// Past its publication window.
    Expired,
    /// Visible by direct link but excluded from listings.
    Hidden,
}

/// A page node: status, dates, template and its place in the forest.
///
/// Content lives in [`ContentRevision`] records owned by the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNode {
    /// Identity, assigned by the store on first insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PageId>,
    /// Parent page, `None` for roots.
    #[serde(default)]
    pub parent: Option<PageId>,
    /// Nested-set numbering, maintained by the forest.
    #[serde(default)]
    pub position: TreePosition,
    /// When the page was created.
    pub creation_date: DateTime<Utc>,
    /// When the page should go live.
    #[serde(default)]
    pub publication_date: Option<DateTime<Utc>>,
    /// When the page expires. `None` never expires.
    #[serde(default)]
    pub publication_end_date: Option<DateTime<Utc>>,
    /// Content created after this instant is ignored.
    #[serde(default)]
    pub freeze_date: Option<DateTime<Utc>>,
    /// Stamped on every save.
    pub last_modification_date: DateTime<Utc>,
    /// Stored status.
    #[serde(default)]
    pub status: PageStatus,
    /// Template identifier. `None` inherits from the nearest ancestor.
    #[serde(default)]
    pub template: Option<String>,
    /// Page to redirect visitors to.
    #[serde(default)]
    pub redirect_to: Option<PageId>,
    /// URL to redirect visitors to.
    #[serde(default)]
    pub redirect_to_url: Option<String>,
    /// Sites the page is reachable on.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub sites: BTreeSet<u32>,
}

impl PageNode {
    /// Create an unsaved draft page stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::created_at(Utc::now())
    }

    /// Create an unsaved draft page with an explicit creation time.
    #[must_use]
    pub fn created_at(now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            parent: None,
            position: TreePosition::default(),
            creation_date: now,
            publication_date: None,
            publication_end_date: None,
            freeze_date: None,
            last_modification_date: now,
            status: PageStatus::Draft,
            template: None,
            redirect_to: None,
            redirect_to_url: None,
            sites: BTreeSet::new(),
        }
    }

    /// Set the parent page.
    #[must_use]
    pub fn with_parent(mut self, parent: PageId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the stored status.
    #[must_use]
    pub fn with_status(mut self, status: PageStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the template identifier.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the publication date.
    #[must_use]
    pub fn with_publication_date(mut self, date: DateTime<Utc>) -> Self {
        self.publication_date = Some(date);
        self
    }

    /// Set the publication end date.
    #[must_use]
    pub fn with_publication_end_date(mut self, date: DateTime<Utc>) -> Self {
        self.publication_end_date = Some(date);
        self
    }

    /// Set the freeze date.
    #[must_use]
    pub fn with_freeze_date(mut self, date: DateTime<Utc>) -> Self {
        self.freeze_date = Some(date);
        self
    }

    /// Tree view of the page, if it has an identity.
    #[must_use]
    pub fn tree_node(&self) -> Option<TreeNode> {
        Some(TreeNode {
            id: self.id?,
            parent: self.parent,
            position: self.position,
        })
    }
}

impl Default for PageNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Address of a content slot: page, language and content type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentKey {
    /// Owning page.
    pub page: PageId,
    /// Language code (e.g. "en", "pt-br").
    pub language: String,
    /// Content type, i.e. the placeholder name (e.g. "title", "body").
    pub content_type: String,
}

impl ContentKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(page: PageId, language: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            page,
            language: language.into(),
            content_type: content_type.into(),
        }
    }
}

/// Identity of a content revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(pub u64);

/// One immutable, timestamped body of content.
///
/// Edits never update a revision; they insert a new one. The current value of
/// a slot is the revision with the latest `creation_date`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRevision {
    /// Store-assigned identity; also orders revisions with equal timestamps.
    pub id: RevisionId,
    /// Owning page.
    pub page: PageId,
    /// Language code.
    pub language: String,
    /// Content type.
    pub content_type: String,
    /// Content body.
    pub body: String,
    /// When the revision was written.
    pub creation_date: DateTime<Utc>,
}

impl ContentRevision {
    /// Slot this revision belongs to.
    #[must_use]
    pub fn key(&self) -> ContentKey {
        ContentKey::new(self.page, self.language.clone(), self.content_type.clone())
    }
}

/// A revision about to be inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRevision {
    /// Slot to write.
    pub key: ContentKey,
    /// Content body.
    pub body: String,
    /// Creation timestamp.
    pub creation_date: DateTime<Utc>,
}

/// Legacy or alternative URL mapped to a page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlAlias {
    /// Normalized URL, unique across aliases.
    pub url: String,
    /// Target page, `None` when the target was deleted.
    #[serde(default)]
    pub page: Option<PageId>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_new_page_is_unsaved_draft() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let page = PageNode::created_at(now);

        assert_eq!(page.id, None);
        assert_eq!(page.status, PageStatus::Draft);
        assert_eq!(page.last_modification_date, now);
        assert!(page.tree_node().is_none());
    }

    #[test]
    fn test_page_builders() {
        let page = PageNode::new()
            .with_parent(PageId(3))
            .with_status(PageStatus::Hidden)
            .with_template("pages/two-columns.html");

        assert_eq!(page.parent, Some(PageId(3)));
        assert_eq!(page.status, PageStatus::Hidden);
        assert_eq!(page.template.as_deref(), Some("pages/two-columns.html"));
    }

    #[test]
    fn test_page_status_serializes_lowercase() {
        let json = serde_json::to_string(&PageStatus::Published).unwrap();

        assert_eq!(json, "\"published\"");
    }

    #[test]
    fn test_page_deserializes_with_defaults() {
        let json = r#"{
            "id": 7,
            "creation_date": "2024-01-01T00:00:00Z",
            "last_modification_date": "2024-01-02T00:00:00Z"
        }"#;

        let page: PageNode = serde_json::from_str(json).unwrap();

        assert_eq!(page.id, Some(PageId(7)));
        assert_eq!(page.status, PageStatus::Draft);
        assert_eq!(page.parent, None);
        assert!(page.sites.is_empty());
    }

    #[test]
    fn test_revision_key() {
        let revision = ContentRevision {
            id: RevisionId(1),
            page: PageId(2),
            language: "en".to_owned(),
            content_type: "body".to_owned(),
            body: "Hello".to_owned(),
            creation_date: Utc::now(),
        };

        assert_eq!(revision.key(), ContentKey::new(PageId(2), "en", "body"));
    }
}
