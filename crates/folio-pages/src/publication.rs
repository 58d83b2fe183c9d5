//! Publication state machine.
//!
//! A page stores one of four statuses, but what visitors see also depends on
//! its publication window:
//!
//! ```text
//! stored      window                                  calculated
//! --------    ------------------------------------    ----------
//! any         start in the future (show_start_date)   Draft
//! any         end in the past (show_end_date)         Expired
//! status      otherwise                               status
//! ```

use chrono::{DateTime, Utc};
use folio_store::{PageNode, PageStatus};

/// Which publication dates are honored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublicationPolicy {
    /// A future publication date keeps the page a draft.
    pub show_start_date: bool,
    /// A past publication end date expires the page.
    pub show_end_date: bool,
}

impl PublicationPolicy {
    /// Status shown to visitors at `now`.
    #[must_use]
    pub fn calculated_status(&self, page: &PageNode, now: DateTime<Utc>) -> PageStatus {
        if self.show_start_date
            && page.publication_date.is_some_and(|start| start > now)
        {
            return PageStatus::Draft;
        }
        if self.show_end_date
            && page.publication_end_date.is_some_and(|end| end < now)
        {
            return PageStatus::Expired;
        }
        page.status
    }

    /// True if the page is reachable by visitors at `now`.
    #[must_use]
    pub fn is_visible(&self, page: &PageNode, now: DateTime<Utc>) -> bool {
        matches!(
            self.calculated_status(page, now),
            PageStatus::Published | PageStatus::Hidden
        )
    }

    /// Normalize a page before it is written.
    ///
    /// Published pages always get a publication date. Drafts keep one only
    /// when it is still in the future and start dates are honored. The
    /// modification date is stamped and pages without a site get the
    /// default site, if one is configured.
    pub fn normalize_on_save(
        &self,
        page: &mut PageNode,
        now: DateTime<Utc>,
        default_site: Option<u32>,
    ) {
        if page.status == PageStatus::Published && page.publication_date.is_none() {
            page.publication_date = Some(now);
        }
        if page.status == PageStatus::Draft {
            if self.show_start_date {
                if page.publication_date.is_some_and(|start| start <= now) {
                    page.publication_date = None;
                }
            } else {
                page.publication_date = None;
            }
        }
        page.last_modification_date = now;
        if page.sites.is_empty()
            && let Some(site) = default_site
        {
            page.sites.insert(site);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;

    const BOTH: PublicationPolicy = PublicationPolicy {
        show_start_date: true,
        show_end_date: true,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_future_start_is_draft_regardless_of_status() {
        for status in [PageStatus::Published, PageStatus::Hidden, PageStatus::Expired] {
            let page = PageNode::created_at(now())
                .with_status(status)
                .with_publication_date(now() + Duration::days(1));

            assert_eq!(BOTH.calculated_status(&page, now()), PageStatus::Draft);
        }
    }

    #[test]
    fn test_future_start_ignored_without_policy() {
        let page = PageNode::created_at(now())
            .with_status(PageStatus::Published)
            .with_publication_date(now() + Duration::days(1));

        let policy = PublicationPolicy::default();

        assert_eq!(policy.calculated_status(&page, now()), PageStatus::Published);
    }

    #[test]
    fn test_past_end_is_expired() {
        let page = PageNode::created_at(now())
            .with_status(PageStatus::Published)
            .with_publication_date(now() - Duration::days(10))
            .with_publication_end_date(now() - Duration::days(1));

        assert_eq!(BOTH.calculated_status(&page, now()), PageStatus::Expired);
        assert!(!BOTH.is_visible(&page, now()));
    }

    #[test]
    fn test_visibility() {
        let published = PageNode::created_at(now()).with_status(PageStatus::Published);
        let hidden = PageNode::created_at(now()).with_status(PageStatus::Hidden);
        let draft = PageNode::created_at(now());

        assert!(BOTH.is_visible(&published, now()));
        assert!(BOTH.is_visible(&hidden, now()));
        assert!(!BOTH.is_visible(&draft, now()));
    }

    #[test]
    fn test_save_stamps_published_date() {
        let mut page = PageNode::created_at(now() - Duration::days(3))
            .with_status(PageStatus::Published);

        BOTH.normalize_on_save(&mut page, now(), None);

        assert_eq!(page.publication_date, Some(now()));
        assert_eq!(page.last_modification_date, now());
    }

    #[test]
    fn test_save_clears_past_draft_date() {
        let mut page =
            PageNode::created_at(now()).with_publication_date(now() - Duration::hours(1));

        BOTH.normalize_on_save(&mut page, now(), None);

        assert_eq!(page.publication_date, None);
    }

    #[test]
    fn test_save_keeps_future_draft_date() {
        let start = now() + Duration::days(2);
        let mut page = PageNode::created_at(now()).with_publication_date(start);

        BOTH.normalize_on_save(&mut page, now(), None);

        assert_eq!(page.publication_date, Some(start));
    }

    #[test]
    fn test_save_clears_any_draft_date_without_start_policy() {
        let mut page =
            PageNode::created_at(now()).with_publication_date(now() + Duration::days(2));

        PublicationPolicy::default().normalize_on_save(&mut page, now(), None);

        assert_eq!(page.publication_date, None);
    }

    #[test]
    fn test_save_adds_default_site_only_when_empty() {
        let mut bare = PageNode::created_at(now());
        let mut scoped = PageNode::created_at(now());
        scoped.sites.insert(7);

        BOTH.normalize_on_save(&mut bare, now(), Some(1));
        BOTH.normalize_on_save(&mut scoped, now(), Some(1));

        assert_eq!(bare.sites.iter().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(scoped.sites.iter().copied().collect::<Vec<_>>(), vec![7]);
    }
}
