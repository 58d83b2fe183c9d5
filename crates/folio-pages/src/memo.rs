//! In-process memo in front of the shared cache.
//!
//! The memo only ever holds values that were read from or written to the
//! shared cache, and is dropped together with the matching cache entries.

use std::collections::HashMap;
use std::sync::Mutex;

use folio_store::PageId;

use crate::page_cache::{ContentMap, UrlPaths};

#[derive(Debug, Default)]
struct PageMemo {
    content: Option<ContentMap>,
    urls: UrlPaths,
    languages: Option<Vec<String>>,
}

/// Per-page memo plus the first-root memo.
#[derive(Debug, Default)]
pub(crate) struct LocalMemo {
    pages: Mutex<HashMap<PageId, PageMemo>>,
    first_root: Mutex<Option<PageId>>,
}

impl LocalMemo {
    pub(crate) fn content(&self, id: PageId) -> Option<ContentMap> {
        self.pages.lock().unwrap().get(&id)?.content.clone()
    }

    pub(crate) fn set_content(&self, id: PageId, content: ContentMap) {
        self.pages.lock().unwrap().entry(id).or_default().content = Some(content);
    }

    pub(crate) fn url(&self, id: PageId, language: &str) -> Option<String> {
        self.pages.lock().unwrap().get(&id)?.urls.get(language).cloned()
    }

    pub(crate) fn set_urls(&self, id: PageId, urls: UrlPaths) {
        let mut pages = self.pages.lock().unwrap();
        pages.entry(id).or_default().urls.extend(urls);
    }

    pub(crate) fn languages(&self, id: PageId) -> Option<Vec<String>> {
        self.pages.lock().unwrap().get(&id)?.languages.clone()
    }

    pub(crate) fn set_languages(&self, id: PageId, languages: Vec<String>) {
        self.pages.lock().unwrap().entry(id).or_default().languages = Some(languages);
    }

    /// Forget everything memoized for a page, and the first root.
    pub(crate) fn forget(&self, id: PageId) {
        self.pages.lock().unwrap().remove(&id);
        self.clear_first_root();
    }

    /// Forget the URL paths of a page.
    pub(crate) fn forget_urls(&self, id: PageId) {
        if let Some(memo) = self.pages.lock().unwrap().get_mut(&id) {
            memo.urls.clear();
        }
    }

    pub(crate) fn first_root(&self) -> Option<PageId> {
        *self.first_root.lock().unwrap()
    }

    pub(crate) fn set_first_root(&self, id: PageId) {
        *self.first_root.lock().unwrap() = Some(id);
    }

    pub(crate) fn clear_first_root(&self) {
        *self.first_root.lock().unwrap() = None;
    }

    pub(crate) fn clear(&self) {
        self.pages.lock().unwrap().clear();
        self.clear_first_root();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_forget_drops_page_and_first_root() {
        let memo = LocalMemo::default();
        memo.set_content(PageId(1), ContentMap::new());
        memo.set_languages(PageId(1), vec!["en".to_owned()]);
        memo.set_languages(PageId(2), vec!["fr".to_owned()]);
        memo.set_first_root(PageId(1));

        memo.forget(PageId(1));

        assert_eq!(memo.content(PageId(1)), None);
        assert_eq!(memo.languages(PageId(1)), None);
        assert_eq!(memo.languages(PageId(2)), Some(vec!["fr".to_owned()]));
        assert_eq!(memo.first_root(), None);
    }

    #[test]
    fn test_urls_merge_and_forget() {
        let memo = LocalMemo::default();
        memo.set_urls(PageId(1), UrlPaths::from([("en".to_owned(), "a".to_owned())]));
        memo.set_urls(PageId(1), UrlPaths::from([("fr".to_owned(), "b".to_owned())]));
        memo.set_content(PageId(1), ContentMap::new());

        assert_eq!(memo.url(PageId(1), "en").as_deref(), Some("a"));
        assert_eq!(memo.url(PageId(1), "fr").as_deref(), Some("b"));

        memo.forget_urls(PageId(1));

        assert_eq!(memo.url(PageId(1), "en"), None);
        assert!(memo.content(PageId(1)).is_some());
    }

    #[test]
    fn test_clear() {
        let memo = LocalMemo::default();
        memo.set_content(PageId(1), ContentMap::new());
        memo.set_first_root(PageId(1));

        memo.clear();

        assert_eq!(memo.content(PageId(1)), None);
        assert_eq!(memo.first_root(), None);
    }
}
