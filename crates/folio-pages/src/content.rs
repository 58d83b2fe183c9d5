//! Content resolution, URL paths and templates.
//!
//! Lookups go through three tiers: the local memo, the shared cache and
//! finally the store. Whatever is built from the store is written back to
//! both caches.

use std::collections::BTreeMap;

use folio_store::{ContentKey, ContentRevision, PageId, PageNode};

use crate::error::PageError;
use crate::page_cache::{CachedContent, ContentMap};
use crate::pages::Pages;

/// Content type holding a page's URL segment.
pub const SLUG: &str = "slug";
/// Content type holding a page's title.
pub const TITLE: &str = "title";

fn identity(page: &PageNode) -> Result<PageId, PageError> {
    page.id
        .ok_or_else(|| PageError::InvalidState("page has not been saved yet".to_owned()))
}

fn non_empty(content: &ContentMap, language: &str, content_type: &str) -> Option<String> {
    content
        .get(language)?
        .get(content_type)
        .filter(|slot| !slot.body.is_empty())
        .map(|slot| slot.body.clone())
}

impl Pages {
    /// Current content of the page for the given languages.
    ///
    /// Languages already cached are never queried again; missing ones are
    /// built from the store (respecting the freeze date) and merged in.
    fn content_map(&self, page: &PageNode, languages: &[&str]) -> Result<ContentMap, PageError> {
        let id = identity(page)?;
        let mut content = match self.memo.content(id) {
            Some(content) => content,
            None => self.cache.content(id).unwrap_or_default(),
        };

        let missing: Vec<&str> = languages
            .iter()
            .copied()
            .filter(|language| !content.contains_key(*language))
            .collect();
        if missing.is_empty() {
            self.memo.set_content(id, content.clone());
            return Ok(content);
        }

        // The stored record decides the freeze date; the caller's copy may
        // predate the last save.
        let stored = self.store.page(id)?;
        let freeze_date = stored
            .as_ref()
            .map_or(page.freeze_date, |record| record.freeze_date);
        for &language in &missing {
            let mut slots = BTreeMap::new();
            for content_type in self.store.content_types(id, language, freeze_date)? {
                let key = ContentKey::new(id, language, content_type.as_str());
                if let Some(revision) = self.store.latest_revision(&key, freeze_date)? {
                    slots.insert(
                        content_type,
                        CachedContent {
                            body: revision.body,
                            creation_date: revision.creation_date,
                        },
                    );
                }
            }
            content.insert(language.to_owned(), slots);
        }

        if stored.is_none() {
            tracing::debug!(%id, "Page no longer stored, content not cached");
            return Ok(content);
        }
        tracing::debug!(%id, languages = ?missing, "Built page content");
        self.cache.set_content(id, &content);
        self.memo.set_content(id, content.clone());
        Ok(content)
    }

    /// Latest revision of a slot, honoring the page's freeze date.
    ///
    /// Bypasses the caches.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidState`] if the page has no identity.
    pub fn latest(
        &self,
        page: &PageNode,
        language: &str,
        content_type: &str,
    ) -> Result<Option<ContentRevision>, PageError> {
        let key = ContentKey::new(identity(page)?, language, content_type);
        Ok(self.store.latest_revision(&key, page.freeze_date)?)
    }

    /// Every revision of a slot, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidState`] if the page has no identity.
    pub fn history(
        &self,
        page: &PageNode,
        language: &str,
        content_type: &str,
    ) -> Result<Vec<ContentRevision>, PageError> {
        let key = ContentKey::new(identity(page)?, language, content_type);
        Ok(self.store.revisions(&key)?)
    }

    /// Resolve a content slot.
    ///
    /// Looks in the requested language (the default one when `None`). With
    /// `allow_fallback`, the other configured languages are tried in order.
    /// The first non-empty body wins; an empty body counts as missing.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidState`] if the page has no identity.
    pub fn resolve(
        &self,
        page: &PageNode,
        language: Option<&str>,
        content_type: &str,
        allow_fallback: bool,
    ) -> Result<Option<String>, PageError> {
        let language = self.config.language_or_default(language);
        let content = self.content_map(page, &[language])?;
        if let Some(body) = non_empty(&content, language, content_type) {
            return Ok(Some(body));
        }
        if !allow_fallback {
            return Ok(None);
        }

        let fallbacks: Vec<&str> = self.config.fallback_languages(language).collect();
        let content = self.content_map(page, &fallbacks)?;
        Ok(fallbacks
            .iter()
            .find_map(|fallback| non_empty(&content, fallback, content_type)))
    }

    /// Slug of the page, with language fallback.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidState`] if the page has no identity.
    pub fn slug(&self, page: &PageNode, language: Option<&str>) -> Result<Option<String>, PageError> {
        self.resolve(page, language, SLUG, true)
    }

    /// Title of the page, with language fallback.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidState`] if the page has no identity.
    pub fn title(&self, page: &PageNode, language: Option<&str>) -> Result<Option<String>, PageError> {
        self.resolve(page, language, TITLE, true)
    }

    /// Short label for listings: the slug, or the page id.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if content cannot be read.
    pub fn display_name(&self, page: &PageNode) -> Result<String, PageError> {
        let Some(id) = page.id else {
            return Ok("Page without id".to_owned());
        };
        Ok(self
            .slug(page, None)?
            .unwrap_or_else(|| format!("Page {id}")))
    }

    /// Configured languages the page has content in, in configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidState`] if the page has no identity.
    pub fn languages(&self, page: &PageNode) -> Result<Vec<String>, PageError> {
        let id = identity(page)?;
        if let Some(languages) = self.memo.languages(id) {
            return Ok(languages);
        }

        let configured: Vec<&str> = self.config.languages.iter().map(String::as_str).collect();
        let content = self.content_map(page, &configured)?;
        let languages: Vec<String> = configured
            .into_iter()
            .filter(|language| content.get(*language).is_some_and(|slots| !slots.is_empty()))
            .map(str::to_owned)
            .collect();

        self.memo.set_languages(id, languages.clone());
        Ok(languages)
    }

    /// Latest revisions of every placeholder of the page's template.
    ///
    /// Placeholders without content are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidState`] if the page has no identity.
    pub fn content_by_language(
        &self,
        page: &PageNode,
        language: &str,
    ) -> Result<Vec<ContentRevision>, PageError> {
        let template = self.template_of(page)?;
        let mut revisions = Vec::new();
        for placeholder in self.config.placeholders(&template) {
            if let Some(revision) = self.latest(page, language, placeholder)? {
                revisions.push(revision);
            }
        }
        Ok(revisions)
    }

    /// Ancestors of a page, nearest first.
    ///
    /// Unsaved pages borrow the chain of their parent.
    fn ancestors_of(&self, page: &PageNode) -> Vec<PageId> {
        let forest = self.forest();
        if let Some(id) = page.id
            && forest.contains(id)
        {
            return forest.ancestors(id, true);
        }
        match page.parent {
            Some(parent) if forest.contains(parent) => {
                let mut chain = vec![parent];
                chain.extend(forest.ancestors(parent, true));
                chain
            }
            _ => Vec::new(),
        }
    }

    /// Template of the page: its own, else the nearest ancestor's, else the
    /// configured default.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if an ancestor cannot be read.
    pub fn template_of(&self, page: &PageNode) -> Result<String, PageError> {
        if let Some(template) = page.template.as_deref().filter(|t| !t.is_empty()) {
            return Ok(template.to_owned());
        }
        for ancestor in self.ancestors_of(page) {
            if let Some(template) = self
                .store
                .page(ancestor)?
                .and_then(|node| node.template)
                .filter(|t| !t.is_empty())
            {
                return Ok(template);
            }
        }
        Ok(self.config.default_template.clone())
    }

    /// Label of the page's template.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if an ancestor cannot be read.
    pub fn template_label(&self, page: &PageNode) -> Result<String, PageError> {
        let template = self.template_of(page)?;
        Ok(self.config.template_label(&template).to_owned())
    }

    /// Placeholder names of a template.
    pub fn placeholders(&self, template: &str) -> &[String] {
        self.config.placeholders(template)
    }

    /// Every placeholder body of every language the page has, for indexing.
    ///
    /// Bodies are joined with `\r\n`; no language fallback is applied.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidState`] if the page has no identity.
    pub fn expose_text(&self, page: &PageNode) -> Result<String, PageError> {
        let template = self.template_of(page)?;
        let placeholders = self.config.placeholders(&template);

        let mut parts = Vec::new();
        for language in self.languages(page)? {
            for placeholder in placeholders {
                if let Some(body) = self.resolve(page, Some(&language), placeholder, false)? {
                    parts.push(body);
                }
            }
        }
        Ok(parts.join("\r\n"))
    }

    /// URL path of the page: ancestor slugs and its own, joined with `/`.
    ///
    /// With `hide_root_slug`, the first root contributes no segment and the
    /// first root itself yields an empty path. Empty slugs are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidState`] if the page has no identity.
    pub fn complete_slug(&self, page: &PageNode, language: Option<&str>) -> Result<String, PageError> {
        let id = identity(page)?;
        let language = self.config.language_or_default(language);

        if let Some(path) = self.memo.url(id, language) {
            return Ok(path);
        }
        let mut paths = self.cache.url_paths(id).unwrap_or_default();
        if let Some(path) = paths.get(language).cloned() {
            self.memo.set_urls(id, paths);
            return Ok(path);
        }

        let hidden = if self.config.hide_root_slug {
            self.first_root()
        } else {
            None
        };
        let path = if hidden == Some(id) {
            String::new()
        } else {
            let mut segments = Vec::new();
            for ancestor in self.ancestors_of(page).into_iter().rev() {
                if Some(ancestor) == hidden {
                    continue;
                }
                if let Some(node) = self.store.page(ancestor)?
                    && let Some(slug) = self.slug(&node, Some(language))?
                {
                    segments.push(slug);
                }
            }
            if let Some(slug) = self.slug(page, Some(language))? {
                segments.push(slug);
            }
            segments.join("/")
        };

        if !self.forest().contains(id) {
            tracing::debug!(%id, "Page not in the tree, URL path not cached");
            return Ok(path);
        }
        tracing::debug!(%id, language, path = %path, "Computed URL path");
        paths.insert(language.to_owned(), path.clone());
        self.cache.set_url_paths(id, &paths);
        self.memo.set_urls(id, paths);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use folio_cache::{Cache, CacheBucket, CacheBucketExt};
    use folio_store::{NewRevision, PageStore};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::{PagesConfig, TemplateDef};
    use crate::fixtures::Fixture;

    fn multilingual() -> PagesConfig {
        PagesConfig {
            languages: vec!["en".to_owned(), "fr".to_owned(), "de".to_owned()],
            templates: vec![
                TemplateDef::new("pages/default.html", &["title", "body"]).with_label("Default"),
                TemplateDef::new("pages/blog.html", &["title", "intro", "body"]),
            ],
            ..PagesConfig::default()
        }
    }

    fn site(hide_root_slug: bool) -> (Fixture, PageId, PageId, PageId) {
        let fixture = Fixture::with_config(PagesConfig {
            hide_root_slug,
            ..PagesConfig::default()
        });
        let home = fixture.add(None, "home");
        let about = fixture.add(Some(home), "about");
        let team = fixture.add(Some(about), "team");
        (fixture, home, about, team)
    }

    // ========================================================================
    // Revisions
    // ========================================================================

    #[test]
    fn test_latest_uses_creation_date_not_insert_order() {
        let fixture = Fixture::new();
        let id = fixture.add(None, "home");
        let at = |hour| Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        for (body, date) in [("second", at(2)), ("first", at(1))] {
            fixture
                .pages
                .save_revision(NewRevision {
                    key: ContentKey::new(id, "en", "body"),
                    body: body.to_owned(),
                    creation_date: date,
                })
                .unwrap();
        }
        let page = fixture.node(id);

        let latest = fixture.pages.latest(&page, "en", "body").unwrap().unwrap();

        assert_eq!(latest.body, "second");
        let history: Vec<_> = fixture
            .pages
            .history(&page, "en", "body")
            .unwrap()
            .into_iter()
            .map(|r| r.body)
            .collect();
        assert_eq!(history, vec!["first", "second"]);
    }

    #[test]
    fn test_frozen_page_shows_content_as_of_freeze_date() {
        let fixture = Fixture::new();
        let id = fixture.add(None, "home");
        let now = Utc::now();
        for (body, date) in [("old", now - Duration::days(2)), ("new", now)] {
            fixture
                .pages
                .save_revision(NewRevision {
                    key: ContentKey::new(id, "en", "title"),
                    body: body.to_owned(),
                    creation_date: date,
                })
                .unwrap();
        }
        let frozen = fixture
            .pages
            .save_page(fixture.node(id).with_freeze_date(now - Duration::days(1)))
            .unwrap();

        assert_eq!(fixture.pages.title(&frozen, None).unwrap().as_deref(), Some("old"));
        assert_eq!(
            fixture.pages.latest(&frozen, "en", "title").unwrap().unwrap().body,
            "old"
        );
    }

    #[test]
    fn test_outdated_page_copy_cannot_bypass_freeze_date() {
        let fixture = Fixture::new();
        let id = fixture.add(None, "home");
        let now = Utc::now();
        for (body, date) in [("old", now - Duration::days(2)), ("new", now)] {
            fixture
                .pages
                .save_revision(NewRevision {
                    key: ContentKey::new(id, "en", "title"),
                    body: body.to_owned(),
                    creation_date: date,
                })
                .unwrap();
        }
        let outdated = fixture.node(id);
        fixture
            .pages
            .save_page(fixture.node(id).with_freeze_date(now - Duration::days(1)))
            .unwrap();

        assert_eq!(fixture.pages.title(&outdated, None).unwrap().as_deref(), Some("old"));
        fixture.pages.clear_local_memo();
        assert_eq!(
            fixture.pages.title(&fixture.node(id), None).unwrap().as_deref(),
            Some("old")
        );
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    #[test]
    fn test_resolve_falls_back_in_configured_order() {
        let fixture = Fixture::with_config(multilingual());
        let id = fixture.pages.save_page(PageNode::new()).unwrap().id.unwrap();
        fixture.pages.save_content(id, "en", "title", "Hello").unwrap();
        fixture.pages.save_content(id, "de", "body", "Inhalt").unwrap();
        let page = fixture.node(id);

        assert_eq!(
            fixture.pages.resolve(&page, Some("fr"), "title", true).unwrap().as_deref(),
            Some("Hello")
        );
        assert_eq!(fixture.pages.resolve(&page, Some("fr"), "title", false).unwrap(), None);
        assert_eq!(
            fixture.pages.resolve(&page, Some("fr"), "body", true).unwrap().as_deref(),
            Some("Inhalt")
        );
        assert_eq!(fixture.pages.resolve(&page, None, "title", false).unwrap().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_empty_body_counts_as_missing() {
        let fixture = Fixture::with_config(multilingual());
        let id = fixture.pages.save_page(PageNode::new()).unwrap().id.unwrap();
        fixture.pages.save_content(id, "en", "title", "").unwrap();
        fixture.pages.save_content(id, "fr", "title", "Bonjour").unwrap();
        let page = fixture.node(id);

        assert_eq!(fixture.pages.resolve(&page, Some("en"), "title", false).unwrap(), None);
        assert_eq!(
            fixture.pages.resolve(&page, Some("en"), "title", true).unwrap().as_deref(),
            Some("Bonjour")
        );
    }

    #[test]
    fn test_resolved_content_is_cached_until_invalidated() {
        let fixture = Fixture::with_config(multilingual());
        let id = fixture.pages.save_page(PageNode::new()).unwrap().id.unwrap();
        fixture.pages.save_content(id, "en", "title", "Hello").unwrap();
        let page = fixture.node(id);
        assert_eq!(fixture.pages.title(&page, Some("fr")).unwrap().as_deref(), Some("Hello"));

        let cached: ContentMap = fixture.cache.bucket("pages").get_json(&format!("page_{id}")).unwrap();
        assert_eq!(cached["en"]["title"].body, "Hello");
        assert!(cached["fr"].is_empty());

        // Written behind the service's back: the caches keep serving the old body.
        fixture
            .store
            .insert_revision(NewRevision {
                key: ContentKey::new(id, "en", "title"),
                body: "Hi".to_owned(),
                creation_date: Utc::now() + Duration::seconds(1),
            })
            .unwrap();
        assert_eq!(fixture.pages.title(&page, None).unwrap().as_deref(), Some("Hello"));

        fixture.pages.invalidate(id);
        assert_eq!(fixture.pages.title(&page, None).unwrap().as_deref(), Some("Hi"));
    }

    #[test]
    fn test_shared_cache_serves_after_memo_is_cleared() {
        let fixture = Fixture::new();
        let id = fixture.add(None, "home");
        let page = fixture.node(id);
        assert_eq!(fixture.pages.slug(&page, None).unwrap().as_deref(), Some("home"));

        fixture.pages.clear_local_memo();
        fixture.cache.bucket("pages").set_json(
            &format!("page_{id}"),
            &ContentMap::from([(
                "en".to_owned(),
                BTreeMap::from([(
                    "slug".to_owned(),
                    CachedContent {
                        body: "from-cache".to_owned(),
                        creation_date: Utc::now(),
                    },
                )]),
            )]),
        );

        assert_eq!(fixture.pages.slug(&page, None).unwrap().as_deref(), Some("from-cache"));
    }

    #[test]
    fn test_unsaved_page_has_no_content() {
        let fixture = Fixture::new();
        let page = PageNode::new();

        let err = fixture.pages.resolve(&page, None, "title", true).unwrap_err();

        assert!(matches!(err, PageError::InvalidState(_)));
        assert!(matches!(fixture.pages.complete_slug(&page, None), Err(PageError::InvalidState(_))));
        assert!(fixture.cache.is_empty());
    }

    #[test]
    fn test_languages_follow_configuration_order() {
        let fixture = Fixture::with_config(multilingual());
        let id = fixture.pages.save_page(PageNode::new()).unwrap().id.unwrap();
        fixture.pages.save_content(id, "de", "title", "Hallo").unwrap();
        fixture.pages.save_content(id, "en", "title", "Hello").unwrap();
        fixture.pages.save_content(id, "it", "title", "Ciao").unwrap();
        let page = fixture.node(id);

        assert_eq!(fixture.pages.languages(&page).unwrap(), vec!["en", "de"]);
    }

    #[test]
    fn test_display_name() {
        let fixture = Fixture::new();
        let named = fixture.add(None, "home");
        let unnamed = fixture.pages.save_page(PageNode::new()).unwrap();

        assert_eq!(fixture.pages.display_name(&fixture.node(named)).unwrap(), "home");
        assert_eq!(
            fixture.pages.display_name(&unnamed).unwrap(),
            format!("Page {}", unnamed.id.unwrap())
        );
        assert_eq!(fixture.pages.display_name(&PageNode::new()).unwrap(), "Page without id");
    }

    // ========================================================================
    // Templates
    // ========================================================================

    #[test]
    fn test_template_inherits_from_nearest_ancestor() {
        let fixture = Fixture::with_config(multilingual());
        let root = fixture.pages.save_page(PageNode::new()).unwrap().id.unwrap();
        let blog = fixture
            .pages
            .save_page(PageNode::new().with_parent(root).with_template("pages/blog.html"))
            .unwrap()
            .id
            .unwrap();
        let post = fixture.pages.save_page(PageNode::new().with_parent(blog)).unwrap();
        let draft = PageNode::new().with_parent(post.id.unwrap());

        assert_eq!(fixture.pages.template_of(&fixture.node(root)).unwrap(), "pages/default.html");
        assert_eq!(fixture.pages.template_of(&post).unwrap(), "pages/blog.html");
        assert_eq!(fixture.pages.template_of(&draft).unwrap(), "pages/blog.html");
        assert_eq!(fixture.pages.template_label(&fixture.node(root)).unwrap(), "Default");
        assert_eq!(fixture.pages.template_label(&post).unwrap(), "pages/blog.html");
        assert_eq!(fixture.pages.placeholders("pages/blog.html"), ["title", "intro", "body"]);
    }

    #[test]
    fn test_content_by_language_and_expose_text() {
        let fixture = Fixture::with_config(multilingual());
        let id = fixture.pages.save_page(PageNode::new()).unwrap().id.unwrap();
        fixture.pages.save_content(id, "en", "title", "Hello").unwrap();
        fixture.pages.save_content(id, "en", "body", "World").unwrap();
        fixture.pages.save_content(id, "en", "sidebar", "ignored").unwrap();
        fixture.pages.save_content(id, "fr", "body", "Monde").unwrap();
        let page = fixture.node(id);

        let english: Vec<_> = fixture
            .pages
            .content_by_language(&page, "en")
            .unwrap()
            .into_iter()
            .map(|r| r.content_type)
            .collect();
        assert_eq!(english, vec!["title", "body"]);

        assert_eq!(fixture.pages.expose_text(&page).unwrap(), "Hello\r\nWorld\r\nMonde");
    }

    // ========================================================================
    // URL paths
    // ========================================================================

    #[test]
    fn test_complete_slug_hides_first_root() {
        let (fixture, home, about, team) = site(true);

        assert_eq!(fixture.pages.complete_slug(&fixture.node(team), None).unwrap(), "about/team");
        assert_eq!(fixture.pages.complete_slug(&fixture.node(about), None).unwrap(), "about");
        assert_eq!(fixture.pages.complete_slug(&fixture.node(home), None).unwrap(), "");
    }

    #[test]
    fn test_complete_slug_without_hiding() {
        let (fixture, home, _, team) = site(false);

        assert_eq!(
            fixture.pages.complete_slug(&fixture.node(team), None).unwrap(),
            "home/about/team"
        );
        assert_eq!(fixture.pages.complete_slug(&fixture.node(home), None).unwrap(), "home");
    }

    #[test]
    fn test_complete_slug_only_hides_the_first_tree() {
        let (fixture, _, _, _) = site(true);
        let docs = fixture.add(None, "docs");
        let guide = fixture.add(Some(docs), "guide");

        assert_eq!(fixture.pages.complete_slug(&fixture.node(guide), None).unwrap(), "docs/guide");
    }

    #[test]
    fn test_complete_slug_is_cached_per_language() {
        let (fixture, _, _, team) = site(false);

        fixture.pages.complete_slug(&fixture.node(team), None).unwrap();

        let bucket = fixture.cache.bucket("pages");
        let paths: BTreeMap<String, String> = bucket.get_json(&format!("page_{team}_url")).unwrap();
        assert_eq!(paths, BTreeMap::from([("en".to_owned(), "home/about/team".to_owned())]));
    }

    #[test]
    fn test_renaming_ancestor_cascades_to_descendant_paths() {
        let (fixture, _, about, team) = site(false);
        assert_eq!(
            fixture.pages.complete_slug(&fixture.node(team), None).unwrap(),
            "home/about/team"
        );

        fixture.pages.save_content(about, "en", "slug", "company").unwrap();

        assert_eq!(
            fixture.pages.complete_slug(&fixture.node(team), None).unwrap(),
            "home/company/team"
        );
    }

    #[test]
    fn test_without_cascade_descendant_paths_stay_stale() {
        let fixture = Fixture::with_config(PagesConfig {
            cascade_invalidation: false,
            ..PagesConfig::default()
        });
        let home = fixture.add(None, "home");
        let about = fixture.add(Some(home), "about");
        assert_eq!(fixture.pages.complete_slug(&fixture.node(about), None).unwrap(), "home/about");

        fixture.pages.save_content(home, "en", "slug", "start").unwrap();

        assert_eq!(fixture.pages.complete_slug(&fixture.node(about), None).unwrap(), "home/about");
    }

    #[test]
    fn test_moving_page_refreshes_paths() {
        let (fixture, home, about, team) = site(false);
        let blog = fixture.add(Some(home), "blog");
        assert_eq!(
            fixture.pages.complete_slug(&fixture.node(team), None).unwrap(),
            "home/about/team"
        );

        fixture.pages.move_page(team, folio_tree::Placement::FirstChildOf(blog)).unwrap();

        assert_eq!(
            fixture.pages.complete_slug(&fixture.node(team), None).unwrap(),
            "home/blog/team"
        );
        assert_eq!(fixture.pages.children(about), Vec::<PageId>::new());
    }

    #[test]
    fn test_new_first_root_refreshes_hidden_paths() {
        let (fixture, home, about, _) = site(true);
        let docs = fixture.add(None, "docs");
        let guide = fixture.add(Some(docs), "guide");
        assert_eq!(fixture.pages.complete_slug(&fixture.node(about), None).unwrap(), "about");
        assert_eq!(fixture.pages.complete_slug(&fixture.node(guide), None).unwrap(), "docs/guide");

        fixture.pages.move_page(docs, folio_tree::Placement::Before(home)).unwrap();

        assert_eq!(fixture.pages.complete_slug(&fixture.node(about), None).unwrap(), "home/about");
        assert_eq!(fixture.pages.complete_slug(&fixture.node(guide), None).unwrap(), "guide");
    }

    #[test]
    fn test_invalidate_clears_every_derived_entry() {
        let (fixture, home, about, _) = site(true);
        let page = fixture.node(about);
        fixture.pages.complete_slug(&page, None).unwrap();
        fixture.pages.title(&page, None).unwrap();
        fixture.pages.mark_broken_link(about);
        assert_eq!(fixture.pages.first_root(), Some(home));
        let bucket = fixture.cache.bucket("pages");
        for key in [
            format!("page_{about}"),
            format!("page_{about}_url"),
            format!("page_broken_link_{about}"),
            "first_root_id".to_owned(),
        ] {
            assert!(bucket.get(&key).is_some(), "missing {key}");
        }

        fixture.pages.invalidate(about);

        assert_eq!(bucket.get(&format!("page_{about}")), None);
        assert_eq!(bucket.get(&format!("page_{about}_url")), None);
        assert_eq!(bucket.get(&format!("page_broken_link_{about}")), None);
        assert_eq!(bucket.get("first_root_id"), None);
    }

    #[test]
    fn test_deleted_page_has_no_slug_and_leaves_no_entries() {
        let fixture = Fixture::new();
        let id = fixture.add(None, "home");
        let mut ghost = fixture.node(id);
        fixture.pages.delete_page(id, folio_tree::RemoveMode::Cascade).unwrap();
        ghost.parent = None;

        assert_eq!(fixture.pages.slug(&ghost, None).unwrap(), None);
        assert_eq!(fixture.pages.complete_slug(&ghost, None).unwrap(), "");
        assert!(fixture.store.page(id).unwrap().is_none());
        let bucket = fixture.cache.bucket("pages");
        assert_eq!(bucket.get(&format!("page_{id}")), None);
        assert_eq!(bucket.get(&format!("page_{id}_url")), None);
    }
}
