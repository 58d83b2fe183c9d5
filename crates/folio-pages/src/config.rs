//! Settings consumed by [`Pages`](crate::Pages).

use crate::publication::PublicationPolicy;

/// A known template and the placeholders it renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateDef {
    /// Identifier as stored on pages.
    pub name: String,
    /// Human-readable label.
    pub label: Option<String>,
    /// Placeholder (content type) names, in render order.
    pub placeholders: Vec<String>,
}

impl TemplateDef {
    /// Create a template with placeholders and no label.
    #[must_use]
    pub fn new(name: impl Into<String>, placeholders: &[&str]) -> Self {
        Self {
            name: name.into(),
            label: None,
            placeholders: placeholders.iter().map(|&p| p.to_owned()).collect(),
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Configuration for [`Pages`](crate::Pages).
#[derive(Clone, Debug)]
pub struct PagesConfig {
    /// Configured languages; also the order tried by content fallback.
    pub languages: Vec<String>,
    /// Language used when a caller passes none.
    pub default_language: String,
    /// Template used when neither a page nor its ancestors set one.
    pub default_template: String,
    /// Known templates.
    pub templates: Vec<TemplateDef>,
    /// Publication window policy.
    pub publication: PublicationPolicy,
    /// Omit the first root's slug from URL paths.
    pub hide_root_slug: bool,
    /// Invalidate descendants' URL paths along with an edited page.
    pub cascade_invalidation: bool,
    /// Site added to pages saved without any.
    pub default_site: Option<u32>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_owned()],
            default_language: "en".to_owned(),
            default_template: "pages/default.html".to_owned(),
            templates: Vec::new(),
            publication: PublicationPolicy::default(),
            hide_root_slug: false,
            cascade_invalidation: true,
            default_site: None,
        }
    }
}

impl PagesConfig {
    /// Template definition by identifier.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&TemplateDef> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Placeholder names of a template. Unknown templates have none.
    #[must_use]
    pub fn placeholders(&self, template: &str) -> &[String] {
        self.template(template)
            .map(|t| t.placeholders.as_slice())
            .unwrap_or_default()
    }

    /// Configured label of a template, or its identifier.
    #[must_use]
    pub fn template_label<'a>(&'a self, template: &'a str) -> &'a str {
        self.template(template)
            .and_then(|t| t.label.as_deref())
            .unwrap_or(template)
    }

    /// The requested language, or the default one.
    pub(crate) fn language_or_default<'a>(&'a self, language: Option<&'a str>) -> &'a str {
        language.unwrap_or(&self.default_language)
    }

    /// Languages tried after `requested` came up empty.
    pub(crate) fn fallback_languages<'a>(
        &'a self,
        requested: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.languages
            .iter()
            .map(String::as_str)
            .filter(move |&language| language != requested)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config() -> PagesConfig {
        PagesConfig {
            languages: vec!["en".to_owned(), "fr".to_owned(), "de".to_owned()],
            templates: vec![
                TemplateDef::new("pages/default.html", &["title", "slug", "body"])
                    .with_label("Default"),
                TemplateDef::new("pages/bare.html", &["body"]),
            ],
            ..PagesConfig::default()
        }
    }

    #[test]
    fn test_placeholders() {
        let config = config();

        assert_eq!(
            config.placeholders("pages/default.html"),
            ["title", "slug", "body"]
        );
        assert!(config.placeholders("pages/unknown.html").is_empty());
    }

    #[test]
    fn test_template_label_falls_back_to_name() {
        let config = config();

        assert_eq!(config.template_label("pages/default.html"), "Default");
        assert_eq!(config.template_label("pages/bare.html"), "pages/bare.html");
        assert_eq!(config.template_label("other.html"), "other.html");
    }

    #[test]
    fn test_fallback_skips_requested_language() {
        let config = config();

        let order: Vec<_> = config.fallback_languages("fr").collect();

        assert_eq!(order, vec!["en", "de"]);
    }

    #[test]
    fn test_language_or_default() {
        let config = config();

        assert_eq!(config.language_or_default(None), "en");
        assert_eq!(config.language_or_default(Some("de")), "de");
    }
}
