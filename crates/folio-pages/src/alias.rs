//! URL alias normalization.

/// Canonical form of alias URLs.
///
/// Aliases are stored and looked up in normalized form, so two spellings of
/// the same URL always hit the same record.
pub trait UrlNormalizer: Send + Sync {
    /// Normalize a URL.
    fn normalize(&self, url: &str) -> String;
}

/// Default [`UrlNormalizer`].
///
/// Ensures a single leading `/` and drops one trailing `/`; the empty string
/// becomes `/`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNormalizer;

impl UrlNormalizer for DefaultNormalizer {
    fn normalize(&self, url: &str) -> String {
        if url.is_empty() {
            return "/".to_owned();
        }
        let mut normalized = if url.starts_with('/') {
            url.to_owned()
        } else {
            format!("/{url}")
        };
        if normalized.len() > 1 && normalized.ends_with('/') {
            normalized.pop();
        }
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_normalizer() {
        let normalizer = DefaultNormalizer;

        assert_eq!(normalizer.normalize(""), "/");
        assert_eq!(normalizer.normalize("/"), "/");
        assert_eq!(normalizer.normalize("old/about"), "/old/about");
        assert_eq!(normalizer.normalize("/old/about/"), "/old/about");
        assert_eq!(normalizer.normalize("old/about/"), "/old/about");
    }

    #[test]
    fn test_only_one_trailing_slash_is_dropped() {
        assert_eq!(DefaultNormalizer.normalize("/blog//"), "/blog/");
    }
}
