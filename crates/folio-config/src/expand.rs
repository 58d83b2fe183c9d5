//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}`, `${VAR:-default}`, `$VAR` and a leading `~` in `value`.
///
/// A reference to an unset variable without a default is an error that names
/// both the variable and the config field it appeared in.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_unchanged() {
        assert_eq!(expand_env(".folio/cache", "cache.dir").unwrap(), ".folio/cache");
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FOLIO_EXPAND_UNSET");
        }

        let expanded = expand_env("${FOLIO_EXPAND_UNSET:-/tmp/folio}", "cache.dir").unwrap();

        assert_eq!(expanded, "/tmp/folio");
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FOLIO_EXPAND_MISSING");
        }

        let err = expand_env("${FOLIO_EXPAND_MISSING}/cache", "cache.dir").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let msg = err.to_string();
        assert!(msg.contains("FOLIO_EXPAND_MISSING"), "got: {msg}");
        assert!(msg.contains("cache.dir"), "got: {msg}");
    }
}
