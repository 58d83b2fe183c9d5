//! Configuration management for Folio.
//!
//! Parses `folio.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! `cache.dir` supports shell-style expansion:
//!
//! - `${VAR}` / `$VAR` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//! - `~` - expands to the home directory
//!
//! ## Example
//!
//! ```toml
//! [languages]
//! available = ["en", "fr", "de"]
//! default = "en"
//!
//! [templates]
//! default = "pages/default.html"
//!
//! [[templates.available]]
//! name = "pages/default.html"
//! label = "Default"
//! placeholders = ["title", "slug", "body"]
//!
//! [urls]
//! hide_root_slug = true
//!
//! [cache]
//! dir = "${FOLIO_CACHE:-.folio/cache}"
//! ```

mod expand;

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Override default language.
    pub default_language: Option<String>,
    /// Override root slug hiding.
    pub hide_root_slug: Option<bool>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "folio.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language configuration.
    pub languages: LanguagesConfig,
    /// Template configuration.
    pub templates: TemplatesConfig,
    /// Publication window policy.
    pub publication: PublicationConfig,
    /// URL path configuration.
    pub urls: UrlsConfig,
    /// Site scoping.
    pub sites: SitesConfig,
    /// Cache configuration (paths are relative strings from TOML).
    cache: CacheConfigRaw,

    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Language configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LanguagesConfig {
    /// Configured languages. Also the fallback order of content resolution.
    pub available: Vec<String>,
    /// Language used when none is requested.
    pub default: String,
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            available: vec!["en".to_owned()],
            default: "en".to_owned(),
        }
    }
}

/// Template configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Template used when neither a page nor its ancestors set one.
    pub default: String,
    /// Known templates with their labels and placeholders.
    pub available: Vec<TemplateConfig>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            default: "pages/default.html".to_owned(),
            available: Vec::new(),
        }
    }
}

/// A single template entry.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Template identifier as stored on pages.
    pub name: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: Option<String>,
    /// Placeholder (content type) names the template renders.
    #[serde(default)]
    pub placeholders: Vec<String>,
}

/// Publication window policy.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PublicationConfig {
    /// Pages with a future publication date stay drafts.
    pub show_start_date: bool,
    /// Pages past their publication end date expire.
    pub show_end_date: bool,
}

/// URL path configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UrlsConfig {
    /// Omit the first root's slug from every URL path.
    pub hide_root_slug: bool,
}

/// Site scoping.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SitesConfig {
    /// Site added to pages saved without any site.
    pub default_site: Option<u32>,
}

/// Raw cache configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
    cascade_invalidation: Option<bool>,
}

/// Resolved cache configuration with absolute paths.
#[derive(Debug, Default)]
pub struct CacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,
    /// Cache directory.
    pub dir: PathBuf,
    /// Invalidate descendants' URL paths along with the saved page.
    pub cascade_invalidation: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`cache.dir`").
        field: String,
        /// Error message (e.g., "${`FOLIO_CACHE`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require every entry of a list to be unique.
fn require_unique<'a>(
    values: impl IntoIterator<Item = &'a str>,
    field: &str,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(ConfigError::Validation(format!(
                "{field} lists '{value}' more than once"
            )));
        }
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `folio.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the settings (including CLI overrides) are invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = cache_enabled;
        }
        if let Some(cache_dir) = &settings.cache_dir {
            self.cache_resolved.dir.clone_from(cache_dir);
        }
        if let Some(language) = &settings.default_language {
            self.languages.default.clone_from(language);
        }
        if let Some(hide_root_slug) = settings.hide_root_slug {
            self.urls.hide_root_slug = hide_root_slug;
        }
    }

    /// Template entry by identifier.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&TemplateConfig> {
        self.templates.available.iter().find(|t| t.name == name)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(current)
    }

    fn discover_from(mut current: PathBuf) -> Option<PathBuf> {
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            languages: LanguagesConfig::default(),
            templates: TemplatesConfig::default(),
            publication: PublicationConfig::default(),
            urls: UrlsConfig::default(),
            sites: SitesConfig::default(),
            cache: CacheConfigRaw::default(),
            cache_resolved: CacheConfig {
                enabled: true,
                dir: base.join(".folio").join("cache"),
                cascade_invalidation: true,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_languages()?;
        self.validate_templates()?;
        Ok(())
    }

    fn validate_languages(&self) -> Result<(), ConfigError> {
        let languages = &self.languages;
        if languages.available.is_empty() {
            return Err(ConfigError::Validation(
                "languages.available cannot be empty".to_owned(),
            ));
        }
        for language in &languages.available {
            require_non_empty(language, "languages.available")?;
        }
        require_unique(
            languages.available.iter().map(String::as_str),
            "languages.available",
        )?;
        require_non_empty(&languages.default, "languages.default")?;
        if !languages.available.contains(&languages.default) {
            return Err(ConfigError::Validation(format!(
                "languages.default '{}' is not listed in languages.available",
                languages.default
            )));
        }
        Ok(())
    }

    fn validate_templates(&self) -> Result<(), ConfigError> {
        let templates = &self.templates;
        require_non_empty(&templates.default, "templates.default")?;
        for template in &templates.available {
            require_non_empty(&template.name, "templates.available.name")?;
        }
        require_unique(
            templates.available.iter().map(|t| t.name.as_str()),
            "templates.available",
        )?;
        if !templates.available.is_empty() && self.template(&templates.default).is_none() {
            return Err(ConfigError::Validation(format!(
                "templates.default '{}' is not listed in templates.available",
                templates.default
            )));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.cache.dir {
            self.cache.dir = Some(expand::expand_env(dir, "cache.dir")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let dir = match self.cache.dir.as_deref() {
            Some(dir) => config_dir.join(dir),
            None => config_dir.join(".folio").join("cache"),
        };
        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            dir,
            cascade_invalidation: self.cache.cascade_invalidation.unwrap_or(true),
        };
    }
}
