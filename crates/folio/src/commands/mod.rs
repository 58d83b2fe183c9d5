//! CLI command implementations.

pub(crate) mod alias;
pub(crate) mod book;
pub(crate) mod content;
pub(crate) mod move_page;
pub(crate) mod show;
pub(crate) mod tree;

pub(crate) use alias::AliasArgs;
pub(crate) use book::BookArgs;
pub(crate) use content::ContentArgs;
pub(crate) use move_page::MoveArgs;
pub(crate) use show::ShowArgs;
pub(crate) use tree::TreeArgs;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use clap::Args;
use folio_cache::{Cache, FileCache, NullCache};
use folio_config::{CliSettings, Config};
use folio_pages::{Pages, PagesConfig, PublicationPolicy, TemplateDef};
use folio_store::{MemoryStore, PageId, PageNode, PageStore};

use crate::error::CliError;

/// Arguments shared by every command.
#[derive(Args)]
pub(crate) struct CommonArgs {
    /// JSON store snapshot to operate on.
    #[arg(short, long, env = "FOLIO_SEED")]
    pub seed: PathBuf,

    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Language used when none is given (overrides config).
    #[arg(short, long)]
    pub language: Option<String>,

    /// Omit the first root's slug from URL paths (overrides config).
    #[arg(long)]
    pub hide_root_slug: bool,

    /// Enable caching (default: enabled).
    #[arg(long)]
    pub cache: Option<bool>,

    /// Disable caching.
    #[arg(long, conflicts_with = "cache")]
    pub no_cache: bool,

    /// Cache directory (overrides config).
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// A loaded snapshot with the page service on top of it.
pub(crate) struct Session {
    pub pages: Pages,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

impl CommonArgs {
    /// Load configuration and the seed snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the snapshot
    /// cannot be read or is inconsistent.
    pub(crate) fn open(&self, version: &str) -> Result<Session, CliError> {
        let cli_settings = CliSettings {
            cache_enabled: self.resolve_cache_enabled(),
            cache_dir: self.cache_dir.clone(),
            default_language: self.language.clone(),
            hide_root_slug: self.hide_root_slug.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let json = std::fs::read_to_string(&self.seed)?;
        let store = Arc::new(MemoryStore::from_json(&json)?);

        let cache: Box<dyn Cache> = if config.cache_resolved.enabled {
            let cache_version = cache_version(version, &self.seed)?;
            Box::new(FileCache::new(
                config.cache_resolved.dir.clone(),
                &cache_version,
            ))
        } else {
            Box::new(NullCache)
        };

        let pages = Pages::new(
            Arc::clone(&store) as Arc<dyn PageStore>,
            cache.as_ref(),
            pages_config_from(&config),
        )?;
        tracing::info!(seed = %self.seed.display(), "Opened snapshot");

        Ok(Session {
            pages,
            store,
            config,
        })
    }

    /// Resolve `cache_enabled` from --cache/--no-cache flags.
    fn resolve_cache_enabled(&self) -> Option<bool> {
        self.no_cache.then_some(false).or(self.cache)
    }
}

impl Session {
    /// Look up a page named on the command line.
    pub(crate) fn require(&self, id: u64) -> Result<PageNode, CliError> {
        self.pages
            .page(PageId(id))?
            .ok_or_else(|| CliError::Validation(format!("No page with id {id}")))
    }

    /// Display name of a page, or its id if it vanished.
    pub(crate) fn label(&self, id: PageId) -> Result<String, CliError> {
        Ok(match self.pages.page(id)? {
            Some(page) => self.pages.display_name(&page)?,
            None => format!("Page {id}"),
        })
    }
}

/// Cache version for a snapshot: tool version plus the seed's modification
/// time, so editing the seed wipes the file cache.
fn cache_version(version: &str, seed: &Path) -> Result<String, CliError> {
    let modified = std::fs::metadata(seed)?.modified()?;
    let seconds = modified
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    Ok(format!("{version}-{seconds}"))
}

/// Map the file configuration onto the page service configuration.
pub(crate) fn pages_config_from(config: &Config) -> PagesConfig {
    PagesConfig {
        languages: config.languages.available.clone(),
        default_language: config.languages.default.clone(),
        default_template: config.templates.default.clone(),
        templates: config
            .templates
            .available
            .iter()
            .map(|template| TemplateDef {
                name: template.name.clone(),
                label: template.label.clone(),
                placeholders: template.placeholders.clone(),
            })
            .collect(),
        publication: PublicationPolicy {
            show_start_date: config.publication.show_start_date,
            show_end_date: config.publication.show_end_date,
        },
        hide_root_slug: config.urls.hide_root_slug,
        cascade_invalidation: config.cache_resolved.cascade_invalidation,
        default_site: config.sites.default_site,
    }
}
