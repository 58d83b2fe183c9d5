//! CLI error types.

use folio_config::ConfigError;
use folio_pages::PageError;
use folio_store::StoreError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Page(#[from] PageError),

    #[error("Failed to write snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),
}
