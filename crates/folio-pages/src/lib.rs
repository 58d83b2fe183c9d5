//! Page tree, content resolution and derived caches for Folio.
//!
//! This crate provides:
//! - [`Pages`]: the page service, combining the store, the nested-set
//!   forest and the derived caches
//! - [`PublicationPolicy`]: the publication state machine
//! - [`UrlNormalizer`]: the alias URL normalization seam
//!
//! # Quick Start
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use folio_cache::MemoryCache;
//! use folio_pages::{Pages, PagesConfig};
//! use folio_store::{MemoryStore, PageNode};
//!
//! let pages = Pages::new(Arc::new(MemoryStore::new()), &MemoryCache::new(), PagesConfig::default())?;
//!
//! let home = pages.save_page(PageNode::new())?;
//! let home_id = home.id.ok_or("unsaved")?;
//! let about = pages.save_page(PageNode::new().with_parent(home_id))?;
//! pages.save_content(home_id, "en", "slug", "home")?;
//! pages.save_content(about.id.ok_or("unsaved")?, "en", "slug", "about")?;
//!
//! assert_eq!(pages.complete_slug(&about, None)?, "home/about");
//! # Ok(())
//! # }
//! ```

mod alias;
mod config;
mod content;
mod error;
mod memo;
mod page_cache;
mod pages;
mod publication;

#[cfg(test)]
mod fixtures;

pub use alias::{DefaultNormalizer, UrlNormalizer};
pub use config::{PagesConfig, TemplateDef};
pub use content::{SLUG, TITLE};
pub use error::PageError;
pub use page_cache::{CachedContent, ContentMap, UrlPaths};
pub use pages::Pages;
pub use publication::PublicationPolicy;

// Re-export tree types used in the public API
pub use folio_tree::{Placement, RemoveMode};
