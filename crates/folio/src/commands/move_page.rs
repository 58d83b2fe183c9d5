//! `folio move` command implementation.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use folio_pages::Placement;
use folio_store::PageId;

use super::CommonArgs;
use crate::error::CliError;
use crate::output::Output;

/// Where to put the moved page, relative to the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum PlacementArg {
    /// New last tree (no anchor).
    Root,
    /// First child of the anchor.
    FirstChild,
    /// Last child of the anchor.
    LastChild,
    /// Sibling right before the anchor.
    Before,
    /// Sibling right after the anchor.
    After,
}

impl PlacementArg {
    /// Combine with the anchor given on the command line.
    fn with_anchor(self, anchor: Option<u64>) -> Result<Placement, CliError> {
        let anchored = |build: fn(PageId) -> Placement| {
            anchor
                .map(|id| build(PageId(id)))
                .ok_or_else(|| CliError::Validation(format!("{self:?} needs an anchor page")))
        };
        match self {
            Self::Root if anchor.is_some() => Err(CliError::Validation(
                "Root placement takes no anchor page".to_owned(),
            )),
            Self::Root => Ok(Placement::Root),
            Self::FirstChild => anchored(Placement::FirstChildOf),
            Self::LastChild => anchored(Placement::LastChildOf),
            Self::Before => anchored(Placement::Before),
            Self::After => anchored(Placement::After),
        }
    }
}

/// Arguments for the move command.
#[derive(Args)]
pub(crate) struct MoveArgs {
    /// Page to move.
    id: u64,

    /// Placement relative to the anchor.
    #[arg(value_enum)]
    placement: PlacementArg,

    /// Anchor page id.
    anchor: Option<u64>,

    /// Write the updated snapshot here instead of back to the seed.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl MoveArgs {
    /// Execute the move command.
    ///
    /// # Errors
    ///
    /// Returns an error if the placement is invalid, the move is rejected, or
    /// the snapshot cannot be written.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();
        let placement = self.placement.with_anchor(self.anchor)?;
        let session = self.common.open(version)?;
        let page = session.require(self.id)?;
        let Some(id) = page.id else {
            return Err(CliError::Validation(format!("Page {} has no id", self.id)));
        };

        session.pages.move_page(id, placement)?;

        let target = self.output.unwrap_or(self.common.seed);
        let json = serde_json::to_string_pretty(&session.store.snapshot())?;
        std::fs::write(&target, json)?;

        let path = session.pages.complete_slug(&page, None)?;
        output.success(&format!(
            "Moved {} [{id}] to /{path}",
            session.pages.display_name(&page)?
        ));
        output.info(&format!("Snapshot written to {}", target.display()));
        Ok(())
    }
}
