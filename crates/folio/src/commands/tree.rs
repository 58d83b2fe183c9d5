//! `folio tree` command implementation.

use clap::Args;

use super::CommonArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

impl TreeArgs {
    /// Execute the tree command.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();
        let session = self.common.open(version)?;
        let forest = session.pages.forest();

        if forest.is_empty() {
            output.warning("No pages");
            return Ok(());
        }

        for id in forest.iter() {
            let Some(page) = session.pages.page(id)? else {
                continue;
            };
            let level = forest.position(id).map_or(0, |position| position.level);
            let indent = "  ".repeat(usize::try_from(level).unwrap_or_default());
            let name = session.pages.display_name(&page)?;
            let status = session.pages.calculated_status(&page);
            let path = session.pages.complete_slug(&page, None)?;
            output.data_with_note(
                &format!("{indent}{name} [{id}]"),
                &format!("{status:?} /{path}"),
            );
        }

        Ok(())
    }
}
