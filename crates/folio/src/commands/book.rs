//! `folio book` command implementation.

use clap::Args;

use super::CommonArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the book command.
#[derive(Args)]
pub(crate) struct BookArgs {
    /// Page id.
    id: u64,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl BookArgs {
    /// Execute the book command.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded or the page is
    /// unknown.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();
        let session = self.common.open(version)?;
        let page = session.require(self.id)?;
        let Some(id) = page.id else {
            return Err(CliError::Validation(format!("Page {} has no id", self.id)));
        };

        let neighbours = [
            ("Previous", session.pages.previous_in_book(id)),
            ("Next", session.pages.next_in_book(id)),
        ];
        for (direction, neighbour) in neighbours {
            match neighbour {
                Some(other) => output.data(&format!(
                    "{direction}: {} [{other}]",
                    session.label(other)?
                )),
                None => output.data(&format!("{direction}: -")),
            }
        }

        Ok(())
    }
}
