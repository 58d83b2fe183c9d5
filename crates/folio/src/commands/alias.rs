//! `folio alias` command implementation.

use clap::Args;

use super::CommonArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the alias command.
#[derive(Args)]
pub(crate) struct AliasArgs {
    /// Alias URL, e.g. `/old/about`.
    url: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl AliasArgs {
    /// Execute the alias command.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();
        let session = self.common.open(version)?;

        let target = match session.pages.resolve_alias(&self.url)? {
            Some(id) => session.pages.page(id)?,
            None => None,
        };
        let Some(page) = target else {
            output.warning(&format!("No page behind alias {}", self.url));
            return Ok(());
        };

        let path = session.pages.complete_slug(&page, None)?;
        output.data_with_note(
            &format!("/{path}"),
            &session.pages.display_name(&page)?,
        );
        Ok(())
    }
}
