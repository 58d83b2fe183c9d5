//! `folio content` command implementation.

use clap::Args;

use super::CommonArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the content command.
#[derive(Args)]
pub(crate) struct ContentArgs {
    /// Page id.
    id: u64,

    /// Content type (placeholder name), e.g. `title` or `body`.
    content_type: String,

    /// Only look in the requested language.
    #[arg(long)]
    no_fallback: bool,

    /// Print every revision instead of the current body.
    #[arg(long)]
    history: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ContentArgs {
    /// Execute the content command.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded or the page is
    /// unknown.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();
        let session = self.common.open(version)?;
        let page = session.require(self.id)?;

        if self.history {
            let language = session.config.languages.default.as_str();
            let revisions = session.pages.history(&page, language, &self.content_type)?;
            if revisions.is_empty() {
                output.warning("No revisions");
            }
            for revision in revisions {
                output.data_with_note(&revision.body, &revision.creation_date.to_rfc3339());
            }
            return Ok(());
        }

        match session
            .pages
            .resolve(&page, None, &self.content_type, !self.no_fallback)?
        {
            Some(body) => output.data(&body),
            None => output.warning(&format!(
                "No {} content for page {}",
                self.content_type, self.id
            )),
        }

        Ok(())
    }
}
