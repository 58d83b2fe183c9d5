//! `folio show` command implementation.

use clap::Args;

use super::CommonArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the show command.
#[derive(Args)]
pub(crate) struct ShowArgs {
    /// Page id.
    id: u64,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ShowArgs {
    /// Execute the show command.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded or the page is
    /// unknown.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();
        let session = self.common.open(version)?;
        let page = session.require(self.id)?;
        let pages = &session.pages;

        output.highlight(&pages.display_name(&page)?);
        output.data(&format!("Status: {:?}", page.status));
        output.data(&format!("Shown as: {:?}", pages.calculated_status(&page)));
        output.data(&format!("Visible: {}", pages.is_visible(&page)));
        output.data(&format!("Created: {}", page.creation_date.to_rfc3339()));
        if let Some(date) = page.publication_date {
            output.data(&format!("Published: {}", date.to_rfc3339()));
        }
        if let Some(date) = page.publication_end_date {
            output.data(&format!("Publication ends: {}", date.to_rfc3339()));
        }
        if let Some(date) = page.freeze_date {
            output.data(&format!("Frozen at: {}", date.to_rfc3339()));
        }

        let template = pages.template_of(&page)?;
        output.data(&format!(
            "Template: {template} ({})",
            pages.template_label(&page)?
        ));

        let languages = pages.languages(&page)?;
        if languages.is_empty() {
            output.warning("No content");
        }
        for language in &languages {
            let title = pages.title(&page, Some(language))?.unwrap_or_default();
            let path = pages.complete_slug(&page, Some(language))?;
            output.data_with_note(&format!("[{language}] {title}"), &format!("/{path}"));
        }

        if let Some(target) = pages.redirect_target(&page)? {
            let id = target.id.map(|id| id.to_string()).unwrap_or_default();
            output.data(&format!("Redirects to: {} [{id}]", pages.display_name(&target)?));
        } else if let Some(url) = &page.redirect_to_url {
            output.data(&format!("Redirects to: {url}"));
        }
        if session.config.languages.available.len() > languages.len() && !languages.is_empty() {
            output.info("Missing languages fall back in configured order");
        }

        Ok(())
    }
}
