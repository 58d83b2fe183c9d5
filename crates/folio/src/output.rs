//! Colored terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Command results go to stdout so they can be piped; status messages go to
/// stderr.
pub(crate) struct Output {
    results: Term,
    status: Term,
    heading: Style,
    note: Style,
    ok: Style,
    warn: Style,
    fail: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            results: Term::stdout(),
            status: Term::stderr(),
            heading: Style::new().cyan().bold(),
            note: Style::new().dim(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
        }
    }

    fn write(term: &Term, line: &str) {
        // A closed pipe is not worth failing the command over.
        let _ = term.write_line(line);
    }

    /// Print a result line.
    pub(crate) fn data(&self, msg: &str) {
        Self::write(&self.results, msg);
    }

    /// Print a result line followed by a dimmed note.
    pub(crate) fn data_with_note(&self, msg: &str, note: &str) {
        Self::write(&self.results, &format!("{msg} {}", self.note.apply_to(note)));
    }

    /// Print a result heading (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) {
        Self::write(&self.results, &self.heading.apply_to(msg).to_string());
    }

    /// Print a status message.
    pub(crate) fn info(&self, msg: &str) {
        Self::write(&self.status, msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        Self::write(&self.status, &self.ok.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        Self::write(&self.status, &self.warn.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        Self::write(&self.status, &self.fail.apply_to(msg).to_string());
    }
}
