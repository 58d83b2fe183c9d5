//! Folio CLI - page trees over a JSON store snapshot.
//!
//! Provides commands for:
//! - `tree`: Print every page tree
//! - `show`: Describe one page
//! - `book`: Previous and next page in reading order
//! - `content`: Resolve a content slot
//! - `alias`: Resolve an alias URL
//! - `move`: Move a page and write the snapshot back

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AliasArgs, BookArgs, ContentArgs, MoveArgs, ShowArgs, TreeArgs};
use output::Output;

/// Application version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Folio - hierarchical pages with multilingual content.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every page tree with statuses and URL paths.
    Tree(TreeArgs),
    /// Describe one page.
    Show(ShowArgs),
    /// Show the previous and next page in reading order.
    Book(BookArgs),
    /// Resolve a content slot of a page.
    Content(ContentArgs),
    /// Resolve an alias URL.
    Alias(AliasArgs),
    /// Move a page and save the snapshot.
    Move(MoveArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Tree(args) => args.common.verbose,
            Self::Show(args) => args.common.verbose,
            Self::Book(args) => args.common.verbose,
            Self::Content(args) => args.common.verbose,
            Self::Alias(args) => args.common.verbose,
            Self::Move(args) => args.common.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Tree(args) => args.execute(VERSION),
        Commands::Show(args) => args.execute(VERSION),
        Commands::Book(args) => args.execute(VERSION),
        Commands::Content(args) => args.execute(VERSION),
        Commands::Alias(args) => args.execute(VERSION),
        Commands::Move(args) => args.execute(VERSION),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
