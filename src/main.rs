//! # Report Archive CLI (`reparc`)
//!
//! The `reparc` binary converts a folder of DOCX/PDF status reports into the
//! JSON catalog the archive site serves, and provides maintenance commands
//! for inspecting and patching that catalog.
//!
//! ## Usage
//!
//! ```bash
//! reparc --config ./config/reparc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `reparc ingest` | Run a full conversion of the source folder |
//! | `reparc stats` | Summarize the written catalog |
//! | `reparc repair` | Re-extract configured problem PDFs into the catalog |
//!
//! ## Examples
//!
//! ```bash
//! # See what a run would pick up, without extracting or writing
//! reparc ingest --dry-run
//!
//! # Full conversion
//! reparc ingest
//!
//! # Patch the known-bad email-forward PDFs
//! reparc repair
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use report_archive::{config, ingest, repair, stats};

/// Report Archive CLI — converts a folder of DOCX/PDF status reports into a
/// sorted JSON catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/reparc.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "reparc",
    about = "Report Archive — converts a folder of DOCX/PDF status reports into a sorted JSON catalog",
    version,
    long_about = "Report Archive reads every supported document in a source folder, classifies \
    each file's period from its name, extracts and cleans its content, deduplicates by period, \
    and writes one sorted JSON catalog for the archive site."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/reparc.toml`. Source folder, output path,
    /// exclusions, and repair targets are read from this file.
    #[arg(long, global = true, default_value = "./config/reparc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run one full ingestion pass over the source folder.
    ///
    /// Classifies every `.docx`/`.pdf` by filename, extracts and cleans
    /// content, deduplicates by period, and writes the catalog. Per-file
    /// problems are logged and skipped; the run only aborts if the source
    /// folder is unreadable or the output cannot be written.
    Ingest {
        /// Enumerate and classify only — print what would be ingested
        /// without extracting or writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of accepted files to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a summary of the written catalog.
    ///
    /// Shows totals, cadence and per-year breakdowns, and the newest period.
    Stats,

    /// Re-extract configured problem PDFs into an existing catalog.
    ///
    /// For each `[[repair.targets]]` entry, strips email forwarding headers
    /// from the PDF text, rebuilds heading/list markup, and patches the
    /// matching record in place.
    Repair,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest { dry_run, limit } => {
            ingest::run_ingest(&cfg, dry_run, limit)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Repair => {
            repair::run_repair(&cfg)?;
        }
    }

    Ok(())
}
