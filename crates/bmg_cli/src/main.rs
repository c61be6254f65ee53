//! bmgtool
//!
//! Command-line tools for BMG message containers.
//!
//! # Commands
//!
//! - `inspect` - Display header, section and string statistics
//! - `verify` - Rebuild without edits and report byte differences
//! - `export` - Dump entry and index strings to JSON
//! - `patch` - Apply JSON text edits and write a rebuilt container

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// BMG container command-line tools.
#[derive(Parser)]
#[command(name = "bmgtool")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display header, section and string statistics
    Inspect {
        /// Container file
        file: PathBuf,

        /// List every entry with its text
        #[arg(short, long)]
        entries: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Parse and rebuild without edits, reporting any byte differences
    Verify {
        /// Container file
        file: PathBuf,
    },

    /// Dump entry and index strings to JSON
    Export {
        /// Container file
        file: PathBuf,

        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply JSON text edits and write a rebuilt container
    Patch {
        /// Container file
        file: PathBuf,

        /// JSON edits, in the shape produced by export
        #[arg(short, long)]
        edits: PathBuf,

        /// Where to write the rebuilt container
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect {
            file,
            entries,
            format,
        } => {
            commands::inspect::run(&file, entries, &format)?;
        }
        Commands::Verify { file } => {
            commands::verify::run(&file)?;
        }
        Commands::Export { file, output } => {
            commands::export::run(&file, output.as_deref())?;
        }
        Commands::Patch {
            file,
            edits,
            output,
        } => {
            commands::patch::run(&file, &edits, &output)?;
        }
        Commands::Version => {
            println!("bmgtool v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
