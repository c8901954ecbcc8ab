//! catena CLI tool
//!
//! Command-line interface for building static linked catalogs from
//! normalized metadata records.
//!
//! ## Commands
//!
//! - `build <data_dir>`: run the full pipeline into an output directory
//! - `validate <data_dir>`: check referential integrity without writing
//!
//! Referential integrity errors are all printed before the process exits
//! non-zero; internal consistency faults are reported with a
//! distinguishable diagnostic since they indicate an engine bug rather
//! than bad input.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use catena_core::{config::BuildConfig, pipeline, CatenaError};

#[derive(Parser)]
#[command(name = "catena")]
#[command(author, version, about = "Build a browsable static catalog from metadata records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the catalog tree into an output directory
    Build {
        /// Directory holding themes/, projects/, products/, variables/
        data_dir: PathBuf,

        /// Output directory for the generated catalog
        #[arg(short, long, default_value = "dist")]
        out_dir: PathBuf,

        /// Absolute URL prefix for every href (tree-relative hrefs when
        /// omitted)
        #[arg(short, long)]
        root_href: Option<String>,

        /// Emit compact JSON instead of pretty-printed documents
        #[arg(long)]
        compact: bool,

        /// Skip the companion ISO metadata artifacts
        #[arg(long)]
        no_iso: bool,
    },

    /// Check referential integrity of a data directory without writing
    Validate {
        /// Directory holding themes/, projects/, products/, variables/
        data_dir: PathBuf,
    },
}

fn report(err: CatenaError) -> ExitCode {
    match err {
        CatenaError::Integrity(errors) => {
            for error in &errors {
                eprintln!("integrity error: {error}");
            }
            eprintln!("build aborted: {} integrity error(s)", errors.len());
        }
        CatenaError::Internal(msg) => {
            eprintln!("internal consistency fault (engine bug, not bad input): {msg}");
        }
        other => eprintln!("error: {other}"),
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            data_dir,
            out_dir,
            root_href,
            compact,
            no_iso,
        } => {
            let config = BuildConfig {
                root_href,
                pretty_print: !compact,
                add_iso: !no_iso,
            };
            match pipeline::build(&data_dir, &out_dir, &config) {
                Ok(stats) => {
                    println!(
                        "built {} catalog nodes, {} files under {}",
                        stats.nodes,
                        stats.files_written,
                        out_dir.display()
                    );
                    ExitCode::SUCCESS
                }
                Err(err) => report(err),
            }
        }

        Commands::Validate { data_dir } => match pipeline::validate(&data_dir) {
            Ok((store, _)) => {
                println!(
                    "ok: {} themes, {} projects, {} products, {} variables",
                    store.themes.len(),
                    store.projects.len(),
                    store.products.len(),
                    store.variables.len()
                );
                ExitCode::SUCCESS
            }
            Err(err) => report(err),
        },
    }
}
