//! multicam CLI
//!
//! Command-line entry point: builds the pipeline from a config file and
//! drives it until end-of-stream, an engine error, or Ctrl-C.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "multicam")]
#[command(author, version, about = "Multi-stream video inference pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the pipeline from a config file and run it to completion
    Run {
        /// Pipeline config file (YAML or JSON)
        #[arg(value_name = "CONFIG_FILE")]
        config_file: PathBuf,

        /// Override the stream URIs from the config (repeatable)
        #[arg(long = "uri", value_name = "URI")]
        uris: Vec<String>,

        /// Validate the config and build the graph, then exit without playing
        #[arg(long)]
        dry_run: bool,
    },

    /// Download pretrained model bundles
    FetchModels {
        /// Directory to unpack models into
        #[arg(long, default_value = "./models")]
        dir: PathBuf,

        /// Fetch only the named bundle (default: all known bundles)
        #[arg(long)]
        model: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config_file,
            uris,
            dry_run,
        } => commands::run::run(&config_file, uris, dry_run),
        Commands::FetchModels { dir, model } => {
            commands::fetch_models::run(&dir, model.as_deref())
        }
    }
}
