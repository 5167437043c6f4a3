//! Roster CLI
//!
//! Fetches roster pages from the registrar and prints them as normalized JSON.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use roster::{
    error::Result,
    models::Config,
    pipeline,
    storage::RosterStore,
    utils::HttpFetcher,
};

/// roster - Course Roster Normalizer
#[derive(Parser, Debug)]
#[command(
    name = "roster",
    version,
    about = "Fetch university course rosters as normalized JSON"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "roster.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a subject's course list, or the subject index when no subject is given
    Fetch {
        /// Subject key (e.g. CS)
        #[arg(short, long)]
        subject: Option<String>,

        /// Term code (default from config)
        #[arg(short, long)]
        term: Option<String>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Normalize a roster XML file from disk
    Normalize {
        /// Roster XML file
        input: PathBuf,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .target(env_logger::Target::Stderr)
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Fetch {
            subject,
            term,
            output,
        } => {
            config.validate()?;
            let fetcher = Arc::new(HttpFetcher::new(&config.roster)?);
            let store = RosterStore::new(&config, fetcher);
            pipeline::run_fetch(
                &store,
                subject.as_deref(),
                term.as_deref(),
                output.as_deref(),
            )
            .await?;
        }

        Command::Normalize { input, output } => {
            pipeline::run_convert(&config, &input, output.as_deref()).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            pipeline::run_validate(&config)?;
        }
    }

    Ok(())
}
