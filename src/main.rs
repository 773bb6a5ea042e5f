//! quaver - a guild-aware voice and utility chat bot.
//!
//! Plays local files and resolved URLs into voice channels, rolls dice,
//! renders LaTeX, and answers configured autoreplies, all driven through
//! pluggable gateways (console by default).

mod bus;
mod cli;
mod commands;
mod config;
mod errors;
mod gateway;
mod media;
mod render;
mod runtime;
mod utils;
mod voice;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use clap::{Parser, Subcommand};

pub(crate) const VERSION: &str = "0.1.0";

#[derive(Parser)]
#[command(name = "quaver", about = "quaver - voice channel bot", version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize quaver configuration.
    Onboard {
        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
    /// Run the bot (gateways + command dispatch).
    Run {
        /// Verbose logging.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show quaver status.
    Status,
}

fn main() {
    let cli = Cli::parse();

    // -v raises quaver's own level; RUST_LOG still overrides everything.
    let default_filter = match &cli.command {
        Commands::Run { verbose: true } => "info,quaver=debug",
        _ => "info",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();

    match cli.command {
        Commands::Onboard { force } => cli::cmd_onboard(force),
        Commands::Run { verbose } => cli::cmd_run(verbose),
        Commands::Status => cli::cmd_status(),
    }
}

// ============================================================================
// Tests
// ============================================================================
