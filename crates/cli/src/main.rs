//! slotwise CLI: the main entry point.
//!
//! Commands:
//! - `demo`: Scripted hardware-support session with retrieval
//! - `replay`: Feed a JSON transcript through a context manager
//! - `config`: Print the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "slotwise",
    about = "slotwise: priority-aware context window manager",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted hardware-support session
    Demo {
        /// Override the slot capacity
        #[arg(short, long)]
        capacity: Option<usize>,
    },

    /// Replay a JSON transcript through the context manager
    Replay {
        /// Path to a JSON array of steps
        file: PathBuf,

        /// Override the slot capacity
        #[arg(short, long)]
        capacity: Option<usize>,

        /// Print `ROLE: content` lines instead of JSON messages
        #[arg(short, long)]
        transcript: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Read this file instead of ~/.slotwise/config.toml
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Demo { capacity } => commands::demo::run(capacity).await?,
        Commands::Replay {
            file,
            capacity,
            transcript,
        } => commands::replay::run(&file, capacity, transcript).await?,
        Commands::Config { path } => commands::config_cmd::show(path.as_deref())?,
    }

    Ok(())
}
