//! Atlas CLI entry point

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "atlas")]
#[command(about = "Multi-language entity catalogue and dependency resolver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the repository and print entities and dependencies
    Index {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (defaults to atlas.toml under the root)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Compare two JSON snapshots
    Diff {
        old: PathBuf,
        new: PathBuf,
    },
    /// List supported languages and extensions
    Languages,
    /// Show version
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Compact,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only output.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("atlas={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Atlas v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Index { format, output, config } => {
            commands::index(&cli.root, format, output.as_deref(), config.as_deref())
        }
        Commands::Diff { old, new } => commands::diff(&old, &new),
        Commands::Languages => commands::languages(),
        Commands::Version => {
            println!("Atlas v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
