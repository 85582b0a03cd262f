//! couchconf CLI
//!
//! Command-line tools for CouchDB-backed configuration.
//!
//! # Commands
//!
//! - `watch` - Load services, then print every change until the feed fails
//! - `fetch` - Load services once and print them

mod commands;

use clap::{Parser, Subcommand};
use couchconf_source::DEFAULT_NAMESPACE;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// couchconf command-line tools.
#[derive(Parser)]
#[command(name = "couchconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load services, then print changes until interrupted or the feed fails
    Watch {
        /// Namespace to attach the source under
        #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },

    /// Load services once and print them
    Fetch {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Watch { namespace } => {
            let path = cli.config.ok_or("Configuration file required for watch")?;
            commands::watch::run(&path, &namespace).await?;
        }
        Commands::Fetch { format } => {
            let path = cli.config.ok_or("Configuration file required for fetch")?;
            commands::fetch::run(&path, &format).await?;
        }
        Commands::Version => {
            println!("couchconf CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
