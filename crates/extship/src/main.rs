//! extship CLI - publish built bundles as CMS extensions
//!
//! This is the main entry point for the extship command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    // Credentials may live in a .env file; existing variables take precedence
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args, cli.verbose).await,
    }
}

/// Initialize tracing with appropriate verbosity
///
/// Without `-v` only errors are logged; the command prints its own final line.
pub(crate) fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("error"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
