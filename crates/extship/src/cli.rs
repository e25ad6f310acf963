//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use extship_core::config::{ENV_API_BASE_URL, ENV_API_KEY, ENV_MANAGEMENT_TOKEN};

/// extship - publish built bundles as CMS extensions
#[derive(Parser, Debug)]
#[command(name = "extship")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy the bundle described by a deployment descriptor
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the deployment descriptor (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub input: Utf8PathBuf,

    /// CMS management API base URL
    #[arg(long, env = ENV_API_BASE_URL, value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Stack API key
    #[arg(long, env = ENV_API_KEY, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Management token
    #[arg(long, env = ENV_MANAGEMENT_TOKEN, hide_env_values = true)]
    pub management_token: Option<String>,
}
