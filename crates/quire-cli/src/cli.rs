//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::auth::AuthCommand;
use crate::commands::fetch::FetchArgs;

/// Command-line client for a quire publishing backend.
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version = env!("QUIRE_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Backend base URL
    #[arg(long, env = "QUIRE_API_URL", default_value = quire_http::DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Session file (defaults to the platform data directory)
    #[arg(long, env = "QUIRE_STORE", global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Session operations
    Auth(AuthCommand),

    /// Send an authorized request to the backend
    Fetch(FetchArgs),
}
