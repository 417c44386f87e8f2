//! CLI subcommand definitions and handlers.
//!
//! - `tcping-api serve` - Run the HTTP service (default)
//! - `tcping-api token jwt|service|permanent|api-key` - Issue credentials

mod serve;
mod token;

pub use serve::ServeCommand;
pub use token::{TokenAction, TokenCommand};

use crate::error::CliResult;
use clap::{Parser, Subcommand};

/// tcping-api - Authenticated TCP latency probe service.
///
/// Measures connect latency to IPv4 hosts over a small JSON API and
/// issues the bearer tokens and secrets the API expects.
#[derive(Parser, Debug)]
#[command(name = "tcping-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Authenticated TCP latency probe service", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    #[command(alias = "s")]
    Serve(ServeCommand),

    /// Issue tokens and secrets
    #[command(alias = "t")]
    Token(TokenCommand),
}

impl Cli {
    /// Dispatch to the selected subcommand.
    pub async fn run(self) -> CliResult<()> {
        match self.command {
            Some(Commands::Serve(cmd)) => cmd.execute(self.quiet).await,
            Some(Commands::Token(cmd)) => cmd.execute(self.quiet),
            None => ServeCommand::default().execute(self.quiet).await,
        }
    }
}
