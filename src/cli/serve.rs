//! Serve subcommand implementation.
//!
//! Handles `tcping-api serve`, the default when no subcommand is given.

use crate::config::Settings;
use crate::error::CliResult;
use crate::output;
use crate::server;
use clap::Parser;

/// Run the HTTP service.
#[derive(Parser, Debug, Default)]
pub struct ServeCommand {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(&self, quiet: bool) -> CliResult<()> {
        if !quiet {
            output::print_env_check(|var| {
                std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false)
            });
        }

        let mut settings = Settings::from_env()?;
        if let Some(port) = self.port {
            settings = settings.with_port(port);
        }

        if !quiet {
            output::print_startup_summary(&settings);
            if settings.push.is_none() {
                output::print_warning("metrics push is not configured");
            }
            output::print_info("Press Ctrl+C to stop");
        }

        server::serve(settings).await?;

        if !quiet {
            output::print_success("Server stopped");
        }
        Ok(())
    }
}
