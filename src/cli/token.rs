//! Token subcommand implementation.
//!
//! Handles `tcping-api token` for issuing bearer tokens and generating
//! new signing secrets.

use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::output;
use crate::token::{
    generate_api_key, generate_prefixed_api_key, TokenIssuer, DEFAULT_EXPIRY_MINUTES,
    DEFAULT_ISSUER, DEFAULT_SERVICE_DAYS,
};
use clap::{Parser, Subcommand};

/// Issue tokens and secrets.
#[derive(Parser, Debug)]
pub struct TokenCommand {
    #[command(subcommand)]
    pub action: TokenAction,
}

/// Token actions.
#[derive(Subcommand, Debug)]
pub enum TokenAction {
    /// Short-lived client token
    Jwt {
        /// Issuer claim
        #[arg(short, long, default_value = DEFAULT_ISSUER)]
        issuer: String,

        /// Minutes until expiry
        #[arg(short, long, default_value_t = DEFAULT_EXPIRY_MINUTES)]
        minutes: i64,
    },

    /// Long-lived token for a named service
    Service {
        /// Service name, used as the issuer claim
        #[arg(short, long)]
        name: String,

        /// Days until expiry
        #[arg(short, long, default_value_t = DEFAULT_SERVICE_DAYS)]
        days: i64,
    },

    /// Token that never expires
    Permanent {
        /// Service name, used as the issuer claim
        #[arg(short, long)]
        name: String,

        /// Confirm issuing a token that cannot expire
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Generate a new INTERNAL_API_KEY value
    ApiKey {
        /// Add the `sk-proj-` prefix
        #[arg(long)]
        prefixed: bool,
    },
}

impl TokenCommand {
    /// Execute the token command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        if let TokenAction::ApiKey { prefixed } = &self.action {
            let key = if *prefixed {
                generate_prefixed_api_key()
            } else {
                generate_api_key()
            };
            if quiet {
                println!("{}", key);
            } else {
                output::print_credential("INTERNAL_API_KEY", &key, Some("store this in your .env file"));
            }
            return Ok(());
        }

        self.check()?;
        let settings = Settings::from_env()?;
        let token = self.issue(&TokenIssuer::new(&settings.secret))?;

        if quiet {
            println!("{}", token);
            return Ok(());
        }
        output::print_credential("Bearer token", &token, Some(self.expiry_note().as_str()));
        if matches!(self.action, TokenAction::Permanent { .. }) {
            output::print_warning("this token never expires; rotate INTERNAL_API_KEY to revoke it");
        }
        Ok(())
    }

    /// Reject arguments that would produce an unusable or unconfirmed token.
    fn check(&self) -> CliResult<()> {
        match &self.action {
            TokenAction::Jwt { minutes, .. } if *minutes <= 0 => {
                Err(CliError::Other("--minutes must be positive".to_string()))
            }
            TokenAction::Service { days, .. } if *days <= 0 => {
                Err(CliError::Other("--days must be positive".to_string()))
            }
            TokenAction::Service { name, .. } | TokenAction::Permanent { name, .. }
                if name.trim().is_empty() =>
            {
                Err(CliError::Other("--name must not be empty".to_string()))
            }
            TokenAction::Permanent { yes: false, .. } => {
                output::print_warning("permanent tokens stay valid until the signing secret changes");
                Err(CliError::Other("pass --yes to issue a permanent token".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn issue(&self, issuer: &TokenIssuer) -> CliResult<String> {
        let token = match &self.action {
            TokenAction::Jwt { issuer: iss, minutes } => issuer.short_lived(Some(iss.as_str()), *minutes)?,
            TokenAction::Service { name, days } => issuer.service(name, *days)?,
            TokenAction::Permanent { name, .. } => issuer.permanent(name)?,
            TokenAction::ApiKey { .. } => {
                return Err(CliError::Other("api keys are not signed tokens".to_string()))
            }
        };
        Ok(token)
    }

    fn expiry_note(&self) -> String {
        match &self.action {
            TokenAction::Jwt { minutes, .. } => format!("expires in {} minute(s)", minutes),
            TokenAction::Service { days, .. } => format!("expires in {} day(s)", days),
            _ => "never expires".to_string(),
        }
    }
}
