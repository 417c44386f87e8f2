//! Terminal output for the CLI.
//!
//! Server logs go through `tracing`; this module is only for the
//! human-facing messages printed by CLI commands.

use crate::config::{Settings, REQUIRED_VARS};
use crate::prober::MAX_CONCURRENT_CONNECTIONS;
use console::style;

/// Print a check mark or cross for each required environment variable.
pub fn print_env_check(present: impl Fn(&str) -> bool) {
    println!("{}", style("Environment").bold());
    for var in REQUIRED_VARS {
        if present(var) {
            println!("  {} {}", style("✓").green().bold(), var);
        } else {
            println!("  {} {}", style("✗").red().bold(), var);
        }
    }
}

/// Print the service banner and effective configuration.
pub fn print_startup_summary(settings: &Settings) {
    let probe = &settings.probe;

    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("tcping-api").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Environment: {}", style("•").dim(), style(&settings.env).yellow());
    println!(
        "{} Listening on: {}",
        style("•").dim(),
        style(format!("0.0.0.0:{}", settings.port)).white().bold()
    );
    println!(
        "{} Probe: ports {}, {} attempts, {}ms timeout, {}ms delay",
        style("•").dim(),
        style(&probe.ports).white().bold(),
        probe.attempts,
        probe.timeout.as_millis(),
        probe.delay.as_millis()
    );
    println!(
        "{} Max concurrent connections per probe: {} (worst case {}ms)",
        style("•").dim(),
        MAX_CONCURRENT_CONNECTIONS,
        probe.worst_case_duration().as_millis()
    );
    match &settings.push {
        Some(push) => println!(
            "{} Metrics push: {} every {}ms",
            style("•").dim(),
            push.url,
            push.interval.as_millis()
        ),
        None => println!("{} Metrics push: {}", style("•").dim(), style("disabled").dim()),
    }

    println!();
}

/// Print a freshly issued credential with a label and optional note.
pub fn print_credential(label: &str, value: &str, note: Option<&str>) {
    println!("{}", style(label).bold());
    println!("{}", style(value).green());
    if let Some(note) = note {
        println!("{} {}", style("•").dim(), style(note).dim());
    }
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
