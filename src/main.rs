use clap::Parser;
use tcping_api::cli::Cli;
use tcping_api::{config, output};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let env_file = config::load_env_file();
    init_tracing(cli.verbose);

    match env_file {
        Ok(true) => tracing::debug!("loaded .env"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "ignoring .env"),
    }

    if let Err(e) = cli.run().await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `debug` with `--verbose` or outside production.
fn init_tracing(verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config::log_level_for(&config::environment())
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
