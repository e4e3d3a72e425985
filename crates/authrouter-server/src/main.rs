use clap::Parser;

use authrouter_core::PolicyModel;
use authrouter_server::cli::Cli;
use authrouter_server::config::loader::load_config;
use authrouter_server::{ServerBuilder, init_tracing};

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();

    let mut cfg = match load_config(cli.settings.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    cli.apply(&mut cfg);
    if let Err(e) = cfg.validate() {
        eprintln!("invalid options, exiting: {e}");
        std::process::exit(2);
    }

    init_tracing(&cfg.logging);
    tracing::debug!(config = ?cfg, "Processed configuration");

    let policy = match PolicyModel::from_path(&cfg.policy.path) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "failed to load policy, exiting");
            std::process::exit(2);
        }
    };

    let server = match ServerBuilder::new(cfg, policy).build() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Server initialization failed");
            std::process::exit(2);
        }
    };

    if let Err(err) = server.run().await {
        tracing::error!(error = %err, "failed serving");
        std::process::exit(1);
    }
}
