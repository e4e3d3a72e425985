// Tracing initialization for the configured level and output format.
use std::io::IsTerminal;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LogFormat, LoggingConfig};

pub fn init_tracing(logging: &LoggingConfig) {
    // Prefer RUST_LOG from env, otherwise use the configured level.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = match resolve_format(logging.format, std::io::stdout().is_terminal()) {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Human | LogFormat::Auto => registry.with(fmt::layer()).try_init(),
    };
}

/// `Auto` becomes `Human` on a terminal and `Json` otherwise.
fn resolve_format(format: LogFormat, is_terminal: bool) -> LogFormat {
    match format {
        LogFormat::Auto if is_terminal => LogFormat::Human,
        LogFormat::Auto => LogFormat::Json,
        other => other,
    }
}
