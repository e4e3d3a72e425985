use std::path::PathBuf;

use clap::Parser;

use crate::config::{AppConfig, LogFormat, RewriteMode};

/// Command-line flags. Every flag overrides the settings file and the
/// `AUTHROUTER__*` environment.
#[derive(Debug, Parser)]
#[command(name = "authrouter")]
#[command(about = "Per-user authorization proxy for openHAB")]
#[command(version)]
pub struct Cli {
    /// Optional TOML settings file
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Host to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Address of your openHAB instance, e.g. 'http://openhab:8080'
    #[arg(long)]
    pub target: Option<String>,

    /// Path to the policy YAML file
    #[arg(long = "config")]
    pub policy: Option<PathBuf>,

    /// Log level as in [error|warn|info|debug|trace]
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Forward rewritten requests or redirect the client to them
    #[arg(long, value_enum)]
    pub rewrite_mode: Option<RewriteMode>,
}

impl Cli {
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(host) = &self.host {
            cfg.server.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(target) = &self.target {
            cfg.upstream.target = target.clone();
        }
        if let Some(policy) = &self.policy {
            cfg.policy.path = policy.clone();
        }
        if let Some(level) = &self.log_level {
            cfg.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            cfg.logging.format = format;
        }
        if let Some(mode) = self.rewrite_mode {
            cfg.router.rewrite_mode = mode;
        }
    }
}
