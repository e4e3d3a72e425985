use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Errors raised while loading or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Location of the per-user policy document
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port must be > 0"));
        }
        if self.upstream.target.is_empty() {
            return Err(invalid(
                "please set '--target' to the address of your openHAB instance, e.g. 'http://openhab:8080'",
            ));
        }
        self.upstream_url()?;
        if !self.upstream.readiness_path.starts_with('/') {
            return Err(invalid("upstream.readiness_path must start with '/'"));
        }
        if self.upstream.connect_timeout_ms == 0 || self.upstream.readiness_timeout_ms == 0 {
            return Err(invalid("upstream timeouts must be > 0"));
        }
        if self.policy.path.as_os_str().is_empty() {
            return Err(invalid(
                "please set '--config' to the path of your policy YAML file",
            ));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(invalid(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }

    /// Parsed upstream base URL; only `http` and `https` are accepted.
    pub fn upstream_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.upstream.target).map_err(|_| {
            invalid(format!(
                "unable to parse target address '{}'",
                self.upstream.target
            ))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!(
                "target address '{}' uses unsupported scheme '{other}'",
                self.upstream.target
            ))),
        }
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    80
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the openHAB instance, e.g. `http://openhab:8080`
    #[serde(default)]
    pub target: String,
    /// Path probed by the readiness endpoint
    #[serde(default = "default_readiness_path")]
    pub readiness_path: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_readiness_timeout_ms")]
    pub readiness_timeout_ms: u64,
}

fn default_readiness_path() -> String {
    "/rest/".into()
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}
fn default_readiness_timeout_ms() -> u64 {
    5_000
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            readiness_path: default_readiness_path(),
            connect_timeout_ms: default_connect_timeout_ms(),
            readiness_timeout_ms: default_readiness_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PolicyConfig {
    #[serde(default)]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RouterConfig {
    #[serde(default)]
    pub rewrite_mode: RewriteMode,
}

/// What to do with a request whose target was rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RewriteMode {
    /// Forward the rewritten request; the client never sees the change.
    #[default]
    Forward,
    /// Answer `308 Permanent Redirect` pointing at the rewritten target.
    Redirect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable on a terminal, JSON otherwise.
    #[default]
    Auto,
    Human,
    Json,
}

pub mod loader {
    use super::{AppConfig, ConfigError};
    use config::{Config, Environment, File};
    use std::path::Path;

    /// Build settings from an optional TOML file and `AUTHROUTER__*`
    /// environment variables, e.g. `AUTHROUTER__SERVER__PORT=8081`.
    ///
    /// The result is not validated; command-line overrides are applied
    /// on top before [`AppConfig::validate`] runs.
    pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();
        if let Some(p) = path {
            builder = builder.add_source(File::from(p).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("AUTHROUTER")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.upstream.target = "http://openhab:8080".into();
        cfg.policy.path = PathBuf::from("policy.yaml");
        cfg
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 80);
        assert_eq!(cfg.upstream.readiness_path, "/rest/");
        assert_eq!(cfg.router.rewrite_mode, RewriteMode::Forward);
        assert_eq!(cfg.logging.format, LogFormat::Auto);
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_target_required() {
        let mut cfg = valid();
        cfg.upstream.target.clear();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("--target"));
    }

    #[test]
    fn test_target_must_be_http() {
        let mut cfg = valid();
        cfg.upstream.target = "not a url".into();
        assert!(cfg.validate().unwrap_err().to_string().contains("unable to parse"));

        cfg.upstream.target = "ftp://openhab".into();
        assert!(cfg.validate().unwrap_err().to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_policy_path_required() {
        let mut cfg = valid();
        cfg.policy.path = PathBuf::new();
        assert!(cfg.validate().unwrap_err().to_string().contains("--config"));
    }

    #[test]
    fn test_log_level_checked() {
        let mut cfg = valid();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
        cfg.logging.level = "DEBUG".into();
        assert!(cfg.validate().is_ok());
    }
}
