pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod proxy;
pub mod server;

pub use config::{AppConfig, ConfigError, LogFormat, RewriteMode};
pub use error::ProxyError;
pub use observability::init_tracing;
pub use proxy::UpstreamClient;
pub use server::{AppState, AuthRouterServer, ServerBuilder, build_app, router};
