use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware, routing::any};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use authrouter_core::{PolicyEvaluator, PolicyModel};

use crate::config::{AppConfig, RewriteMode};
use crate::proxy::UpstreamClient;
use crate::{handlers, middleware as app_middleware};

/// State shared by all request handlers.
///
/// Everything in here is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub evaluator: PolicyEvaluator,
    pub upstream: UpstreamClient,
    pub rewrite_mode: RewriteMode,
    pub readiness: ReadinessProbe,
}

#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    pub path: String,
    pub timeout: Duration,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig, policy: PolicyModel) -> anyhow::Result<Self> {
        let upstream = UpstreamClient::new(cfg.upstream_url()?, cfg.upstream.connect_timeout())?;
        Ok(Self {
            evaluator: PolicyEvaluator::new(Arc::new(policy)),
            upstream,
            rewrite_mode: cfg.router.rewrite_mode,
            readiness: ReadinessProbe {
                path: cfg.upstream.readiness_path.clone(),
                timeout: cfg.upstream.readiness_timeout(),
            },
        })
    }
}

pub fn build_app(cfg: &AppConfig, policy: PolicyModel) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg, policy)?;
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Probes
        .route("/liveness", any(handlers::liveness))
        .route("/readiness", any(handlers::readiness))
        // Everything else goes through the policy
        .fallback(handlers::route)
        .with_state(state)
        // Middleware stack (outermost first: request id -> trace)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(app_middleware::request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<_>| {
                            use tracing::field::Empty;
                            let req_id = req
                                .extensions()
                                .get::<axum::http::HeaderValue>()
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("")
                                .to_string();
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri(),
                                http.status_code = Empty,
                                request_id = %req_id
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<_>,
                             latency: Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                ),
        )
}

pub struct AuthRouterServer {
    host: String,
    port: u16,
    app: Router,
}

pub struct ServerBuilder {
    config: AppConfig,
    policy: PolicyModel,
}

impl ServerBuilder {
    pub fn new(config: AppConfig, policy: PolicyModel) -> Self {
        Self { config, policy }
    }

    pub fn build(self) -> anyhow::Result<AuthRouterServer> {
        let app = build_app(&self.config, self.policy)?;
        Ok(AuthRouterServer {
            host: self.config.server.host,
            port: self.config.server.port,
            app,
        })
    }
}

impl AuthRouterServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind((self.host.as_str(), self.port)).await?;
        tracing::info!(host = %self.host, port = self.port, "serving");
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
