use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
};

use authrouter_core::{AccessDecision, RequestFacts, USER_HEADER};

use crate::config::RewriteMode;
use crate::error::deny_response;
use crate::server::AppState;

/// Always 200; never looks at the policy.
pub async fn liveness() -> StatusCode {
    tracing::debug!(probe = "liveness");
    StatusCode::OK
}

/// 200 if the upstream answers its readiness path with 200, 503 otherwise.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let remote = state.upstream.base().as_str();
    match state
        .upstream
        .probe(&state.readiness.path, state.readiness.timeout)
        .await
    {
        Ok(true) => {
            tracing::debug!(probe = "readiness");
            StatusCode::OK
        }
        Ok(false) => {
            tracing::error!(probe = "readiness", remote, "failed to assert target access");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(e) => {
            tracing::error!(error = %e, probe = "readiness", remote, "failed to assert target access");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Authorize every other request and forward, redirect or reject it.
pub async fn route(State(state): State<AppState>, request: Request<Body>) -> Response {
    // The policy sees exactly the target that is sent upstream.
    let uri = state.upstream.normalize(&request_target(request.uri()));
    let decision = {
        // A present but non-UTF-8 name is still a name; it just matches no user.
        let username = request
            .headers()
            .get(USER_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()));
        state
            .evaluator
            .evaluate(&RequestFacts::new(username.as_deref(), &uri))
    };

    match decision {
        AccessDecision::Deny(reason) => {
            let content_type = request
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            deny_response(&reason, content_type)
        }
        AccessDecision::Allow(None) => forward(&state, request, &uri).await,
        AccessDecision::Allow(Some(rewrite)) => match state.rewrite_mode {
            RewriteMode::Forward => forward(&state, request, &rewrite.target).await,
            RewriteMode::Redirect => Redirect::permanent(&rewrite.target).into_response(),
        },
    }
}

async fn forward(state: &AppState, request: Request<Body>, target: &str) -> Response {
    state
        .upstream
        .forward(request, target)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

/// Raw request target: path plus `?` and the raw query.
fn request_target(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default()
}
