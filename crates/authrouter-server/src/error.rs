//! Error and rejection responses.

use axum::{
    Json,
    body::Body,
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde_json::json;

use authrouter_core::DenyReason;

/// Failures while forwarding a request upstream.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The upstream did not accept a connection in time.
    #[error("upstream request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// The upstream could not be reached.
    #[error("failed to connect to upstream: {0}")]
    Connect(#[source] reqwest::Error),

    /// Any other upstream failure.
    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The upstream response could not be turned into a client response.
    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else if e.is_connect() {
            Self::Connect(e)
        } else {
            Self::Request(e)
        }
    }
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Connect(_) | Self::Request(_) => StatusCode::BAD_GATEWAY,
            Self::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Proxy error");
        (self.status(), self.to_string()).into_response()
    }
}

/// Build the client response for a gate rejection.
///
/// A rejection with a message is formatted after the request's
/// `Content-Type`: HTML and JSON requests get a body of the same kind,
/// anything else gets plain text. An empty message yields an empty body.
pub fn deny_response(reason: &DenyReason, request_content_type: Option<&str>) -> Response {
    let status = StatusCode::from_u16(reason.status()).unwrap_or(StatusCode::FORBIDDEN);

    if reason.message.is_empty() {
        return status.into_response();
    }
    tracing::error!(code = %reason.code, "{}", reason.message);

    let content_type = request_content_type.unwrap_or_default();
    if content_type.contains("text/html") {
        with_content_type(status, "text/html; charset=utf-8", reason.message.clone())
    } else if content_type.contains("application/json") {
        let mut response = (status, Json(json!({ "error": reason.message }))).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        response
    } else {
        with_content_type(status, "text/plain; charset=utf-8", reason.message.clone())
    }
}

fn with_content_type(status: StatusCode, content_type: &'static str, body: String) -> Response {
    let mut response = (status, Body::from(body)).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
