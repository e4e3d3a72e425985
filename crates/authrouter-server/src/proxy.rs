//! Forwarding of authorized requests to the upstream server.

use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    http::{HeaderMap, Request, StatusCode, header::CONNECTION},
    response::Response,
};
use tracing::{debug, instrument};
use url::{Position, Url};

use crate::error::ProxyError;

/// Shared HTTP client bound to the single upstream.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base: Url,
}

impl UpstreamClient {
    /// Create a client for `base`.
    ///
    /// Only connecting is time-limited; response bodies such as the sitemap
    /// event stream may stay open indefinitely. Upstream redirects are
    /// passed back to the client instead of being followed.
    pub fn new(base: Url, connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Request target as it will reach the upstream. See [`normalize_target`].
    pub fn normalize(&self, raw: &str) -> String {
        normalize_target(&self.base, raw)
    }

    /// Forward `request` upstream with `target` as its path and query.
    ///
    /// Method, headers and body are streamed as-is apart from hop-by-hop
    /// headers; the upstream response is streamed back unchanged.
    #[instrument(skip(self, request), fields(method = %request.method()))]
    pub async fn forward(&self, request: Request<Body>, target: &str) -> Result<Response, ProxyError> {
        let url = upstream_url(&self.base, target);
        let (parts, body) = request.into_parts();

        debug!(upstream = %url, "Proxying request");

        let mut upstream_request = self
            .client
            .request(parts.method, url)
            .headers(forwardable(&parts.headers));
        // Bodiless requests stay bodiless instead of turning chunked.
        if body.size_hint().exact() != Some(0) {
            upstream_request =
                upstream_request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream_response = upstream_request.send().await?;

        let status = upstream_response.status();
        debug!(status = %status, "Proxy request completed");

        let mut response_builder = Response::builder().status(status);
        if let Some(headers) = response_builder.headers_mut() {
            headers.extend(forwardable(upstream_response.headers()));
        }

        Ok(response_builder.body(Body::from_stream(upstream_response.bytes_stream()))?)
    }

    /// Probe `path` on the upstream; `true` only for a `200 OK`.
    pub async fn probe(&self, path: &str, timeout: Duration) -> Result<bool, ProxyError> {
        let response = self
            .client
            .get(upstream_url(&self.base, path))
            .timeout(timeout)
            .send()
            .await?;
        Ok(response.status() == StatusCode::OK)
    }
}

/// Join the upstream base URL and a request target.
///
/// The base path and the target path are joined with a single slash and
/// the target's query replaces any query of the base.
pub fn upstream_url(base: &Url, target: &str) -> Url {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    let base_path = base.path().trim_end_matches('/');
    let joined = if path.starts_with('/') {
        format!("{base_path}{path}")
    } else {
        format!("{base_path}/{path}")
    };

    let mut url = base.clone();
    url.set_path(&joined);
    url.set_query(query);
    url
}

/// Clean a raw request target the way the upstream URL will carry it.
///
/// Repeated slashes are collapsed, then `.`/`..` segments (plain or
/// percent-encoded) are resolved and unsafe characters percent-encoded by
/// the same URL parser [`upstream_url`] uses. For a normalized target,
/// `upstream_url` only prepends the base path, so the target the policy
/// approves is byte-for-byte the one that is forwarded.
pub fn normalize_target(base: &Url, raw: &str) -> String {
    let (path, query) = match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    };

    let mut collapsed = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        collapsed.push('/');
    }
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }

    let mut url = base.clone();
    url.set_path(&collapsed);
    url.set_query(query);
    url.set_fragment(None);
    url[Position::BeforePath..].to_string()
}

/// Copy of `headers` without hop-by-hop headers, including any the
/// `Connection` header names.
fn forwardable(headers: &HeaderMap) -> HeaderMap {
    let connection_listed: Vec<String> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop_header(name.as_str())
            || connection_listed.iter().any(|listed| listed == name.as_str())
        {
            debug!(header = %name, "Skipping hop-by-hop header");
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}

/// Checks if a header is a hop-by-hop header that should not be forwarded.
///
/// Hop-by-hop headers are defined in RFC 2616 Section 13.5.1.
fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
            | "host" // set from the upstream URL
    )
}
