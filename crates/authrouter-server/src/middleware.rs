use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Keep the incoming `x-request-id` or generate one, expose it to the
/// trace span through request extensions and echo it on the response.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let req_id_value = match req.headers().get(&REQUEST_ID) {
        Some(value) => value.clone(),
        None => HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    };

    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(REQUEST_ID.clone(), req_id_value);
    res
}
