//! Logging setup and per-request correlation ids.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_INBOUND_REQUEST_ID_LEN: usize = 128;

/// Correlation id for one request, available as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Extractor for the current request's id, if the request-id layer ran.
#[derive(Debug, Clone, Default)]
pub struct CurrentRequestId(pub Option<String>);

impl<S> FromRequestParts<S> for CurrentRequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<RequestId>().map(|r| r.0.clone())))
    }
}

/// Install the global fmt subscriber, `RUST_LOG` overriding the `info` default.
/// Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn inbound_request_id(req: &Request) -> Option<String> {
    let raw = req.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let ok = !raw.is_empty()
        && raw.len() <= MAX_INBOUND_REQUEST_ID_LEN
        && raw.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    ok.then(|| raw.to_string())
}

/// Tag the request with an id (reusing a sane inbound `x-request-id`), run it
/// inside an `http.request` span and echo the id on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = inbound_request_id(&req).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(id.clone()));
    let span = tracing::info_span!(
        "http.request",
        request_id = %id,
        method = %req.method(),
        uri = %req.uri().path(),
    );
    let mut response = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
