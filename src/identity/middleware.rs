//! The request gate in front of every protected route.
//!
//! On success the resolved subject is bound as an [`Authenticated`] request
//! extension exactly once; handlers take it through the extractor below. On
//! any failure the request stops here with the generic 401 and nothing is
//! bound.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::{AuthError, Severity};
use super::gateway::AuthGateway;
use super::principal::Authenticated;
use crate::error::{api_unauthorized, ApiError};
use crate::observability::RequestId;

fn request_id_of(extensions: &axum::http::Extensions) -> Option<String> {
    extensions.get::<RequestId>().map(|r| r.0.clone())
}

fn log_rejection(err: &AuthError, request_id: Option<&str>) {
    let request_id = request_id.unwrap_or("-");
    match err.severity() {
        Severity::Expected => tracing::info!(request_id, reason = err.reason(), detail = %err, "request rejected"),
        Severity::Suspicious => tracing::warn!(request_id, reason = err.reason(), detail = %err, "request rejected"),
        Severity::Unexpected => tracing::error!(request_id, reason = err.reason(), detail = %err, "request rejected: credential resolution failed"),
    }
}

pub async fn require_auth(State(gateway): State<Arc<AuthGateway>>, mut req: Request, next: Next) -> Response {
    let request_id = request_id_of(req.extensions());
    if req.extensions().get::<Authenticated>().is_some() {
        tracing::error!(request_id = request_id.as_deref().unwrap_or("-"), "identity already bound before the gate ran");
        return api_unauthorized().with_request_id(request_id).into_response();
    }
    match gateway.authenticate(req.headers()).await {
        Ok(identity) => {
            tracing::debug!(request_id = request_id.as_deref().unwrap_or("-"), user_id = %identity.id, "request authorized");
            req.extensions_mut().insert(Authenticated::bind(identity));
            next.run(req).await
        }
        Err(err) => {
            log_rejection(&err, request_id.as_deref());
            api_unauthorized().with_request_id(request_id).into_response()
        }
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Authenticated>().cloned().ok_or_else(|| {
            // Route was mounted without the gate.
            tracing::error!("handler expected an authenticated request but no identity is bound");
            api_unauthorized().with_request_id(request_id_of(&parts.extensions))
        })
    }
}
