//! Application error model shared by the HTTP handlers and repositories.
//!
//! Handlers return [`ApiError`], which renders as `{code, message, request_id}`
//! with a matching status. Internal failures are logged server-side and reach
//! the client only as a generic message.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::RequestId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            body: ErrorResponse { code: code.to_string(), message: message.to_string(), request_id: None },
        }
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.body.request_id = request_id;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Generic 401. Every authentication failure renders exactly this body.
pub fn api_unauthorized() -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized", "unauthorized")
}

pub fn api_validation_error(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "validation_error", message)
}

pub fn api_conflict(code: &str, message: &str) -> ApiError {
    ApiError::new(StatusCode::CONFLICT, code, message)
}

pub fn api_not_found(message: &str) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn api_bad_gateway(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_GATEWAY, "upstream_error", message)
}

/// Log `err` and return a 500 that does not echo it.
pub fn api_internal(message: &str, err: &dyn std::fmt::Display) -> ApiError {
    tracing::error!(error = %err, "{message}");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound(what) => api_not_found(what),
            StoreError::Conflict(what) => api_conflict("conflict", what),
            StoreError::Unexpected(_) => api_internal("storage failure", &err),
        }
    }
}

/// JSON body extractor whose rejection is an [`ApiError`] like every other
/// failure, instead of axum's plain-text body.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = req.extensions().get::<RequestId>().map(|r| r.0.clone());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(from_json_rejection(&rejection).with_request_id(request_id)),
        }
    }
}

fn from_json_rejection(rejection: &JsonRejection) -> ApiError {
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => "expected an application/json body".to_string(),
        other => other.body_text(),
    };
    api_validation_error(&message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_expected_codes() {
        let unauthorized = api_unauthorized();
        assert_eq!(unauthorized.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unauthorized.body.code, "unauthorized");
        assert_eq!(unauthorized.body.message, "unauthorized");

        let conflict = api_conflict("username_taken", "dup");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert_eq!(conflict.body.code, "username_taken");

        assert_eq!(api_validation_error("bad").status, StatusCode::BAD_REQUEST);
        assert_eq!(api_not_found("missing").status, StatusCode::NOT_FOUND);
        assert_eq!(api_bad_gateway("down").status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn internal_errors_do_not_echo_details() {
        let err = StoreError::Unexpected(anyhow::anyhow!("connection refused on 10.0.0.7"));
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.body.message.contains("10.0.0.7"));
    }

    #[test]
    fn request_id_is_serialized_only_when_present() {
        let plain = serde_json::to_value(api_unauthorized().body).unwrap();
        assert!(plain.get("request_id").is_none());
        let tagged = serde_json::to_value(api_unauthorized().with_request_id(Some("r-1".into())).body).unwrap();
        assert_eq!(tagged["request_id"], "r-1");
    }

    #[derive(Debug, Deserialize)]
    struct Login {
        #[allow(dead_code)]
        username: String,
    }

    #[tokio::test]
    async fn bad_json_bodies_render_as_validation_errors() {
        use axum::body::Body;

        let cases = [
            ("application/json", "{not json"),
            ("application/json", r#"{"other": 1}"#),
            ("text/plain", r#"{"username": "alice"}"#),
        ];
        for (content_type, body) in cases {
            let req = axum::http::Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", content_type)
                .extension(RequestId("r-9".into()))
                .body(Body::from(body))
                .unwrap();
            let err = ApiJson::<Login>::from_request(req, &()).await.unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST, "{content_type} {body}");
            assert_eq!(err.body.code, "validation_error");
            assert_eq!(err.body.request_id.as_deref(), Some("r-9"));
        }
    }
}
