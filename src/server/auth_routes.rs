use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::AppState;
use crate::error::{api_conflict, api_internal, api_unauthorized, api_validation_error, ApiError, ApiJson, StoreError};
use crate::identity::{set_cookie_header, AuthError, Authenticated, SubjectIdentity};
use crate::observability::CurrentRequestId;
use crate::security;
use crate::users::{NewUser, User, UserView};

#[derive(Debug, Deserialize)]
pub(crate) struct CredentialsPayload {
    username: String,
    password: String,
}

/// Issue the cookie for `user` and render `status` with the public user view.
async fn respond_with_credential(state: &AppState, user: &User, status: StatusCode) -> Result<Response, ApiError> {
    let identity = SubjectIdentity::new(user.id.to_string(), user.username.clone());
    let cookie = state.gateway.issue_cookie(&identity).await.map_err(|e| match e {
        AuthError::SigningError(_) => api_internal("could not issue credential", &e),
        _ => api_internal("could not start session", &e),
    })?;
    let mut headers = HeaderMap::new();
    set_cookie_header(&mut headers, &cookie);
    Ok((status, headers, Json(UserView::from(user))).into_response())
}

pub(crate) async fn sign_up(
    State(state): State<AppState>,
    CurrentRequestId(rid): CurrentRequestId,
    ApiJson(payload): ApiJson<CredentialsPayload>,
) -> Result<Response, ApiError> {
    security::validate_username(&payload.username).map_err(|m| api_validation_error(&m).with_request_id(rid.clone()))?;
    security::validate_password(&payload.password).map_err(|m| api_validation_error(&m).with_request_id(rid.clone()))?;

    let password_hash = security::hash_password_blocking(payload.password)
        .await
        .map_err(|e| api_internal("could not hash password", &e).with_request_id(rid.clone()))?;
    let user = match state.users.create(NewUser { username: payload.username, password_hash }).await {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => {
            return Err(api_conflict("username_taken", "username is already taken").with_request_id(rid));
        }
        Err(e) => return Err(ApiError::from(e).with_request_id(rid)),
    };
    info!(user_id = %user.id, username = %user.username, "user signed up");
    respond_with_credential(&state, &user, StatusCode::CREATED).await.map_err(|e| e.with_request_id(rid))
}

pub(crate) async fn sign_in(
    State(state): State<AppState>,
    CurrentRequestId(rid): CurrentRequestId,
    ApiJson(payload): ApiJson<CredentialsPayload>,
) -> Result<Response, ApiError> {
    let user = match state.users.find_by_username(&payload.username).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => {
            security::verify_unknown_user_blocking(payload.password).await;
            info!(username = %payload.username, reason = "unknown_user", "sign-in failed");
            return Err(api_unauthorized().with_request_id(rid));
        }
        Err(e) => return Err(ApiError::from(e).with_request_id(rid)),
    };
    if !security::verify_password_blocking(user.password_hash.clone(), payload.password).await {
        info!(username = %payload.username, reason = "bad_password", "sign-in failed");
        return Err(api_unauthorized().with_request_id(rid));
    }
    if user.disabled {
        info!(username = %payload.username, reason = "disabled", "sign-in failed");
        return Err(api_unauthorized().with_request_id(rid));
    }
    info!(user_id = %user.id, "user signed in");
    respond_with_credential(&state, &user, StatusCode::OK).await.map_err(|e| e.with_request_id(rid))
}

/// Always 200 with the expired cookie, whether or not a session existed.
pub(crate) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookie = state.gateway.logout(&headers).await;
    let mut out = HeaderMap::new();
    set_cookie_header(&mut out, &cookie);
    (StatusCode::OK, out, Json(json!({"status": "ok"}))).into_response()
}

pub(crate) async fn me(auth: Authenticated) -> Json<SubjectIdentity> {
    Json(auth.identity().clone())
}
