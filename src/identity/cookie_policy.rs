// Transport cookie for credentials.
//
// Every cookie built here is HttpOnly, Secure and SameSite=Strict; no option
// disables any of the three.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use cookie::time::OffsetDateTime;
use cookie::{Cookie, SameSite};

use super::error::{AuthError, AuthResult};

/// Default cookie name carrying the credential.
pub const DEFAULT_COOKIE_NAME: &str = "Authentication";

pub const DEFAULT_COOKIE_PATH: &str = "/";

fn to_offset(expiry: DateTime<Utc>) -> AuthResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(expiry.timestamp())
        .map_err(|e| AuthError::SigningError(format!("cookie expiry {expiry} is out of range: {e}")))
}

/// Build a protected cookie carrying `value` until `expiry`.
///
/// An expiry the cookie format cannot carry is an error rather than a cookie
/// that is already expired.
pub fn build_cookie(name: &str, value: &str, expiry: DateTime<Utc>, path: &str) -> AuthResult<Cookie<'static>> {
    Ok(Cookie::build((name.to_string(), value.to_string()))
        .path(path.to_string())
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .expires(to_offset(expiry)?)
        .build())
}

/// Build the logout cookie: empty value, already expired, same protections.
pub fn build_expired_cookie(name: &str, path: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), String::new()))
        .path(path.to_string())
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Cookie settings fixed for one deployment.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    name: String,
    path: String,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME)
    }
}

impl CookiePolicy {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), path: DEFAULT_COOKIE_PATH.to_string() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn issue(&self, value: &str, expiry: DateTime<Utc>) -> AuthResult<Cookie<'static>> {
        build_cookie(&self.name, value, expiry, &self.path)
    }

    pub fn expire(&self) -> Cookie<'static> {
        build_expired_cookie(&self.name, &self.path)
    }

    /// Find this policy's cookie among the request's `Cookie` headers.
    ///
    /// `Some("")` means the cookie was sent with an empty value.
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|s| Cookie::split_parse(s.to_string()))
            .filter_map(Result::ok)
            .find(|c| c.name() == self.name)
            .map(|c| c.value().to_string())
    }
}

/// Append `cookie` as a `Set-Cookie` header.
pub fn set_cookie_header(headers: &mut HeaderMap, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, cookie = cookie.name(), "cookie is not a valid header value"),
    }
}
