use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::Duration;
use cookie::Cookie;
use uuid::Uuid;

use super::cookie_policy::CookiePolicy;
use super::error::{AuthError, AuthResult};
use super::principal::SubjectIdentity;
use super::scheme::CredentialScheme;
use crate::error::StoreError;
use crate::users::UserRepository;

/// Default lifetime of a credential issued at sign-up / sign-in.
pub const DEFAULT_CREDENTIAL_TTL_HOURS: i64 = 24;

/// Longest credential lifetime a deployment may configure (one year).
pub const MAX_CREDENTIAL_TTL_HOURS: i64 = 24 * 365;

/// Everything needed to issue, resolve and revoke the credential cookie.
///
/// Built once at startup and shared by handle; it holds no per-request state.
pub struct AuthGateway {
    scheme: CredentialScheme,
    cookies: CookiePolicy,
    credential_ttl: Duration,
    /// When set, every resolved subject must still map to an enabled account.
    accounts: Option<Arc<dyn UserRepository>>,
}

impl AuthGateway {
    pub fn new(scheme: CredentialScheme, cookies: CookiePolicy, credential_ttl: Duration) -> Self {
        Self { scheme, cookies, credential_ttl, accounts: None }
    }

    pub fn with_account_check(mut self, accounts: Arc<dyn UserRepository>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    pub fn scheme(&self) -> &CredentialScheme {
        &self.scheme
    }

    pub fn cookies(&self) -> &CookiePolicy {
        &self.cookies
    }

    pub fn credential_ttl(&self) -> Duration {
        self.credential_ttl
    }

    /// Resolve the request's credential cookie to a subject.
    pub async fn authenticate(&self, headers: &HeaderMap) -> AuthResult<SubjectIdentity> {
        let raw = self.cookies.extract(headers).ok_or(AuthError::MissingCredential)?;
        if raw.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        let identity = self.scheme.resolve(&raw).await?;
        if let Some(accounts) = &self.accounts {
            check_account(accounts.as_ref(), &identity).await?;
        }
        Ok(identity)
    }

    /// Issue a fresh credential for `identity` and wrap it in the transport cookie.
    pub async fn issue_cookie(&self, identity: &SubjectIdentity) -> AuthResult<Cookie<'static>> {
        let issued = self.scheme.issue(identity, self.credential_ttl).await?;
        tracing::info!(user_id = %identity.id, scheme = ?self.scheme.kind(), expires_at = %issued.expires_at, "credential issued");
        self.cookies.issue(&issued.value, issued.expires_at)
    }

    /// Revoke whatever credential the request carries and return the expired
    /// cookie. Never fails: revocation errors are logged and swallowed.
    pub async fn logout(&self, headers: &HeaderMap) -> Cookie<'static> {
        if let Some(raw) = self.cookies.extract(headers).filter(|v| !v.is_empty()) {
            if let Err(e) = self.scheme.revoke(&raw).await {
                tracing::error!(reason = e.reason(), error = %e, "logout could not revoke session");
            }
        }
        self.cookies.expire()
    }
}

async fn check_account(accounts: &dyn UserRepository, identity: &SubjectIdentity) -> AuthResult<()> {
    let id = Uuid::parse_str(&identity.id)
        .map_err(|_| AuthError::AccountUnavailable(format!("subject '{}' is not a user id", identity.id)))?;
    match accounts.find_by_id(&id).await {
        Ok(user) if user.disabled => Err(AuthError::AccountUnavailable(format!("user {id} is disabled"))),
        Ok(_) => Ok(()),
        Err(StoreError::NotFound(_)) => Err(AuthError::AccountUnavailable(format!("user {id} no longer exists"))),
        Err(e) => Err(AuthError::StoreUnavailable(e.to_string())),
    }
}
