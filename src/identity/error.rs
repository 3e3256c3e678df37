//! Authentication failure taxonomy.
//!
//! Every variant collapses to the same client-visible 401; the distinction only
//! drives server-side logging.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("malformed credential: {0}")]
    Malformed(String),
    #[error("credential expired")]
    Expired,
    #[error("credential signature invalid")]
    InvalidSignature,
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("identity check failed: {0}")]
    AccountUnavailable(String),
    #[error("signing key unavailable: {0}")]
    SigningError(String),
}

/// How loudly a rejection is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Expected,
    Suspicious,
    Unexpected,
}

impl AuthError {
    pub fn severity(&self) -> Severity {
        match self {
            AuthError::MissingCredential
            | AuthError::Malformed(_)
            | AuthError::Expired
            | AuthError::NotFound => Severity::Expected,
            AuthError::InvalidSignature | AuthError::AccountUnavailable(_) => Severity::Suspicious,
            AuthError::StoreUnavailable(_) | AuthError::SigningError(_) => Severity::Unexpected,
        }
    }

    /// Stable short label used as a structured log field.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::Malformed(_) => "malformed",
            AuthError::Expired => "expired",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::NotFound => "session_not_found",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::AccountUnavailable(_) => "account_unavailable",
            AuthError::SigningError(_) => "signing_error",
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
