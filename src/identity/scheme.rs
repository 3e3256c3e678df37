use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use super::codec::CredentialCodec;
use super::error::{AuthError, AuthResult};
use super::principal::SubjectIdentity;
use super::session::SessionStore;

/// Which credential a deployment puts in its cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    Signed,
    Session,
}

impl std::str::FromStr for SchemeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signed" | "jwt" | "token" => Ok(SchemeKind::Signed),
            "session" | "opaque" => Ok(SchemeKind::Session),
            other => Err(format!("unknown credential scheme '{other}' (expected 'signed' or 'session')")),
        }
    }
}

/// The cookie value handed to a client and when it lapses.
#[derive(Debug, Clone)]
pub struct IssuedCookieValue {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// One interface over the two credential shapes: a self-verifying signed
/// token, or an opaque key resolved through a [`SessionStore`].
#[derive(Clone)]
pub enum CredentialScheme {
    Signed(Arc<CredentialCodec>),
    Session {
        store: Arc<dyn SessionStore>,
        /// Upper bound on a single store call.
        timeout: StdDuration,
    },
}

impl CredentialScheme {
    pub fn kind(&self) -> SchemeKind {
        match self {
            CredentialScheme::Signed(_) => SchemeKind::Signed,
            CredentialScheme::Session { .. } => SchemeKind::Session,
        }
    }

    pub async fn issue(&self, identity: &SubjectIdentity, ttl: Duration) -> AuthResult<IssuedCookieValue> {
        match self {
            CredentialScheme::Signed(codec) => {
                let cred = codec.issue(&identity.id, &identity.username, ttl)?;
                Ok(IssuedCookieValue { value: cred.raw, expires_at: cred.expires_at })
            }
            CredentialScheme::Session { store, timeout } => {
                let session = bounded(*timeout, store.create(identity, ttl)).await?;
                Ok(IssuedCookieValue { value: session.key, expires_at: session.expires_at })
            }
        }
    }

    pub async fn resolve(&self, raw: &str) -> AuthResult<SubjectIdentity> {
        match self {
            CredentialScheme::Signed(codec) => codec.verify(raw),
            CredentialScheme::Session { store, timeout } => bounded(*timeout, store.lookup(raw)).await,
        }
    }

    /// Drop any server-side state behind `raw`. Signed credentials have none.
    pub async fn revoke(&self, raw: &str) -> AuthResult<()> {
        match self {
            CredentialScheme::Signed(_) => Ok(()),
            CredentialScheme::Session { store, timeout } => bounded(*timeout, store.invalidate(raw)).await,
        }
    }
}

async fn bounded<T>(
    limit: StdDuration,
    fut: impl std::future::Future<Output = AuthResult<T>>,
) -> AuthResult<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| AuthError::StoreUnavailable(format!("session store timed out after {}ms", limit.as_millis())))?
}
