use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use super::clock::Clock;
use super::error::{AuthError, AuthResult};
use super::principal::SubjectIdentity;

/// Server-side record bound to an opaque session key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub key: String,
    pub identity: SubjectIdentity,
    pub expires_at: DateTime<Utc>,
}

/// Contract the gateway needs from a shared session store.
///
/// Implementations own their concurrency; the gateway only relies on at most
/// one live record per key. Store-level failures surface as
/// [`AuthError::StoreUnavailable`], never as [`AuthError::NotFound`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fails with `NotFound` when the key is absent or expired.
    async fn lookup(&self, key: &str) -> AuthResult<SubjectIdentity>;
    async fn create(&self, identity: &SubjectIdentity, ttl: Duration) -> AuthResult<Session>;
    /// Idempotent: an unknown key is not an error.
    async fn invalidate(&self, key: &str) -> AuthResult<()>;
}

pub fn generate_session_key() -> AuthResult<String> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| AuthError::StoreUnavailable(format!("entropy source failed: {e}")))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// Process-local session store. Expired entries are dropped lazily on lookup
/// and in bulk by [`MemorySessionStore::sweep_expired`].
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), clock }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut map = self.sessions.write();
        let before = map.len();
        map.retain(|_, s| s.expires_at > now);
        let removed = before - map.len();
        if removed > 0 {
            tracing::debug!(removed, "session_sweep");
        }
        removed
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn lookup(&self, key: &str) -> AuthResult<SubjectIdentity> {
        let now = self.clock.now();
        let expired = {
            let map = self.sessions.read();
            match map.get(key) {
                Some(s) if s.expires_at > now => return Ok(s.identity.clone()),
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.sessions.write().remove(key);
        }
        Err(AuthError::NotFound)
    }

    async fn create(&self, identity: &SubjectIdentity, ttl: Duration) -> AuthResult<Session> {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::SigningError(format!("session lifetime of {}s is out of range", ttl.num_seconds())))?;
        let session = Session { key: generate_session_key()?, identity: identity.clone(), expires_at };
        self.sessions.write().insert(session.key.clone(), session.clone());
        tracing::debug!(user_id = %identity.id, ttl_secs = ttl.num_seconds(), "session.create");
        Ok(session)
    }

    async fn invalidate(&self, key: &str) -> AuthResult<()> {
        self.sessions.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::clock::ManualClock;

    fn alice() -> SubjectIdentity {
        SubjectIdentity::new("u-1", "alice")
    }

    #[tokio::test]
    async fn create_then_lookup() {
        let store = MemorySessionStore::new(Arc::new(ManualClock::default()));
        let session = store.create(&alice(), Duration::hours(1)).await.unwrap();
        assert_eq!(store.lookup(&session.key).await.unwrap(), alice());
    }

    #[tokio::test]
    async fn keys_are_unique_and_opaque() {
        let store = MemorySessionStore::new(Arc::new(ManualClock::default()));
        let a = store.create(&alice(), Duration::hours(1)).await.unwrap();
        let b = store.create(&alice(), Duration::hours(1)).await.unwrap();
        assert_ne!(a.key, b.key);
        assert!(!a.key.contains("alice"));
        assert_eq!(a.key.len(), 43);
    }

    #[tokio::test]
    async fn expired_session_is_not_found_and_evicted() {
        let clock = Arc::new(ManualClock::default());
        let store = MemorySessionStore::new(clock.clone());
        let session = store.create(&alice(), Duration::minutes(30)).await.unwrap();
        clock.advance(Duration::minutes(30));
        assert_eq!(store.lookup(&session.key).await, Err(AuthError::NotFound));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn invalidate_is_idempotent() {
        let store = MemorySessionStore::new(Arc::new(ManualClock::default()));
        let session = store.create(&alice(), Duration::hours(1)).await.unwrap();
        store.invalidate(&session.key).await.unwrap();
        store.invalidate(&session.key).await.unwrap();
        store.invalidate("never-existed").await.unwrap();
        assert_eq!(store.lookup(&session.key).await, Err(AuthError::NotFound));
    }

    #[tokio::test]
    async fn out_of_range_lifetime_creates_nothing() {
        let store = MemorySessionStore::new(Arc::new(ManualClock::default()));
        let result = store.create(&alice(), Duration::hours(2_400_000_000)).await;
        assert!(matches!(result, Err(AuthError::SigningError(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let clock = Arc::new(ManualClock::default());
        let store = MemorySessionStore::new(clock.clone());
        store.create(&alice(), Duration::minutes(5)).await.unwrap();
        let keep = store.create(&alice(), Duration::hours(2)).await.unwrap();
        clock.advance(Duration::minutes(10));
        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.lookup(&keep.key).await.is_ok());
    }
}
