//! Password hashing and sign-up input rules.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use once_cell::sync::Lazy;
use password_hash::{PasswordHash, SaltString};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 32;
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

/// Constant-time check of `password` against a PHC string; unparsable hashes never match.
pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

/// [`hash_password`] on the blocking pool; Argon2 is CPU-bound.
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| anyhow!("hashing task join error: {e}"))?
}

/// [`verify_password`] on the blocking pool. A failed join counts as a mismatch.
pub async fn verify_password_blocking(hash: String, password: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&hash, &password)).await.unwrap_or(false)
}

// Stand-in hash for sign-ins naming an unknown user, so they pay the same
// Argon2 cost as a wrong password.
static DUMMY_PASSWORD_HASH: Lazy<String> = Lazy::new(|| {
    hash_password("pocketbook-unknown-user").unwrap_or_else(|e| {
        tracing::error!(error = %e, "could not compute the dummy password hash");
        String::new()
    })
});

/// Run a full verification against [`DUMMY_PASSWORD_HASH`]; always a mismatch.
pub async fn verify_unknown_user_blocking(password: String) -> bool {
    let _ = tokio::task::spawn_blocking(move || verify_password(&DUMMY_PASSWORD_HASH, &password)).await;
    false
}

pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(format!("username must be {MIN_USERNAME_LEN}-{MAX_USERNAME_LEN} characters"));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        return Err("username may only contain letters, digits, '_', '.' and '-'".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("password must be at least {MIN_PASSWORD_LEN} characters"));
    }
    Ok(())
}
