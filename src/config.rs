use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::identity::{SchemeKind, DEFAULT_COOKIE_NAME, DEFAULT_CREDENTIAL_TTL_HOURS, MAX_CREDENTIAL_TTL_HOURS};

// Gateway configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub cookie_name: String,
    pub scheme: SchemeKind,
    /// HS256 secret for signed credentials. When absent, signing fails at issue time.
    pub token_secret: Option<String>,
    pub credential_ttl_hours: i64,
    pub session_store_timeout: Duration,
    pub account_check: bool,
    /// Base URL of the questions RPC service; `None` serves questions in-process.
    pub questions_rpc_url: Option<String>,
    pub questions_rpc_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 7878)),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            scheme: SchemeKind::Signed,
            token_secret: None,
            credential_ttl_hours: DEFAULT_CREDENTIAL_TTL_HOURS,
            session_store_timeout: Duration::from_millis(500),
            account_check: true,
            questions_rpc_url: None,
            questions_rpc_timeout: Duration::from_secs(5),
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("parse {name}: expected a boolean, got '{other}'")),
    }
}

fn parse_cookie_name(raw: &str) -> Result<String> {
    let ok = !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !ok {
        return Err(anyhow!("parse POCKETBOOK_COOKIE_NAME: '{raw}' is not a valid cookie name"));
    }
    Ok(raw.to_string())
}

fn parse_ttl_hours(raw: &str) -> Result<i64> {
    let hours = raw.parse::<i64>().with_context(|| "parse POCKETBOOK_CREDENTIAL_TTL_HOURS")?;
    if !(1..=MAX_CREDENTIAL_TTL_HOURS).contains(&hours) {
        return Err(anyhow!("POCKETBOOK_CREDENTIAL_TTL_HOURS must be between 1 and {MAX_CREDENTIAL_TTL_HOURS}, got {hours}"));
    }
    Ok(hours)
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let bind_addr = match var("POCKETBOOK_BIND") {
            Some(v) => v.parse().with_context(|| "parse POCKETBOOK_BIND")?,
            None => defaults.bind_addr,
        };
        let cookie_name = match var("POCKETBOOK_COOKIE_NAME") {
            Some(v) => parse_cookie_name(&v)?,
            None => defaults.cookie_name,
        };
        let scheme = match var("POCKETBOOK_CREDENTIAL_SCHEME") {
            Some(v) => v.parse::<SchemeKind>().map_err(|e| anyhow!("parse POCKETBOOK_CREDENTIAL_SCHEME: {e}"))?,
            None => defaults.scheme,
        };
        let credential_ttl_hours = match var("POCKETBOOK_CREDENTIAL_TTL_HOURS") {
            Some(v) => parse_ttl_hours(&v)?,
            None => defaults.credential_ttl_hours,
        };
        let session_store_timeout = match var("POCKETBOOK_SESSION_STORE_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(v.parse().with_context(|| "parse POCKETBOOK_SESSION_STORE_TIMEOUT_MS")?),
            None => defaults.session_store_timeout,
        };
        let account_check = match var("POCKETBOOK_ACCOUNT_CHECK") {
            Some(v) => parse_bool("POCKETBOOK_ACCOUNT_CHECK", &v)?,
            None => defaults.account_check,
        };
        let questions_rpc_timeout = match var("POCKETBOOK_QUESTIONS_RPC_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(v.parse().with_context(|| "parse POCKETBOOK_QUESTIONS_RPC_TIMEOUT_MS")?),
            None => defaults.questions_rpc_timeout,
        };
        Ok(Self {
            bind_addr,
            cookie_name,
            scheme,
            token_secret: var("POCKETBOOK_TOKEN_SECRET"),
            credential_ttl_hours,
            session_store_timeout,
            account_check,
            questions_rpc_url: var("POCKETBOOK_QUESTIONS_RPC_URL"),
            questions_rpc_timeout,
        })
    }
}

// Questions RPC service configuration.
#[derive(Debug, Clone)]
pub struct QuestionsRpcConfig {
    pub bind_addr: SocketAddr,
}

impl QuestionsRpcConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = var("POCKETBOOK_QUESTIONS_BIND")
            .unwrap_or_else(|| "127.0.0.1:7879".to_string())
            .parse()
            .with_context(|| "parse POCKETBOOK_QUESTIONS_BIND")?;
        Ok(Self { bind_addr })
    }
}
