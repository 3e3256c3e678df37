//!
//! pocketbook HTTP gateway
//! -----------------------
//! Axum router for the personal-finance API.
//!
//! Responsibilities:
//! - Sign-up / sign-in issue the credential cookie; logout expires it.
//! - Every `/api/v1` route other than the auth endpoints sits behind the
//!   authentication gate, which binds the caller's identity to the request.
//! - Questions are delegated to the questions service over RPC, carrying the
//!   caller's subject id in each message.

use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::identity::{
    require_auth, AuthGateway, Clock, CookiePolicy, CredentialCodec, CredentialScheme, MemorySessionStore, SchemeKind,
    SystemClock,
};
use crate::observability::request_id;
use crate::questions::rpc::HttpQuestionClient;
use crate::questions::{QuestionBank, QuestionService};
use crate::users::{MemoryUserRepository, UserRepository};

mod auth_routes;
mod question_routes;

const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

/// Shared state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<AuthGateway>,
    pub users: Arc<dyn UserRepository>,
    pub questions: Arc<dyn QuestionService>,
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/users/me", get(auth_routes::me))
        .route("/api/v1/questions", get(question_routes::list_questions))
        .route("/api/v1/questions/answers", post(question_routes::submit_answers))
        .route_layer(middleware::from_fn_with_state(state.gateway.clone(), require_auth));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/auth/sign-up", post(auth_routes::sign_up))
        .route("/api/v1/auth/sign-in", post(auth_routes::sign_in))
        .route("/api/v1/auth/logout", post(auth_routes::logout))
        .merge(protected)
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

/// Construct the gateway's collaborators once, from configuration.
pub fn build_state(config: &GatewayConfig) -> anyhow::Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());

    let scheme = match config.scheme {
        SchemeKind::Signed => {
            if config.token_secret.is_none() {
                warn!("POCKETBOOK_TOKEN_SECRET is not set; credentials cannot be issued or verified");
            }
            CredentialScheme::Signed(Arc::new(CredentialCodec::new(config.token_secret.as_deref(), clock.clone())))
        }
        SchemeKind::Session => {
            let store = Arc::new(MemorySessionStore::new(clock.clone()));
            spawn_session_sweeper(store.clone());
            CredentialScheme::Session { store, timeout: config.session_store_timeout }
        }
    };

    let credential_ttl = chrono::Duration::try_hours(config.credential_ttl_hours)
        .with_context(|| format!("credential ttl of {} hours is out of range", config.credential_ttl_hours))?;
    let mut gateway = AuthGateway::new(scheme, CookiePolicy::new(config.cookie_name.clone()), credential_ttl);
    if config.account_check {
        gateway = gateway.with_account_check(users.clone());
    }

    let questions: Arc<dyn QuestionService> = match &config.questions_rpc_url {
        Some(url) => {
            info!(url = %url, "questions served by remote RPC service");
            Arc::new(
                HttpQuestionClient::new(url, config.questions_rpc_timeout)
                    .with_context(|| format!("build questions RPC client for {url}"))?,
            )
        }
        None => {
            info!("questions served in-process");
            Arc::new(QuestionBank::new())
        }
    };

    Ok(AppState { gateway: Arc::new(gateway), users, questions })
}

fn spawn_session_sweeper(store: Arc<MemorySessionStore>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS));
        loop {
            tick.tick().await;
            store.sweep_expired();
        }
    });
}

/// Resolve on Ctrl-C. If the signal listener cannot be installed, log and
/// never resolve, so the server keeps running.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    info!(
        target: "startup",
        "pocketbook starting: bind={}, scheme={:?}, cookie={}, ttl_hours={}, account_check={}",
        config.bind_addr, config.scheme, config.cookie_name, config.credential_ttl_hours, config.account_check
    );
    let app = build_router(build_state(&config)?);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    info!("Starting server on {}", config.bind_addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
