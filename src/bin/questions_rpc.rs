//! Standalone questions RPC service.
//!
//! Serves the in-process [`QuestionBank`] on the JSON-over-HTTP RPC paths.
//! It has no authentication of its own: it trusts the `user_id` in each
//! message, so bind it where only the gateway can reach it.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use pocketbook::config::QuestionsRpcConfig;
use pocketbook::observability::init_tracing;
use pocketbook::questions::rpc::rpc_router;
use pocketbook::questions::QuestionBank;
use pocketbook::server::shutdown_signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = QuestionsRpcConfig::from_env()?;

    let app = rpc_router(Arc::new(QuestionBank::new()));
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    info!(target: "pocketbook", "questions RPC service listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
