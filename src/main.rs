use tracing::info;

use pocketbook::config::GatewayConfig;
use pocketbook::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "pocketbook", "pocketbook gateway starting: RUST_LOG='{}'", rust_log);

    let config = GatewayConfig::from_env()?;
    pocketbook::server::run(config).await
}
