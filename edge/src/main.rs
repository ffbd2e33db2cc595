mod auth;
mod clients;
mod config;
mod dto;
mod error;
mod handlers;
mod router;
mod state;

use std::sync::Arc;

use marketplace_platform::auth::TokenVerifier;
use marketplace_platform::observability::init_tracing;
use marketplace_platform::server::HttpServer;

use clients::Clients;
use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config.service.name, &config.service.log_level);

    let clients = Clients::connect(&config).await?;
    let verifier = Arc::new(TokenVerifier::new(&config.hmac_secret));
    let http_port = config.http_port;
    let timeout_secs = config.request_timeout_secs;
    let body_limit_mb = config.body_limit_mb;
    let state = AppState { clients, verifier, config: Arc::new(config) };

    let app = router::build(state);

    tracing::info!(port = http_port, "edge gateway listening");
    HttpServer::new(http_port, timeout_secs, body_limit_mb).serve(app).await?;

    tracing::info!("edge gateway shutdown complete");
    Ok(())
}
