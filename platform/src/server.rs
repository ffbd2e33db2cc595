//! HTTP server with the shared middleware stack and graceful shutdown. One
//! instance per edge process.

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveHeadersLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::grpc::server::shutdown_signal;
use crate::ids::MakeMarketplaceRequestId;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct HttpServer {
    port: u16,
    timeout_secs: u64,
    body_limit_mb: usize,
}

impl HttpServer {
    pub fn new(port: u16, timeout_secs: u64, body_limit_mb: usize) -> Self {
        Self { port, timeout_secs, body_limit_mb }
    }

    pub async fn serve(self, app: Router) -> anyhow::Result<()> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.port));
        let header_name = http::HeaderName::from_static(REQUEST_ID_HEADER);

        let app = app
            .layer(CorsLayer::permissive())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::new(Duration::from_secs(self.timeout_secs)))
            .layer(RequestBodyLimitLayer::new(self.body_limit_mb * 1024 * 1024))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_response(DefaultOnResponse::new().include_headers(true)),
            )
            .layer(SetSensitiveHeadersLayer::new([http::header::AUTHORIZATION]))
            .layer(PropagateRequestIdLayer::new(header_name.clone()))
            .layer(SetRequestIdLayer::new(header_name, MakeMarketplaceRequestId))
            .layer(CatchPanicLayer::new());

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(%addr, "http server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("http server shutdown complete");
        Ok(())
    }
}
