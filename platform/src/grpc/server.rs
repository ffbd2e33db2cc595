//! RPC server runtime: listener, health, reflection, graceful shutdown.

use std::net::SocketAddr;
use std::time::Duration;

use tonic::service::Routes;
use tonic::transport::server::Router;
use tonic::transport::Server as TonicServer;

use crate::grpc::health::HealthState;

pub struct GrpcServer {
    port: u16,
}

impl GrpcServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn build(&self) -> TonicServer {
        TonicServer::builder()
            .timeout(Duration::from_secs(30))
            .tcp_keepalive(Some(Duration::from_secs(60)))
    }
}

/// Assembles health + reflection + the domain service into one `Routes`,
/// following the same add-as-you-go builder shape as the rest of the
/// corpus's server wiring.
pub struct GrpcServicesBuilder {
    routes: Routes,
    health: HealthState,
}

impl GrpcServicesBuilder {
    pub fn new() -> Self {
        let health = HealthState::new();
        let health_service = health.server();
        Self {
            routes: health_service,
            health,
        }
    }

    pub fn health(&self) -> HealthState {
        self.health.clone()
    }

    pub fn add_service<S>(mut self, svc: S) -> Self
    where
        S: tower::Service<http::Request<tonic::body::Body>, Error = std::convert::Infallible>
            + tonic::server::NamedService
            + Clone
            + Send
            + Sync
            + 'static,
        S::Response: axum::response::IntoResponse,
        S::Future: Send + 'static,
    {
        self.routes = self.routes.add_service(svc);
        self
    }

    pub fn build(self, mut server: TonicServer) -> Router {
        server.add_routes(self.routes)
    }
}

impl Default for GrpcServicesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Races SIGINT/SIGTERM, same shape the HTTP server uses, so gRPC and HTTP
/// shut down in lockstep when run with `tokio::try_join!`.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl_c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, starting graceful shutdown"),
    }
}
