mod config;
mod domain;
mod grpc_service;
mod repository;

use std::sync::Arc;

use marketplace_platform::auth::{PasswordHasher, TokenVerifier};
use marketplace_platform::events::{EventPublisher, InMemoryEventPublisher, NatsEventPublisher};
use marketplace_platform::grpc::interceptors::{auth_interceptor, AuthGate};
use marketplace_platform::grpc::{GrpcServer, GrpcServicesBuilder};
use marketplace_platform::observability::init_tracing;

use config::Config;
use domain::UserService;
use grpc_service::pb::user_service_server::UserServiceServer;
use grpc_service::UserGrpcService;
use repository::UsersRepository;

async fn run<E: EventPublisher + 'static>(config: Config, events: E) -> anyhow::Result<()> {
    let repo = Arc::new(UsersRepository::new());
    let hasher = Arc::new(PasswordHasher::default());
    let tokens = Arc::new(TokenVerifier::new(&config.hmac_secret));
    let events = Arc::new(events);

    let domain = Arc::new(UserService {
        repo,
        hasher,
        tokens: tokens.clone(),
        events,
        token_ttl_secs: config.token_ttl_secs,
    });

    let grpc_service = UserGrpcService { domain };

    let gate = AuthGate::new(tokens)
        .public("marketplace.users.v1.UserService/Register")
        .public("marketplace.users.v1.UserService/Login")
        .require_role("marketplace.users.v1.UserService/AdminListUsers", &["admin"])
        .require_role("marketplace.users.v1.UserService/AdminSearchUsers", &["admin"])
        .require_role("marketplace.users.v1.UserService/AdminDeleteUser", &["admin"])
        .require_role("marketplace.users.v1.UserService/AdminUpdateRole", &["admin"])
        .require_role("marketplace.users.v1.UserService/AdminSetActive", &["admin"]);

    let builder = GrpcServicesBuilder::new();
    let health = builder.health();
    let builder = builder.add_service(UserServiceServer::with_interceptor(grpc_service, auth_interceptor(gate)));

    let server = GrpcServer::new(config.grpc_port);
    let addr = server.socket_addr();
    let router = builder.build(server.build());

    health.mark_serving().await;
    tracing::info!(%addr, "users-service grpc server listening");

    router
        .serve_with_shutdown(addr, marketplace_platform::grpc::shutdown_signal())
        .await?;

    tracing::info!("users-service shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config.service.name, &config.service.log_level);

    match &config.nats_url {
        Some(url) => {
            let publisher = NatsEventPublisher::connect(url, 5).await?;
            run(config, publisher).await
        }
        None => {
            tracing::warn!("no nats_url configured, events will be captured in-memory only");
            run(config, InMemoryEventPublisher::new()).await
        }
    }
}
