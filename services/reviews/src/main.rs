mod config;
mod domain;
mod grpc_service;
mod repository;

use std::sync::Arc;

use marketplace_platform::auth::TokenVerifier;
use marketplace_platform::cache::{CachePort, InMemoryCachePort, RedisCachePort};
use marketplace_platform::events::{EventPublisher, InMemoryEventPublisher, NatsEventPublisher};
use marketplace_platform::grpc::interceptors::{auth_interceptor, AuthGate};
use marketplace_platform::grpc::{GrpcServer, GrpcServicesBuilder};
use marketplace_platform::observability::init_tracing;

use config::Config;
use domain::ReviewService;
use grpc_service::pb::review_service_server::ReviewServiceServer;
use grpc_service::ReviewGrpcService;
use repository::ReviewsRepository;

async fn run<C: CachePort + 'static, E: EventPublisher + 'static>(
    config: Config,
    cache: C,
    events: E,
) -> anyhow::Result<()> {
    let domain = Arc::new(ReviewService {
        repo: Arc::new(ReviewsRepository::new()),
        cache: Arc::new(cache),
        events: Arc::new(events),
    });

    let grpc_service = ReviewGrpcService { domain };
    let tokens = Arc::new(TokenVerifier::new(&config.hmac_secret));

    let gate = AuthGate::new(tokens)
        .public("marketplace.reviews.v1.ReviewService/GetReview")
        .public("marketplace.reviews.v1.ReviewService/ListByProduct")
        .public("marketplace.reviews.v1.ReviewService/AverageRating")
        .require_role("marketplace.reviews.v1.ReviewService/ModerateReview", &["admin"]);

    let builder = GrpcServicesBuilder::new();
    let health = builder.health();
    let builder = builder.add_service(ReviewServiceServer::with_interceptor(grpc_service, auth_interceptor(gate)));

    let server = GrpcServer::new(config.grpc_port);
    let addr = server.socket_addr();
    let router = builder.build(server.build());

    health.mark_serving().await;
    tracing::info!(%addr, "reviews-service grpc server listening");

    router.serve_with_shutdown(addr, marketplace_platform::grpc::shutdown_signal()).await?;

    tracing::info!("reviews-service shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config.service.name, &config.service.log_level);

    match (&config.redis_url, &config.nats_url) {
        (Some(redis_url), Some(nats_url)) => {
            let cache = RedisCachePort::connect(redis_url, 5).await?;
            let events = NatsEventPublisher::connect(nats_url, 5).await?;
            run(config, cache, events).await
        }
        (Some(redis_url), None) => {
            tracing::warn!("no nats_url configured, events will be captured in-memory only");
            let cache = RedisCachePort::connect(redis_url, 5).await?;
            run(config, cache, InMemoryEventPublisher::new()).await
        }
        (None, Some(nats_url)) => {
            tracing::warn!("no redis_url configured, caching in-memory only");
            let events = NatsEventPublisher::connect(nats_url, 5).await?;
            run(config, InMemoryCachePort::new(), events).await
        }
        (None, None) => {
            tracing::warn!("no redis_url or nats_url configured, running with in-memory cache and events");
            run(config, InMemoryCachePort::new(), InMemoryEventPublisher::new()).await
        }
    }
}
