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
use marketplace_platform::storage::InMemoryObjectStore;

use config::Config;
use domain::ListingService;
use grpc_service::pb::listing_service_server::ListingServiceServer;
use grpc_service::ListingGrpcService;
use repository::{FavoritesRepository, ListingsRepository};

async fn run<C: CachePort + 'static, E: EventPublisher + 'static>(
    config: Config,
    cache: C,
    events: E,
) -> anyhow::Result<()> {
    let domain = Arc::new(ListingService {
        listings: Arc::new(ListingsRepository::new()),
        favorites: Arc::new(FavoritesRepository::new()),
        cache: Arc::new(cache),
        events: Arc::new(events),
        storage: Arc::new(InMemoryObjectStore::new()),
    });

    let grpc_service = ListingGrpcService { domain };
    let tokens = Arc::new(TokenVerifier::new(&config.hmac_secret));

    let gate = AuthGate::new(tokens)
        .public("marketplace.listings.v1.ListingService/GetListing")
        .public("marketplace.listings.v1.ListingService/ListPhotos")
        .public("marketplace.listings.v1.ListingService/SearchListings");

    let builder = GrpcServicesBuilder::new();
    let health = builder.health();
    let builder = builder.add_service(ListingServiceServer::with_interceptor(grpc_service, auth_interceptor(gate)));

    let server = GrpcServer::new(config.grpc_port);
    let addr = server.socket_addr();
    let router = builder.build(server.build());

    health.mark_serving().await;
    tracing::info!(%addr, "listings-service grpc server listening");

    router.serve_with_shutdown(addr, marketplace_platform::grpc::shutdown_signal()).await?;

    tracing::info!("listings-service shutdown complete");
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
