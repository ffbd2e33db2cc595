//! Generated RPC client stubs and a connected-client bundle the router
//! hands to every handler, grounded on the gRPC client connection pattern
//! the corpus's own API gateway example uses.

pub mod users {
    tonic::include_proto!("marketplace.users.v1");
}
pub mod listings {
    tonic::include_proto!("marketplace.listings.v1");
}
pub mod reviews {
    tonic::include_proto!("marketplace.reviews.v1");
}
pub mod news {
    tonic::include_proto!("marketplace.news.v1");
}

use tonic::transport::Channel;

use users::user_service_client::UserServiceClient;
use listings::listing_service_client::ListingServiceClient;
use reviews::review_service_client::ReviewServiceClient;
use news::news_service_client::NewsServiceClient;

use crate::config::Config;

#[derive(Clone)]
pub struct Clients {
    pub users: UserServiceClient<Channel>,
    pub listings: ListingServiceClient<Channel>,
    pub reviews: ReviewServiceClient<Channel>,
    pub news: NewsServiceClient<Channel>,
}

impl Clients {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let users = UserServiceClient::new(lazy_channel(&config.users_addr)?);
        let listings = ListingServiceClient::new(lazy_channel(&config.listings_addr)?);
        let reviews = ReviewServiceClient::new(lazy_channel(&config.reviews_addr)?);
        let news = NewsServiceClient::new(lazy_channel(&config.news_addr)?);
        Ok(Self { users, listings, reviews, news })
    }
}

/// Lazily-connecting channel: the TCP handshake happens on first call
/// rather than at startup, so the edge can come up before its downstream
/// services do.
fn lazy_channel(addr: &str) -> anyhow::Result<Channel> {
    Ok(Channel::from_shared(addr.to_string())?.connect_lazy())
}
