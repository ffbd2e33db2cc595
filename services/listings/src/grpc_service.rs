pub mod pb {
    tonic::include_proto!("marketplace.listings.v1");
}

use std::sync::Arc;

use marketplace_platform::cache::CachePort;
use marketplace_platform::events::EventPublisher;
use marketplace_platform::storage::ObjectStoragePort;
use marketplace_platform::time::to_proto;
use tonic::{Request, Response, Status};

use crate::domain::ListingService;
use crate::repository::{FavoriteRecord, ListingRecord, ListingSearch, ListingUpdate};
use pb::listing_service_server::ListingService as ListingServiceTrait;
use pb::*;

fn to_proto_listing(record: &ListingRecord) -> Listing {
    Listing {
        id: record.id.clone(),
        owner_user_id: record.owner_user_id.clone(),
        category_id: record.category_id.clone(),
        title: record.title.clone(),
        description: record.description.clone(),
        price: record.price,
        status: record.status.clone(),
        photo_urls: record.photo_urls.clone(),
        created_at: Some(to_proto(record.created_at)),
        updated_at: Some(to_proto(record.updated_at)),
    }
}

fn to_proto_favorite(record: &FavoriteRecord) -> FavoriteReply {
    FavoriteReply {
        id: record.id.clone(),
        user_id: record.user_id.clone(),
        listing_id: record.listing_id.clone(),
        created_at: Some(to_proto(record.created_at)),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub struct ListingGrpcService<C: CachePort, E: EventPublisher, O: ObjectStoragePort> {
    pub domain: Arc<ListingService<C, E, O>>,
}

#[tonic::async_trait]
impl<C, E, O> ListingServiceTrait for ListingGrpcService<C, E, O>
where
    C: CachePort + 'static,
    E: EventPublisher + 'static,
    O: ObjectStoragePort + 'static,
{
    async fn create_listing(&self, request: Request<CreateListingRequest>) -> Result<Response<ListingReply>, Status> {
        let req = request.into_inner();
        let listing = self
            .domain
            .create(req.owner_user_id, req.category_id, req.title, req.description, req.price)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(ListingReply { listing: Some(to_proto_listing(&listing)) }))
    }

    async fn update_listing(&self, request: Request<UpdateListingRequest>) -> Result<Response<ListingReply>, Status> {
        let req = request.into_inner();
        let update = ListingUpdate {
            title: non_empty(req.title),
            description: non_empty(req.description),
            price: if req.price >= 0.0 { Some(req.price) } else { None },
            category_id: non_empty(req.category_id),
        };
        let listing = self
            .domain
            .update(&req.listing_id, &req.caller_user_id, req.caller_is_admin, update)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(ListingReply { listing: Some(to_proto_listing(&listing)) }))
    }

    async fn delete_listing(&self, request: Request<DeleteListingRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        self.domain
            .delete(&req.listing_id, &req.caller_user_id, req.caller_is_admin)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(Empty {}))
    }

    async fn get_listing(&self, request: Request<GetListingRequest>) -> Result<Response<ListingReply>, Status> {
        let req = request.into_inner();
        let listing = self.domain.get(&req.listing_id).await.map_err(|e| e.to_status())?;
        Ok(Response::new(ListingReply { listing: Some(to_proto_listing(&listing)) }))
    }

    async fn update_listing_status(
        &self,
        request: Request<UpdateListingStatusRequest>,
    ) -> Result<Response<ListingReply>, Status> {
        let req = request.into_inner();
        let listing = self
            .domain
            .update_status(&req.listing_id, &req.caller_user_id, req.caller_is_admin, &req.status)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(ListingReply { listing: Some(to_proto_listing(&listing)) }))
    }

    async fn search_listings(
        &self,
        request: Request<SearchListingsRequest>,
    ) -> Result<Response<SearchListingsReply>, Status> {
        let req = request.into_inner();
        let filter = ListingSearch {
            query: non_empty(req.query),
            category_id: non_empty(req.category_id),
            owner_id: non_empty(req.owner_id),
            min_price: if req.min_price > 0.0 { Some(req.min_price) } else { None },
            max_price: if req.max_price > 0.0 { Some(req.max_price) } else { None },
            status: non_empty(req.status),
        };
        let (items, total, page, limit) =
            self.domain.search(filter, &req.sort_by, &req.sort_order, req.page as i64, req.limit as i64);
        Ok(Response::new(SearchListingsReply {
            items: items.iter().map(to_proto_listing).collect(),
            total_count: total as i64,
            page: page as i32,
            limit: limit as i32,
        }))
    }

    async fn upload_photo(&self, request: Request<UploadPhotoRequest>) -> Result<Response<UploadPhotoReply>, Status> {
        let req = request.into_inner();
        let url = self
            .domain
            .upload_photo(&req.listing_id, &req.caller_user_id, req.data, &req.content_type)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(UploadPhotoReply { url }))
    }

    async fn list_photos(&self, request: Request<GetListingRequest>) -> Result<Response<ListPhotosReply>, Status> {
        let req = request.into_inner();
        let photo_urls = self.domain.list_photos(&req.listing_id).map_err(|e| e.to_status())?;
        Ok(Response::new(ListPhotosReply { photo_urls }))
    }

    async fn add_favorite(&self, request: Request<FavoriteRequest>) -> Result<Response<FavoriteReply>, Status> {
        let req = request.into_inner();
        let fav = self.domain.add_favorite(&req.user_id, &req.listing_id).await.map_err(|e| e.to_status())?;
        Ok(Response::new(to_proto_favorite(&fav)))
    }

    async fn remove_favorite(&self, request: Request<FavoriteRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        self.domain.remove_favorite(&req.user_id, &req.listing_id).await.map_err(|e| e.to_status())?;
        Ok(Response::new(Empty {}))
    }

    async fn list_favorites(
        &self,
        request: Request<ListFavoritesRequest>,
    ) -> Result<Response<ListFavoritesReply>, Status> {
        let req = request.into_inner();
        let items = self.domain.list_favorites(&req.user_id).iter().map(to_proto_favorite).collect();
        Ok(Response::new(ListFavoritesReply { items }))
    }
}
