pub mod pb {
    tonic::include_proto!("marketplace.reviews.v1");
}

use std::sync::Arc;

use marketplace_platform::cache::CachePort;
use marketplace_platform::events::EventPublisher;
use marketplace_platform::time::to_proto;
use tonic::{Request, Response, Status};

use crate::domain::ReviewService;
use crate::repository::ReviewRecord;
use pb::review_service_server::ReviewService as ReviewServiceTrait;
use pb::*;

fn to_proto_review(record: &ReviewRecord) -> Review {
    Review {
        id: record.id.clone(),
        author_user_id: record.author_user_id.clone(),
        product_id: record.product_id.clone().unwrap_or_default(),
        seller_id: record.seller_id.clone().unwrap_or_default(),
        rating: record.rating,
        comment: record.comment.clone(),
        status: record.status.clone(),
        moderation_comment: record.moderation_comment.clone(),
        version: record.version,
        created_at: Some(to_proto(record.created_at)),
        updated_at: Some(to_proto(record.updated_at)),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub struct ReviewGrpcService<C: CachePort, E: EventPublisher> {
    pub domain: Arc<ReviewService<C, E>>,
}

#[tonic::async_trait]
impl<C: CachePort + 'static, E: EventPublisher + 'static> ReviewServiceTrait for ReviewGrpcService<C, E> {
    async fn create_review(&self, request: Request<CreateReviewRequest>) -> Result<Response<ReviewReply>, Status> {
        let req = request.into_inner();
        let review = self
            .domain
            .create(req.author_user_id, non_empty(req.product_id), non_empty(req.seller_id), req.rating, req.comment)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(ReviewReply { review: Some(to_proto_review(&review)) }))
    }

    async fn update_review(&self, request: Request<UpdateReviewRequest>) -> Result<Response<ReviewReply>, Status> {
        let req = request.into_inner();
        let review = self
            .domain
            .update(&req.review_id, &req.caller_user_id, req.rating, req.comment, req.expected_version)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(ReviewReply { review: Some(to_proto_review(&review)) }))
    }

    async fn delete_review(&self, request: Request<DeleteReviewRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        self.domain
            .delete(&req.review_id, &req.caller_user_id, req.caller_is_admin)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(Empty {}))
    }

    async fn get_review(&self, request: Request<GetReviewRequest>) -> Result<Response<ReviewReply>, Status> {
        let req = request.into_inner();
        let review = self.domain.get(&req.review_id).await.map_err(|e| e.to_status())?;
        Ok(Response::new(ReviewReply { review: Some(to_proto_review(&review)) }))
    }

    async fn moderate_review(&self, request: Request<ModerateReviewRequest>) -> Result<Response<ReviewReply>, Status> {
        let req = request.into_inner();
        let review = self
            .domain
            .moderate(&req.review_id, &req.new_status, req.moderation_comment)
            .await
            .map_err(|e| e.to_status())?;
        Ok(Response::new(ReviewReply { review: Some(to_proto_review(&review)) }))
    }

    async fn list_by_product(&self, request: Request<ListByProductRequest>) -> Result<Response<ListReviewsReply>, Status> {
        let req = request.into_inner();
        let (items, total, page, limit) =
            self.domain.list_by_product(&req.product_id, non_empty(req.status), req.page as i64, req.limit as i64);
        Ok(Response::new(ListReviewsReply {
            items: items.iter().map(to_proto_review).collect(),
            total_count: total as i64,
            page: page as i32,
            limit: limit as i32,
        }))
    }

    async fn list_by_user(&self, request: Request<ListByUserRequest>) -> Result<Response<ListReviewsReply>, Status> {
        let req = request.into_inner();
        let (items, total, page, limit) = self.domain.list_by_user(&req.caller_user_id, req.page as i64, req.limit as i64);
        Ok(Response::new(ListReviewsReply {
            items: items.iter().map(to_proto_review).collect(),
            total_count: total as i64,
            page: page as i32,
            limit: limit as i32,
        }))
    }

    async fn average_rating(&self, request: Request<AverageRatingRequest>) -> Result<Response<AverageRatingReply>, Status> {
        let req = request.into_inner();
        let (average_rating, review_count) = self.domain.average_rating(&req.product_id);
        Ok(Response::new(AverageRatingReply { average_rating, review_count }))
    }
}
