use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{bearer_token, optional_token, outgoing, require_auth};
use crate::clients::reviews::{
    AverageRatingRequest, CreateReviewRequest, DeleteReviewRequest, GetReviewRequest, ListByProductRequest,
    ListByUserRequest, ModerateReviewRequest, Review, UpdateReviewRequest,
};
use crate::dto::ts;
use crate::error::ApiError;
use crate::state::AppState;

fn review_json(review: &Review) -> Value {
    json!({
        "id": review.id,
        "author_user_id": review.author_user_id,
        "product_id": review.product_id,
        "seller_id": review.seller_id,
        "rating": review.rating,
        "comment": review.comment,
        "status": review.status,
        "moderation_comment": review.moderation_comment,
        "version": review.version,
        "created_at": ts(review.created_at.as_ref()),
        "updated_at": ts(review.updated_at.as_ref()),
    })
}

#[derive(Deserialize)]
pub struct CreateReviewBody {
    pub product_id: String,
    pub seller_id: String,
    pub rating: i32,
    pub comment: String,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateReviewBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = CreateReviewRequest {
        author_user_id: claims.user_id,
        product_id: body.product_id,
        seller_id: body.seller_id,
        rating: body.rating,
        comment: body.comment,
    };
    let reply = state
        .clients
        .reviews
        .clone()
        .create_review(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    let review = reply.review.ok_or_else(|| ApiError::bad_request("create did not return a review"))?;
    Ok((StatusCode::CREATED, Json(review_json(&review))))
}

#[derive(Deserialize)]
pub struct UpdateReviewBody {
    pub rating: i32,
    pub comment: String,
    pub expected_version: i64,
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(review_id): Path<String>,
    Json(body): Json<UpdateReviewBody>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = UpdateReviewRequest {
        review_id,
        caller_user_id: claims.user_id,
        rating: body.rating,
        comment: body.comment,
        expected_version: body.expected_version,
    };
    let reply = state
        .clients
        .reviews
        .clone()
        .update_review(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    let review = reply.review.ok_or_else(|| ApiError::bad_request("update did not return a review"))?;
    Ok(Json(review_json(&review)))
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(review_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = DeleteReviewRequest { review_id, caller_user_id: claims.user_id, caller_is_admin: claims.is_admin() };
    state
        .clients
        .reviews
        .clone()
        .delete_review(outgoing(req, Some(token), state.deadline_secs()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(review_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let token = optional_token(&headers);
    let req = GetReviewRequest { review_id };
    let reply = state
        .clients
        .reviews
        .clone()
        .get_review(outgoing(req, token, state.deadline_secs()))
        .await?
        .into_inner();
    let review = reply.review.ok_or_else(|| ApiError::bad_request("review not returned"))?;
    Ok(Json(review_json(&review)))
}

#[derive(Deserialize, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub limit: i32,
    #[serde(default)]
    pub status: String,
}

pub async fn list_my(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = ListByUserRequest { caller_user_id: claims.user_id, page: q.page, limit: q.limit };
    let reply = state
        .clients
        .reviews
        .clone()
        .list_by_user(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(json!({
        "items": reply.items.iter().map(review_json).collect::<Vec<_>>(),
        "total_count": reply.total_count,
        "page": reply.page,
        "limit": reply.limit,
    })))
}

pub async fn list_by_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let token = optional_token(&headers);
    let req = ListByProductRequest { product_id, status: q.status, page: q.page, limit: q.limit };
    let reply =
        state.clients.reviews.clone().list_by_product(outgoing(req, token, state.deadline_secs())).await?.into_inner();
    Ok(Json(json!({
        "items": reply.items.iter().map(review_json).collect::<Vec<_>>(),
        "total_count": reply.total_count,
        "page": reply.page,
        "limit": reply.limit,
    })))
}

pub async fn average_rating(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let token = optional_token(&headers);
    let req = AverageRatingRequest { product_id };
    let reply =
        state.clients.reviews.clone().average_rating(outgoing(req, token, state.deadline_secs())).await?.into_inner();
    Ok(Json(json!({ "average_rating": reply.average_rating, "review_count": reply.review_count })))
}

#[derive(Deserialize)]
pub struct ModerateBody {
    pub new_status: String,
    #[serde(default)]
    pub moderation_comment: String,
}

/// Role enforcement for this route lives downstream, on the review
/// service's own auth gate; the edge only needs a present bearer token to
/// forward.
pub async fn moderate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(review_id): Path<String>,
    Json(body): Json<ModerateBody>,
) -> Result<Json<Value>, ApiError> {
    let token = bearer_token(&headers)?;
    let req = ModerateReviewRequest { review_id, new_status: body.new_status, moderation_comment: body.moderation_comment };
    let reply = state
        .clients
        .reviews
        .clone()
        .moderate_review(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    let review = reply.review.ok_or_else(|| ApiError::bad_request("moderate did not return a review"))?;
    Ok(Json(review_json(&review)))
}
