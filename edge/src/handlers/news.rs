use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{optional_token, outgoing, require_auth};
use crate::clients::news::{
    AddCommentRequest, Comment, CreateNewsRequest, DeleteCommentRequest, DeleteNewsRequest, GetNewsRequest,
    ListCommentsRequest, ListNewsRequest, News, ToggleLikeRequest, UpdateNewsRequest,
};
use crate::dto::ts;
use crate::error::ApiError;
use crate::state::AppState;

fn news_json(news: &News) -> Value {
    json!({
        "id": news.id,
        "title": news.title,
        "content": news.content,
        "author_user_id": news.author_user_id,
        "image_url": news.image_url,
        "category": news.category,
        "created_at": ts(news.created_at.as_ref()),
        "updated_at": ts(news.updated_at.as_ref()),
    })
}

fn comment_json(comment: &Comment) -> Value {
    json!({
        "id": comment.id,
        "news_id": comment.news_id,
        "author_user_id": comment.author_user_id,
        "content": comment.content,
        "created_at": ts(comment.created_at.as_ref()),
        "updated_at": ts(comment.updated_at.as_ref()),
    })
}

#[derive(Deserialize)]
pub struct CreateNewsBody {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateNewsBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = CreateNewsRequest {
        title: body.title,
        content: body.content,
        author_user_id: claims.user_id,
        image_url: body.image_url,
        category: body.category,
    };
    let reply = state
        .clients
        .news
        .clone()
        .create_news(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    let news = reply.news.ok_or_else(|| ApiError::bad_request("create did not return a news item"))?;
    Ok((StatusCode::CREATED, Json(news_json(&news))))
}

#[derive(Deserialize, Default)]
pub struct UpdateNewsBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(news_id): Path<String>,
    Json(body): Json<UpdateNewsBody>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = UpdateNewsRequest {
        news_id,
        caller_user_id: claims.user_id,
        caller_is_admin: claims.is_admin(),
        title: body.title,
        content: body.content,
        image_url: body.image_url,
        category: body.category,
    };
    let reply = state
        .clients
        .news
        .clone()
        .update_news(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    let news = reply.news.ok_or_else(|| ApiError::bad_request("update did not return a news item"))?;
    Ok(Json(news_json(&news)))
}

pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(news_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let token = optional_token(&headers);
    let req = GetNewsRequest { news_id };
    let reply =
        state.clients.news.clone().get_news(outgoing(req, token, state.deadline_secs())).await?.into_inner();
    let news = reply.news.ok_or_else(|| ApiError::bad_request("news item not returned"))?;
    Ok(Json(news_json(&news)))
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(news_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = DeleteNewsRequest { news_id, caller_user_id: claims.user_id, caller_is_admin: claims.is_admin() };
    state
        .clients
        .news
        .clone()
        .delete_news_and_associated_data(outgoing(req, Some(token), state.deadline_secs()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Default)]
pub struct ListNewsQuery {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub limit: i32,
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<ListNewsQuery>,
) -> Result<Json<Value>, ApiError> {
    let token = optional_token(&headers);
    let req = ListNewsRequest { category: q.category, author_id: q.author_id, page: q.page, limit: q.limit };
    let reply = state.clients.news.clone().list_news(outgoing(req, token, state.deadline_secs())).await?.into_inner();
    Ok(Json(json!({
        "items": reply.items.iter().map(news_json).collect::<Vec<_>>(),
        "total_count": reply.total_count,
        "page": reply.page,
        "limit": reply.limit,
    })))
}

#[derive(Deserialize)]
pub struct AddCommentBody {
    pub content: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(news_id): Path<String>,
    Json(body): Json<AddCommentBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = AddCommentRequest { news_id, author_user_id: claims.user_id, content: body.content };
    let reply = state
        .clients
        .news
        .clone()
        .add_comment(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    let comment = reply.comment.ok_or_else(|| ApiError::bad_request("comment not returned"))?;
    Ok((StatusCode::CREATED, Json(comment_json(&comment))))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = DeleteCommentRequest { comment_id, caller_user_id: claims.user_id, caller_is_admin: claims.is_admin() };
    state
        .clients
        .news
        .clone()
        .delete_comment(outgoing(req, Some(token), state.deadline_secs()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(news_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let token = optional_token(&headers);
    let req = ListCommentsRequest { news_id };
    let reply =
        state.clients.news.clone().list_comments(outgoing(req, token, state.deadline_secs())).await?.into_inner();
    Ok(Json(json!({ "items": reply.items.iter().map(comment_json).collect::<Vec<_>>() })))
}

#[derive(Deserialize)]
pub struct ToggleLikeBody {
    pub content_type: String,
    pub content_id: String,
}

pub async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ToggleLikeBody>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = ToggleLikeRequest { content_type: body.content_type, content_id: body.content_id, user_id: claims.user_id };
    let reply = state
        .clients
        .news
        .clone()
        .toggle_like(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(json!({ "liked": reply.liked })))
}
