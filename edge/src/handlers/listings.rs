use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{optional_token, outgoing, require_auth};
use crate::clients::listings::{
    CreateListingRequest, DeleteListingRequest, FavoriteReply, FavoriteRequest, GetListingRequest, Listing,
    ListFavoritesRequest, SearchListingsRequest, UpdateListingRequest, UpdateListingStatusRequest, UploadPhotoRequest,
};
use crate::dto::ts;
use crate::error::ApiError;
use crate::state::AppState;

fn listing_json(listing: &Listing) -> Value {
    json!({
        "id": listing.id,
        "owner_user_id": listing.owner_user_id,
        "category_id": listing.category_id,
        "title": listing.title,
        "description": listing.description,
        "price": listing.price,
        "status": listing.status,
        "photo_urls": listing.photo_urls,
        "created_at": ts(listing.created_at.as_ref()),
        "updated_at": ts(listing.updated_at.as_ref()),
    })
}

fn favorite_json(favorite: &FavoriteReply) -> Value {
    json!({
        "id": favorite.id,
        "user_id": favorite.user_id,
        "listing_id": favorite.listing_id,
        "created_at": ts(favorite.created_at.as_ref()),
    })
}

#[derive(Deserialize)]
pub struct CreateListingBody {
    pub category_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateListingBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = CreateListingRequest {
        owner_user_id: claims.user_id,
        category_id: body.category_id,
        title: body.title,
        description: body.description,
        price: body.price,
    };
    let reply = state
        .clients
        .listings
        .clone()
        .create_listing(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    let listing = reply.listing.ok_or_else(|| ApiError::bad_request("create did not return a listing"))?;
    Ok((StatusCode::CREATED, Json(listing_json(&listing))))
}

#[derive(Deserialize)]
pub struct UpdateListingBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub category_id: String,
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
    Json(body): Json<UpdateListingBody>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let caller_is_admin = claims.is_admin();
    let req = UpdateListingRequest {
        listing_id,
        caller_user_id: claims.user_id,
        caller_is_admin,
        title: body.title,
        description: body.description,
        price: body.price,
        category_id: body.category_id,
    };
    let reply = state
        .clients
        .listings
        .clone()
        .update_listing(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    let listing = reply.listing.ok_or_else(|| ApiError::bad_request("update did not return a listing"))?;
    Ok(Json(listing_json(&listing)))
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = DeleteListingRequest { listing_id, caller_user_id: claims.user_id, caller_is_admin: claims.is_admin() };
    state
        .clients
        .listings
        .clone()
        .delete_listing(outgoing(req, Some(token), state.deadline_secs()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let token = optional_token(&headers);
    let req = GetListingRequest { listing_id };
    let reply = state
        .clients
        .listings
        .clone()
        .get_listing(outgoing(req, token, state.deadline_secs()))
        .await?
        .into_inner();
    let listing = reply.listing.ok_or_else(|| ApiError::bad_request("listing not returned"))?;
    Ok(Json(listing_json(&listing)))
}

pub async fn list_photos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let token = optional_token(&headers);
    let req = GetListingRequest { listing_id };
    let reply =
        state.clients.listings.clone().list_photos(outgoing(req, token, state.deadline_secs())).await?.into_inner();
    Ok(Json(json!({ "photo_urls": reply.photo_urls })))
}

pub async fn get_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let token = optional_token(&headers);
    let req = GetListingRequest { listing_id };
    let reply = state.clients.listings.clone().get_listing(outgoing(req, token, state.deadline_secs())).await?.into_inner();
    let listing = reply.listing.ok_or_else(|| ApiError::bad_request("listing not returned"))?;
    Ok(Json(json!({ "status": listing.status })))
}

#[derive(Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = UpdateListingStatusRequest {
        listing_id,
        caller_user_id: claims.user_id,
        caller_is_admin: claims.is_admin(),
        status: body.status,
    };
    let reply = state
        .clients
        .listings
        .clone()
        .update_listing_status(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    let listing = reply.listing.ok_or_else(|| ApiError::bad_request("update did not return a listing"))?;
    Ok(Json(listing_json(&listing)))
}

#[derive(Deserialize, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub min_price: f64,
    #[serde(default)]
    pub max_price: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub limit: i32,
    #[serde(default)]
    pub sort_by: String,
    #[serde(default)]
    pub sort_order: String,
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let token = optional_token(&headers);
    let req = SearchListingsRequest {
        query: q.query,
        category_id: q.category_id,
        owner_id: q.owner_id,
        min_price: q.min_price,
        max_price: q.max_price,
        status: q.status,
        page: q.page,
        limit: q.limit,
        sort_by: q.sort_by,
        sort_order: q.sort_order,
    };
    let reply =
        state.clients.listings.clone().search_listings(outgoing(req, token, state.deadline_secs())).await?.into_inner();
    Ok(Json(json!({
        "items": reply.items.iter().map(listing_json).collect::<Vec<_>>(),
        "total_count": reply.total_count,
        "page": reply.page,
        "limit": reply.limit,
    })))
}

#[derive(Deserialize)]
pub struct UploadPhotoBody {
    pub data_base64: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "image/jpeg".to_string()
}

pub async fn upload_photo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
    Json(body): Json<UploadPhotoBody>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let data = base64_decode(&body.data_base64).map_err(ApiError::bad_request)?;
    let req = UploadPhotoRequest { listing_id, caller_user_id: claims.user_id, data, content_type: body.content_type };
    let reply = state
        .clients
        .listings
        .clone()
        .upload_photo(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(json!({ "url": reply.url })))
}

/// Minimal base64 decoder: the object-storage SDK is out of scope and so is
/// pulling in a dedicated base64 crate for one request field.
fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    const TABLE: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut reverse = [255u8; 256];
    for (i, &c) in TABLE.iter().enumerate() {
        reverse[c as usize] = i as u8;
    }
    let cleaned: Vec<u8> = input.bytes().filter(|b| *b != b'=' && !b.is_ascii_whitespace()).collect();
    let mut out = Vec::with_capacity(cleaned.len() * 3 / 4);
    for chunk in cleaned.chunks(4) {
        let mut buf = [0u8; 4];
        for (i, &c) in chunk.iter().enumerate() {
            let v = reverse[c as usize];
            if v == 255 {
                return Err("invalid base64 input".to_string());
            }
            buf[i] = v;
        }
        out.push((buf[0] << 2) | (buf[1] >> 4));
        if chunk.len() > 2 {
            out.push((buf[1] << 4) | (buf[2] >> 2));
        }
        if chunk.len() > 3 {
            out.push((buf[2] << 6) | buf[3]);
        }
    }
    Ok(out)
}

#[derive(Deserialize)]
pub struct FavoriteBody {
    pub listing_id: String,
}

pub async fn add_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<FavoriteBody>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = FavoriteRequest { user_id: claims.user_id, listing_id: body.listing_id };
    let reply = state
        .clients
        .listings
        .clone()
        .add_favorite(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(favorite_json(&reply)))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<FavoriteBody>,
) -> Result<StatusCode, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = FavoriteRequest { user_id: claims.user_id, listing_id: body.listing_id };
    state
        .clients
        .listings
        .clone()
        .remove_favorite(outgoing(req, Some(token), state.deadline_secs()))
        .await?;
    Ok(StatusCode::OK)
}

pub async fn list_favorites(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = ListFavoritesRequest { user_id: claims.user_id };
    let reply = state
        .clients
        .listings
        .clone()
        .list_favorites(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(json!({ "items": reply.items.iter().map(favorite_json).collect::<Vec<_>>() })))
}
