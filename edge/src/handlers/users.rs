use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{bearer_token, outgoing, require_auth};
use crate::clients::users::{
    AdminDeleteUserRequest, AdminListUsersRequest, AdminSearchUsersRequest, AdminSetActiveRequest,
    AdminUpdateRoleRequest, ChangePasswordRequest, DeactivateAccountRequest, DeleteAccountRequest,
    GetProfileRequest, LoginRequest, RegisterRequest, UpdateProfileRequest, User,
};
use crate::dto::ts;
use crate::error::ApiError;
use crate::state::AppState;

fn user_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "phone": user.phone,
        "role": user.role,
        "active": user.active,
        "email_verified": user.email_verified,
        "verified_at": ts(user.verified_at.as_ref()),
        "created_at": ts(user.created_at.as_ref()),
        "updated_at": ts(user.updated_at.as_ref()),
    })
}

#[derive(Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone_number: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let req = RegisterRequest { username: body.username, email: body.email, password: body.password, phone: body.phone_number };
    let reply = state
        .clients
        .users
        .clone()
        .register(outgoing(req, None, state.deadline_secs()))
        .await?
        .into_inner();
    let user = reply.user.ok_or_else(|| ApiError::bad_request("register did not return a user"))?;
    Ok((StatusCode::CREATED, Json(json!({ "user_id": user.id, "user": user_json(&user) }))))
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Result<Json<Value>, ApiError> {
    let req = LoginRequest { email: body.email, password: body.password };
    let reply = state.clients.users.clone().login(outgoing(req, None, state.deadline_secs())).await?.into_inner();
    Ok(Json(json!({ "token": reply.token, "user": reply.user.as_ref().map(user_json) })))
}

pub async fn logout() -> StatusCode {
    // Tokens are stateless (HMAC-signed, no server-side session); logout is
    // a client-side no-op against this gateway.
    StatusCode::OK
}

pub async fn get_profile(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = GetProfileRequest { user_id: claims.user_id };
    let reply = state
        .clients
        .users
        .clone()
        .get_profile(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(json!({ "user": reply.user.as_ref().map(user_json) })))
}

#[derive(Deserialize)]
pub struct UpdateProfileBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub phone: String,
}

pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = UpdateProfileRequest { user_id: claims.user_id, username: body.username, phone: body.phone };
    let reply = state
        .clients
        .users
        .clone()
        .update_profile(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(json!({ "user": reply.user.as_ref().map(user_json) })))
}

#[derive(Deserialize)]
pub struct ChangePasswordBody {
    pub old_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChangePasswordBody>,
) -> Result<StatusCode, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = ChangePasswordRequest {
        user_id: claims.user_id,
        old_password: body.old_password,
        new_password: body.new_password,
    };
    state
        .clients
        .users
        .clone()
        .change_password(outgoing(req, Some(token), state.deadline_secs()))
        .await?;
    Ok(StatusCode::OK)
}

pub async fn delete_account(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = DeleteAccountRequest { user_id: claims.user_id };
    state
        .clients
        .users
        .clone()
        .delete_account(outgoing(req, Some(token), state.deadline_secs()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deactivate(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let (token, claims) = require_auth(&headers, &state.verifier)?;
    let req = DeactivateAccountRequest { user_id: claims.user_id };
    state
        .clients
        .users
        .clone()
        .deactivate_account(outgoing(req, Some(token), state.deadline_secs()))
        .await?;
    Ok(StatusCode::OK)
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub limit: i32,
}

pub async fn admin_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(query): Json<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let token = bearer_token(&headers)?;
    let req = AdminListUsersRequest { page: query.page, limit: query.limit };
    let reply = state
        .clients
        .users
        .clone()
        .admin_list_users(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(json!({
        "items": reply.items.iter().map(user_json).collect::<Vec<_>>(),
        "total_count": reply.total_count,
        "page": reply.page,
        "limit": reply.limit,
    })))
}

#[derive(Deserialize)]
pub struct AdminSearchBody {
    pub query: String,
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub limit: i32,
}

pub async fn admin_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AdminSearchBody>,
) -> Result<Json<Value>, ApiError> {
    let token = bearer_token(&headers)?;
    let req = AdminSearchUsersRequest { query: body.query, page: body.page, limit: body.limit };
    let reply = state
        .clients
        .users
        .clone()
        .admin_search_users(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(json!({
        "items": reply.items.iter().map(user_json).collect::<Vec<_>>(),
        "total_count": reply.total_count,
        "page": reply.page,
        "limit": reply.limit,
    })))
}

#[derive(Deserialize)]
pub struct AdminDeleteBody {
    pub user_id: String,
}

pub async fn admin_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AdminDeleteBody>,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers)?;
    let req = AdminDeleteUserRequest { user_id: body.user_id };
    state
        .clients
        .users
        .clone()
        .admin_delete_user(outgoing(req, Some(token), state.deadline_secs()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct AdminUpdateRoleBody {
    pub user_id: String,
    pub role: String,
}

pub async fn admin_update_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AdminUpdateRoleBody>,
) -> Result<Json<Value>, ApiError> {
    let token = bearer_token(&headers)?;
    let req = AdminUpdateRoleRequest { user_id: body.user_id, role: body.role };
    let reply = state
        .clients
        .users
        .clone()
        .admin_update_role(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(json!({ "user": reply.user.as_ref().map(user_json) })))
}

#[derive(Deserialize)]
pub struct AdminSetActiveBody {
    pub user_id: String,
    pub active: bool,
}

pub async fn admin_set_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AdminSetActiveBody>,
) -> Result<Json<Value>, ApiError> {
    let token = bearer_token(&headers)?;
    let req = AdminSetActiveRequest { user_id: body.user_id, active: body.active };
    let reply = state
        .clients
        .users
        .clone()
        .admin_set_active(outgoing(req, Some(token), state.deadline_secs()))
        .await?
        .into_inner();
    Ok(Json(json!({ "user": reply.user.as_ref().map(user_json) })))
}
