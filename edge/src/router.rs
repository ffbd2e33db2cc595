//! Route-group assembly grounded on the corpus's API gateway's
//! `create_http_router`, generalized from one versioned route table into the
//! five named groups the gateway's route map requires: public/auth splits
//! per resource plus a standalone admin group.

use axum::routing::{delete, get, patch, post, put};
use axum::Router;

use crate::handlers::{listings, news, reviews, users};
use crate::state::AppState;

async fn health() -> &'static str {
    "ok"
}

fn public_user_routes() -> Router<AppState> {
    Router::new().route("/api/auth/register", post(users::register)).route("/api/auth/login", post(users::login))
}

fn auth_user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/logout", post(users::logout))
        .route("/api/users/me", get(users::get_profile).put(users::update_profile).delete(users::delete_account))
        .route("/api/users/me/password", post(users::change_password))
        .route("/api/users/me/deactivate", post(users::deactivate))
}

fn public_content_routes() -> Router<AppState> {
    Router::new()
        .route("/api/listings/search", get(listings::search))
        .route("/api/listings/{id}", get(listings::get))
        .route("/api/listings/{id}/photos", get(listings::list_photos))
        .route("/api/listings/{id}/status", get(listings::get_status))
        .route("/api/reviews/{id}", get(reviews::get))
        .route("/api/products/{id}/reviews", get(reviews::list_by_product))
        .route("/api/products/{id}/reviews/rating", get(reviews::average_rating))
        .route("/api/news", get(news::list))
        .route("/api/news/{id}", get(news::get))
        .route("/api/news/{id}/comments", get(news::list_comments))
}

fn auth_content_routes() -> Router<AppState> {
    Router::new()
        .route("/api/listings", post(listings::create))
        .route("/api/listings/{id}", put(listings::update).delete(listings::delete))
        .route("/api/listings/{id}/photos", post(listings::upload_photo))
        .route("/api/listings/{id}/status", patch(listings::update_status))
        .route("/api/favorites", post(listings::add_favorite).delete(listings::remove_favorite).get(listings::list_favorites))
        .route("/api/reviews", post(reviews::create))
        .route("/api/reviews/{id}", put(reviews::update).delete(reviews::delete))
        .route("/api/reviews/my", get(reviews::list_my))
        .route("/api/news", post(news::create))
        .route("/api/news/{id}", put(news::update).delete(news::delete))
        .route("/api/news/{id}/comments", post(news::add_comment))
        .route("/api/comments/{id}", delete(news::delete_comment))
        .route("/api/likes/toggle", post(news::toggle_like))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(users::admin_list))
        .route("/api/admin/users/search", post(users::admin_search))
        .route("/api/admin/users/delete", post(users::admin_delete))
        .route("/api/admin/users/role", post(users::admin_update_role))
        .route("/api/admin/users/active", post(users::admin_set_active))
        .route("/api/admin/reviews/{id}/moderate", patch(reviews::moderate))
}

pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(public_user_routes())
        .merge(auth_user_routes())
        .merge(public_content_routes())
        .merge(auth_content_routes())
        .merge(admin_routes())
        .with_state(state)
}
