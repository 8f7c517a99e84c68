pub mod auth;
pub mod catalog;
pub mod error;
pub mod media;
pub mod middleware;
pub mod oauth;
pub mod state;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde_json::{Value, json};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

/// Every route the service exposes. Transport layers (CORS, tracing) are
/// added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/search", get(catalog::search))
        .route("/api/catalog/popular", get(catalog::popular))
        .route("/api/catalog/{media_type}/{id}", get(catalog::details))
        .route("/api/auth/providers", get(auth::providers))
        .route("/api/auth/signin/{provider}", get(auth::signin))
        .route("/api/auth/callback/{provider}", get(auth::callback))
        .route("/api/auth/signout", post(auth::signout));

    let protected_routes = Router::new()
        .route("/api/auth/session", get(auth::session))
        .route("/api/media", get(media::get_media).post(media::upsert_media))
        .route("/api/library", get(media::list_library))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests;
