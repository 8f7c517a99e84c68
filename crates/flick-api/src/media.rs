use axum::{
    Extension, Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use flick_db::models::{MediaItemFilter, MediaItemWrite};
use flick_types::api::{LibraryQuery, MediaQuery, Principal, UpsertMediaRequest};

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

const RATING_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

/// GET /api/media: the caller's stored state for one item, or 404
/// with a `null` body when nothing is stored yet.
pub async fn get_media(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<MediaQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let media_id = query
        .media_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("mediaId is required"))?;

    let item = run_blocking(&state, move |db| db.get_media_item(&principal, &media_id)).await?;

    Ok(match item {
        Some(item) => Json(item).into_response(),
        None => (StatusCode::NOT_FOUND, Json(Value::Null)).into_response(),
    })
}

/// POST /api/media: create or fully replace the caller's state for one item.
pub async fn upsert_media(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<UpsertMediaRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let write = validate_upsert(req)?;
    let now = chrono::Utc::now();

    let item = run_blocking(&state, move |db| db.upsert_media_item(&principal, &write, now)).await?;
    Ok(Json(item))
}

/// GET /api/library: the caller's items, most recently touched first.
pub async fn list_library(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<LibraryQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let filter = MediaItemFilter {
        status: query.status,
        liked: query.liked,
        watchlisted: query.watchlisted,
    };

    let items = run_blocking(&state, move |db| db.list_media_items(&principal, &filter)).await?;
    Ok(Json(items))
}

/// Check required fields and normalise the request into a storage write.
/// Omitted optional fields become their defaults: a write replaces every
/// mutable field rather than merging.
pub fn validate_upsert(req: UpsertMediaRequest) -> Result<MediaItemWrite, ApiError> {
    let media_id = req
        .media_id
        .as_ref()
        .and_then(|id| id.normalized())
        .ok_or_else(|| ApiError::validation("mediaId is required"))?;
    let media_type = req
        .media_type
        .ok_or_else(|| ApiError::validation("mediaType is required"))?;
    let title = req
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("title is required"))?;

    if let Some(rating) = req.rating {
        if !RATING_RANGE.contains(&rating) {
            return Err(ApiError::validation("rating must be between 0 and 10"));
        }
    }

    Ok(MediaItemWrite {
        media_id,
        media_type,
        title,
        poster_url: req.poster_url.filter(|p| !p.trim().is_empty()),
        status: req.status,
        is_liked: req.is_liked.unwrap_or(false),
        is_watchlisted: req.is_watchlisted.unwrap_or(false),
        rating: req.rating,
    })
}
