use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    response::IntoResponse,
};

use flick_types::api::{DetailsQuery, SearchQuery};
use flick_types::models::MediaType;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/search?query=
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let query = query
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::validation("query is required"))?;

    let results = state.catalog.search(query.trim()).await?;
    Ok(Json(results))
}

/// GET /api/catalog/popular
pub async fn popular(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.catalog.popular_movies().await?))
}

/// GET /api/catalog/{media_type}/{id}?credits=true
pub async fn details(
    State(state): State<AppState>,
    path: Result<Path<(MediaType, u64)>, PathRejection>,
    query: Result<Query<DetailsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((media_type, id)) = path.map_err(|e| ApiError::validation(e.body_text()))?;
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let details = state.catalog.details(media_type, id, query.credits).await?;
    Ok(Json(details))
}
