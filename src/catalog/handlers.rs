use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    catalog::dto::{CatalogDetail, MediaKind, SearchResponse},
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/search", get(search))
        .route("/catalog/:kind/:id", get(details))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let query = params.query.trim();
    // Rejected before any upstream call
    if query.is_empty() {
        return Err(ApiError::Validation("Please provide a search query".into()));
    }

    let results = state.catalog.search(query).await?;
    Ok(Json(SearchResponse {
        count: results.len(),
        results,
    }))
}

#[instrument(skip(state))]
pub async fn details(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> ApiResult<Json<CatalogDetail>> {
    // Parsed by hand so an unknown kind gets the structured validation body
    // instead of axum's plain-text path rejection.
    let kind: MediaKind = kind
        .parse()
        .map_err(|_| ApiError::Validation("Media kind must be movie or series".into()))?;

    let detail = state.catalog.details(kind, id).await?;
    Ok(Json(detail))
}
