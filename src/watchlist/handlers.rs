use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
    watchlist::{
        dto::{CreateEntryRequest, ListParams, UpdateEntryRequest},
        repo::WatchlistEntry,
    },
};

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/watchlist", post(create_entry))
        .route("/watchlist", get(list_entries))
        .route("/watchlist/:id", put(update_entry))
        .route("/watchlist/:id", delete(delete_entry))
}

#[instrument(skip(state, payload))]
pub async fn create_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateEntryRequest>,
) -> ApiResult<(StatusCode, Json<WatchlistEntry>)> {
    let new_entry = payload.validate()?;

    // Friendly pre-check; the (user_id, tmdb_id) unique constraint is the
    // authoritative guard, so a losing racer still gets Duplicate from the
    // insert below.
    if WatchlistEntry::exists_for_owner(&state.db, user_id, new_entry.tmdb_id)
        .await
        .map_err(ApiError::from)?
    {
        return Err(ApiError::Duplicate("Item already in watchlist".into()));
    }

    let entry = WatchlistEntry::insert(&state.db, user_id, &new_entry)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Duplicate(_) => ApiError::Duplicate("Item already in watchlist".into()),
            other => other,
        })?;

    info!(user_id = %user_id, entry_id = %entry.id, tmdb_id = entry.tmdb_id, "watchlist entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<WatchlistEntry>>> {
    let entries =
        WatchlistEntry::list_by_owner(&state.db, user_id, params.watched, params.media_kind)
            .await
            .map_err(ApiError::from)?;
    Ok(Json(entries))
}

/// Existence is checked before ownership, so a non-owner holding a valid id
/// gets 403, while a stale id gets 404.
fn authorize(entry: Option<WatchlistEntry>, caller: Uuid) -> ApiResult<WatchlistEntry> {
    let entry = entry.ok_or_else(|| ApiError::NotFound("Item not found".into()))?;
    if entry.user_id != caller {
        return Err(ApiError::Forbidden(
            "Not authorized to modify this item".into(),
        ));
    }
    Ok(entry)
}

async fn load_owned(db: &sqlx::PgPool, user_id: Uuid, id: Uuid) -> ApiResult<WatchlistEntry> {
    let entry = WatchlistEntry::find_by_id(db, id)
        .await
        .map_err(ApiError::from)?;
    authorize(entry, user_id)
}

#[instrument(skip(state, payload))]
pub async fn update_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEntryRequest>,
) -> ApiResult<Json<WatchlistEntry>> {
    payload.validate()?;

    let mut entry = load_owned(&state.db, user_id, id).await?;
    entry.apply(&payload, OffsetDateTime::now_utc());

    let saved = entry.save(&state.db).await.map_err(ApiError::from)?;
    info!(user_id = %user_id, entry_id = %saved.id, "watchlist entry updated");
    Ok(Json(saved))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let entry = load_owned(&state.db, user_id, id).await?;

    WatchlistEntry::delete(&state.db, entry.id)
        .await
        .map_err(ApiError::from)?;
    info!(user_id = %user_id, entry_id = %entry.id, "watchlist entry deleted");
    Ok(Json(json!({ "message": "Item deleted successfully" })))
}
