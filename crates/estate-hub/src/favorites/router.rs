use std::sync::Arc;

use axum::extract::State;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::service::{favorite_order, FavoriteService, ToggleOutcome};
use crate::api::{blocking, created, ok, ApiPath, ApiQuery, ApiResponse, ApiResult, Created};
use crate::domain::{FavoriteId, PropertyId, UserId};
use crate::error::ServiceError;
use crate::listings::FavoriteResponse;
use crate::page::{Page, PageRequest};

pub fn favorite_router(service: Arc<FavoriteService>) -> Router {
    Router::new()
        .route(
            "/api/favorites",
            post(add_handler).delete(remove_pair_handler),
        )
        .route("/api/favorites/toggle", post(toggle_handler))
        .route("/api/favorites/check", get(check_handler))
        .route("/api/favorites/count/:property_id", get(count_handler))
        .route("/api/favorites/user/:user_id/paged", get(paged_handler))
        .route("/api/favorites/:id", delete(remove_handler))
        .route("/api/favorites/:id/notes", patch(notes_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairQuery {
    user_id: UserId,
    property_id: PropertyId,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PagedQuery {
    page: Option<u32>,
    size: Option<u32>,
    sort_by: Option<String>,
    sort_direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotesQuery {
    notes: Option<String>,
}

async fn add_handler(
    State(service): State<Arc<FavoriteService>>,
    ApiQuery(query): ApiQuery<PairQuery>,
) -> Created<FavoriteResponse> {
    let favorite =
        blocking(move || service.add(query.user_id, query.property_id, query.notes)).await?;
    created(favorite, "Property added to favorites")
}

async fn remove_pair_handler(
    State(service): State<Arc<FavoriteService>>,
    ApiQuery(query): ApiQuery<PairQuery>,
) -> ApiResult<()> {
    blocking(move || service.remove(query.user_id, query.property_id)).await?;
    Ok(Json(ApiResponse::done("Property removed from favorites")))
}

async fn remove_handler(
    State(service): State<Arc<FavoriteService>>,
    ApiPath(id): ApiPath<FavoriteId>,
) -> ApiResult<()> {
    blocking(move || service.remove_by_id(id)).await?;
    Ok(Json(ApiResponse::done("Favorite removed")))
}

async fn toggle_handler(
    State(service): State<Arc<FavoriteService>>,
    ApiQuery(query): ApiQuery<PairQuery>,
) -> ApiResult<ToggleOutcome> {
    let outcome = blocking(move || service.toggle(query.user_id, query.property_id)).await?;
    let message = if outcome.favorited {
        "Property added to favorites"
    } else {
        "Property removed from favorites"
    };
    Ok(Json(ApiResponse::with_message(outcome, message)))
}

async fn check_handler(
    State(service): State<Arc<FavoriteService>>,
    ApiQuery(query): ApiQuery<PairQuery>,
) -> ApiResult<bool> {
    ok(blocking(move || service.is_favorited(query.user_id, query.property_id)).await?)
}

async fn count_handler(
    State(service): State<Arc<FavoriteService>>,
    ApiPath(property_id): ApiPath<PropertyId>,
) -> ApiResult<u64> {
    ok(blocking(move || service.count(property_id)).await?)
}

async fn paged_handler(
    State(service): State<Arc<FavoriteService>>,
    ApiPath(user_id): ApiPath<UserId>,
    ApiQuery(query): ApiQuery<PagedQuery>,
) -> ApiResult<Page<FavoriteResponse>> {
    let page = PageRequest::from_parts(query.page, query.size).map_err(ServiceError::from)?;
    let order = favorite_order(query.sort_by.as_deref(), query.sort_direction.as_deref())
        .map_err(ServiceError::from)?;
    ok(blocking(move || service.for_user(user_id, page, order)).await?)
}

async fn notes_handler(
    State(service): State<Arc<FavoriteService>>,
    ApiPath(id): ApiPath<FavoriteId>,
    ApiQuery(query): ApiQuery<NotesQuery>,
) -> ApiResult<FavoriteResponse> {
    ok(blocking(move || service.update_notes(id, query.notes)).await?)
}
