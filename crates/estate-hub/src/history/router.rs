use std::sync::Arc;

use axum::extract::State;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::service::{SearchHistoryService, SearchTally, DEFAULT_RECENT_LIMIT, DEFAULT_TOP_LIMIT};
use crate::api::{blocking, ok, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::domain::{SearchHistory, SearchHistoryId, UserId};

pub fn history_router(service: Arc<SearchHistoryService>) -> Router {
    Router::new()
        .route("/api/search-history/user/:id", get(user_handler))
        .route("/api/search-history/user/:id/recent", get(recent_handler))
        .route("/api/search-history/user/:id/count", get(count_handler))
        .route("/api/search-history/user/:id/clear", delete(clear_handler))
        .route("/api/search-history/analytics/cities", get(cities_handler))
        .route(
            "/api/search-history/analytics/property-types",
            get(property_types_handler),
        )
        .route("/api/search-history/:id", delete(delete_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchCount {
    search_count: u64,
}

async fn user_handler(
    State(service): State<Arc<SearchHistoryService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Vec<SearchHistory>> {
    ok(blocking(move || service.for_user(id)).await?)
}

async fn recent_handler(
    State(service): State<Arc<SearchHistoryService>>,
    ApiPath(id): ApiPath<UserId>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<Vec<SearchHistory>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    ok(blocking(move || service.recent(id, limit)).await?)
}

async fn count_handler(
    State(service): State<Arc<SearchHistoryService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<SearchCount> {
    ok(SearchCount {
        search_count: blocking(move || service.count(id)).await?,
    })
}

async fn clear_handler(
    State(service): State<Arc<SearchHistoryService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<()> {
    blocking(move || service.clear(id)).await?;
    Ok(Json(ApiResponse::done("Search history cleared")))
}

async fn delete_handler(
    State(service): State<Arc<SearchHistoryService>>,
    ApiPath(id): ApiPath<SearchHistoryId>,
) -> ApiResult<()> {
    blocking(move || service.delete(id)).await?;
    Ok(Json(ApiResponse::done("Search history deleted")))
}

async fn cities_handler(
    State(service): State<Arc<SearchHistoryService>>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> ApiResult<Vec<SearchTally>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    ok(blocking(move || service.top_cities(limit)).await?)
}

async fn property_types_handler(
    State(service): State<Arc<SearchHistoryService>>,
) -> ApiResult<Vec<SearchTally>> {
    ok(blocking(move || service.top_property_types()).await?)
}
