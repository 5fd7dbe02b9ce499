use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use super::service::{ViewingRequest, ViewingService};
use crate::api::{
    blocking, created, ok, ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, Created,
};
use crate::domain::{PropertyId, ScheduleViewing, UserId, ViewingId, ViewingStatus};

pub fn viewing_router(service: Arc<ViewingService>) -> Router {
    Router::new()
        .route("/api/schedule-viewings", post(schedule_handler))
        .route(
            "/api/schedule-viewings/:id",
            get(get_handler).delete(delete_handler),
        )
        .route("/api/schedule-viewings/:id/confirm", put(confirm_handler))
        .route("/api/schedule-viewings/:id/reject", put(reject_handler))
        .route("/api/schedule-viewings/:id/complete", put(complete_handler))
        .route("/api/schedule-viewings/:id/cancel", put(cancel_handler))
        .route("/api/schedule-viewings/user/:id", get(user_handler))
        .route(
            "/api/schedule-viewings/user/:id/status/:status",
            get(user_status_handler),
        )
        .route("/api/schedule-viewings/property/:id", get(property_handler))
        .route(
            "/api/schedule-viewings/property/:id/status/:status",
            get(property_status_handler),
        )
        .route(
            "/api/schedule-viewings/property/:id/confirmed-count",
            get(confirmed_count_handler),
        )
        .route("/api/schedule-viewings/owner/:id", get(owner_handler))
        .route(
            "/api/schedule-viewings/owner/:id/status/:status",
            get(owner_status_handler),
        )
        .route("/api/schedule-viewings/status/:status", get(status_handler))
        .route("/api/schedule-viewings/date-range", get(date_range_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RejectQuery {
    rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateRangeQuery {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

async fn schedule_handler(
    State(service): State<Arc<ViewingService>>,
    ApiJson(request): ApiJson<ViewingRequest>,
) -> Created<ScheduleViewing> {
    let viewing = blocking(move || service.schedule(request)).await?;
    created(viewing, "Viewing scheduled successfully")
}

async fn get_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(id): ApiPath<ViewingId>,
) -> ApiResult<ScheduleViewing> {
    ok(blocking(move || service.get(id)).await?)
}

async fn delete_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(id): ApiPath<ViewingId>,
) -> ApiResult<()> {
    blocking(move || service.delete(id)).await?;
    Ok(Json(ApiResponse::done("Viewing deleted successfully")))
}

async fn confirm_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(id): ApiPath<ViewingId>,
) -> ApiResult<ScheduleViewing> {
    ok(blocking(move || service.confirm(id)).await?)
}

async fn reject_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(id): ApiPath<ViewingId>,
    ApiQuery(query): ApiQuery<RejectQuery>,
) -> ApiResult<ScheduleViewing> {
    ok(blocking(move || service.reject(id, query.rejection_reason)).await?)
}

async fn complete_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(id): ApiPath<ViewingId>,
) -> ApiResult<ScheduleViewing> {
    ok(blocking(move || service.complete(id)).await?)
}

async fn cancel_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(id): ApiPath<ViewingId>,
) -> ApiResult<ScheduleViewing> {
    ok(blocking(move || service.cancel(id)).await?)
}

async fn user_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Vec<ScheduleViewing>> {
    ok(blocking(move || service.for_user(id, None)).await?)
}

async fn user_status_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath((id, status)): ApiPath<(UserId, ViewingStatus)>,
) -> ApiResult<Vec<ScheduleViewing>> {
    ok(blocking(move || service.for_user(id, Some(status))).await?)
}

async fn property_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(id): ApiPath<PropertyId>,
) -> ApiResult<Vec<ScheduleViewing>> {
    ok(blocking(move || service.for_property(id, None)).await?)
}

async fn property_status_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath((id, status)): ApiPath<(PropertyId, ViewingStatus)>,
) -> ApiResult<Vec<ScheduleViewing>> {
    ok(blocking(move || service.for_property(id, Some(status))).await?)
}

async fn confirmed_count_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(id): ApiPath<PropertyId>,
) -> ApiResult<u64> {
    ok(blocking(move || service.confirmed_count(id)).await?)
}

async fn owner_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Vec<ScheduleViewing>> {
    ok(blocking(move || service.for_owner(id, None)).await?)
}

async fn owner_status_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath((id, status)): ApiPath<(UserId, ViewingStatus)>,
) -> ApiResult<Vec<ScheduleViewing>> {
    ok(blocking(move || service.for_owner(id, Some(status))).await?)
}

async fn status_handler(
    State(service): State<Arc<ViewingService>>,
    ApiPath(status): ApiPath<ViewingStatus>,
) -> ApiResult<Vec<ScheduleViewing>> {
    ok(blocking(move || service.with_status(status)).await?)
}

async fn date_range_handler(
    State(service): State<Arc<ViewingService>>,
    ApiQuery(range): ApiQuery<DateRangeQuery>,
) -> ApiResult<Vec<ScheduleViewing>> {
    ok(blocking(move || service.between(range.start_date, range.end_date)).await?)
}
