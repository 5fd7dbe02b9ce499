use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::service::{SubscriptionService, SweepReport, DEFAULT_EXPIRY_WINDOW_DAYS};
use crate::api::{blocking, created, ok, ApiPath, ApiQuery, ApiResponse, ApiResult, Created};
use crate::domain::{PlanType, Subscription, UserId};

pub fn subscription_router(service: Arc<SubscriptionService>) -> Router {
    Router::new()
        .route("/api/subscriptions", post(create_handler))
        .route("/api/subscriptions/active", get(active_handler))
        .route("/api/subscriptions/expiring", get(expiring_handler))
        .route("/api/subscriptions/process-expired", post(sweep_handler))
        .route("/api/subscriptions/user/:id", get(get_handler))
        .route("/api/subscriptions/user/:id/active", get(is_active_handler))
        .route("/api/subscriptions/user/:id/upgrade", patch(upgrade_handler))
        .route("/api/subscriptions/user/:id/cancel", patch(cancel_handler))
        .route("/api/subscriptions/user/:id/renew", patch(renew_handler))
        .route(
            "/api/subscriptions/user/:id/auto-renew",
            patch(auto_renew_handler),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateQuery {
    user_id: UserId,
    plan_type: PlanType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpgradeQuery {
    new_plan_type: PlanType,
}

#[derive(Debug, Deserialize)]
struct ExpiringQuery {
    days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActiveFlag {
    is_active: bool,
}

async fn create_handler(
    State(service): State<Arc<SubscriptionService>>,
    ApiQuery(query): ApiQuery<CreateQuery>,
) -> Created<Subscription> {
    let subscription = blocking(move || service.create(query.user_id, query.plan_type)).await?;
    created(subscription, "Subscription created successfully")
}

async fn get_handler(
    State(service): State<Arc<SubscriptionService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Subscription> {
    ok(blocking(move || service.get(id)).await?)
}

async fn upgrade_handler(
    State(service): State<Arc<SubscriptionService>>,
    ApiPath(id): ApiPath<UserId>,
    ApiQuery(query): ApiQuery<UpgradeQuery>,
) -> ApiResult<Subscription> {
    let subscription = blocking(move || service.upgrade(id, query.new_plan_type)).await?;
    Ok(Json(ApiResponse::with_message(
        subscription,
        "Subscription upgraded successfully",
    )))
}

async fn cancel_handler(
    State(service): State<Arc<SubscriptionService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Subscription> {
    Ok(Json(ApiResponse::with_message(
        blocking(move || service.cancel(id)).await?,
        "Subscription cancelled successfully",
    )))
}

async fn renew_handler(
    State(service): State<Arc<SubscriptionService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Subscription> {
    Ok(Json(ApiResponse::with_message(
        blocking(move || service.renew(id)).await?,
        "Subscription renewed successfully",
    )))
}

async fn auto_renew_handler(
    State(service): State<Arc<SubscriptionService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Subscription> {
    let subscription = blocking(move || service.toggle_auto_renew(id)).await?;
    let message = if subscription.auto_renew {
        "Auto-renew enabled"
    } else {
        "Auto-renew disabled"
    };
    Ok(Json(ApiResponse::with_message(subscription, message)))
}

async fn is_active_handler(
    State(service): State<Arc<SubscriptionService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<ActiveFlag> {
    ok(ActiveFlag {
        is_active: blocking(move || service.is_active(id)).await?,
    })
}

async fn active_handler(
    State(service): State<Arc<SubscriptionService>>,
) -> ApiResult<Vec<Subscription>> {
    ok(blocking(move || service.active()).await?)
}

async fn expiring_handler(
    State(service): State<Arc<SubscriptionService>>,
    ApiQuery(query): ApiQuery<ExpiringQuery>,
) -> ApiResult<Vec<Subscription>> {
    let days = query.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    ok(blocking(move || service.expiring_within(days)).await?)
}

async fn sweep_handler(State(service): State<Arc<SubscriptionService>>) -> ApiResult<SweepReport> {
    Ok(Json(ApiResponse::with_message(
        blocking(move || service.process_expired()).await?,
        "Expired subscriptions processed",
    )))
}
