use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use super::service::ContactService;
use crate::api::{
    blocking, created, ok, ApiJson, ApiPath, ApiResponse, ApiResult, Created,
};
use crate::domain::{ContactAgent, ContactId, NewContactAgent, PropertyId, UserId};

pub fn contact_router(service: Arc<ContactService>) -> Router {
    Router::new()
        .route("/api/contact-agents", post(create_handler))
        .route("/api/contact-agents/unread", get(unread_handler))
        .route(
            "/api/contact-agents/property/:id",
            get(property_handler),
        )
        .route("/api/contact-agents/user/:id", get(user_handler))
        .route("/api/contact-agents/owner/:id", get(owner_handler))
        .route(
            "/api/contact-agents/owner/:id/unread",
            get(owner_unread_handler),
        )
        .route(
            "/api/contact-agents/owner/:id/unread-count",
            get(owner_unread_count_handler),
        )
        .route(
            "/api/contact-agents/:id",
            get(get_handler).delete(delete_handler),
        )
        .route("/api/contact-agents/:id/read", patch(read_handler))
        .with_state(service)
}

async fn create_handler(
    State(service): State<Arc<ContactService>>,
    ApiJson(inquiry): ApiJson<NewContactAgent>,
) -> Created<ContactAgent> {
    let contact = blocking(move || service.create(inquiry)).await?;
    created(contact, "Message sent to agent")
}

async fn get_handler(
    State(service): State<Arc<ContactService>>,
    ApiPath(id): ApiPath<ContactId>,
) -> ApiResult<ContactAgent> {
    ok(blocking(move || service.get(id)).await?)
}

async fn delete_handler(
    State(service): State<Arc<ContactService>>,
    ApiPath(id): ApiPath<ContactId>,
) -> ApiResult<()> {
    blocking(move || service.delete(id)).await?;
    Ok(Json(ApiResponse::done("Contact deleted successfully")))
}

async fn read_handler(
    State(service): State<Arc<ContactService>>,
    ApiPath(id): ApiPath<ContactId>,
) -> ApiResult<ContactAgent> {
    ok(blocking(move || service.mark_read(id)).await?)
}

async fn unread_handler(
    State(service): State<Arc<ContactService>>,
) -> ApiResult<Vec<ContactAgent>> {
    ok(blocking(move || service.unread()).await?)
}

async fn property_handler(
    State(service): State<Arc<ContactService>>,
    ApiPath(id): ApiPath<PropertyId>,
) -> ApiResult<Vec<ContactAgent>> {
    ok(blocking(move || service.for_property(id)).await?)
}

async fn user_handler(
    State(service): State<Arc<ContactService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Vec<ContactAgent>> {
    ok(blocking(move || service.for_user(id)).await?)
}

async fn owner_handler(
    State(service): State<Arc<ContactService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Vec<ContactAgent>> {
    ok(blocking(move || service.for_owner(id)).await?)
}

async fn owner_unread_handler(
    State(service): State<Arc<ContactService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Vec<ContactAgent>> {
    ok(blocking(move || service.unread_for_owner(id)).await?)
}

async fn owner_unread_count_handler(
    State(service): State<Arc<ContactService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<u64> {
    ok(blocking(move || service.unread_count_for_owner(id)).await?)
}
