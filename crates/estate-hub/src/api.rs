//! Response envelope and error translation shared by every router.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::contacts::{contact_router, ContactService};
use crate::directory::{directory_router, DirectoryService};
use crate::domain::UserId;
use crate::error::{ServiceError, ServiceResult};
use crate::favorites::{favorite_router, FavoriteService};
use crate::history::{history_router, SearchHistoryService};
use crate::listings::{listing_router, ListingService, RecommendationClient};
use crate::page::PageRequest;
use crate::repository::Repositories;
use crate::subscriptions::{subscription_router, SubscriptionService};
use crate::viewings::{viewing_router, ViewingService};

/// `{ success, message, data, timestamp }` wrapper used for every body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            timestamp: Utc::now(),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// 201 with the enveloped entity that was just stored.
pub type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub fn created<T>(data: T, message: &str) -> Created<T> {
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(data, message)),
    ))
}

/// Runs a synchronous service call on the blocking pool so the connection
/// lock never parks an async worker.
pub async fn blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.map_err(ApiError),
        Err(err) => Err(ApiError(ServiceError::Unexpected(format!(
            "service task aborted: {err}"
        )))),
    }
}

/// JSON body whose rejections use the envelope.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections use the envelope.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

/// Path segments whose rejections use the envelope.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// `?page=&size=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    pub fn request(&self) -> Result<PageRequest, ServiceError> {
        Ok(PageRequest::from_parts(self.page, self.size)?)
    }
}

/// Optional caller identity carried as `?userId=`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerQuery {
    pub user_id: Option<UserId>,
}

/// Boundary translation of [`ServiceError`] into an enveloped HTTP failure.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        Self(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self(ServiceError::InvalidArgument(value.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self(ServiceError::InvalidArgument(value.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        Self(ServiceError::InvalidArgument(value.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::InvalidState(_) | ServiceError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self.0 {
            ServiceError::Unexpected(detail) => {
                tracing::error!(error = %detail, "request failed unexpectedly");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

/// Every marketplace service, shared by the routers.
#[derive(Clone)]
pub struct AppServices {
    pub listings: Arc<ListingService>,
    pub viewings: Arc<ViewingService>,
    pub subscriptions: Arc<SubscriptionService>,
    pub favorites: Arc<FavoriteService>,
    pub contacts: Arc<ContactService>,
    pub history: Arc<SearchHistoryService>,
    pub directory: Arc<DirectoryService>,
}

impl AppServices {
    pub fn new(
        repositories: &Repositories,
        clock: Arc<dyn Clock>,
        recommender: Arc<dyn RecommendationClient>,
    ) -> Self {
        Self {
            listings: Arc::new(ListingService::new(repositories, recommender)),
            viewings: Arc::new(ViewingService::new(repositories, clock.clone())),
            subscriptions: Arc::new(SubscriptionService::new(repositories, clock.clone())),
            favorites: Arc::new(FavoriteService::new(repositories)),
            contacts: Arc::new(ContactService::new(repositories, clock)),
            history: Arc::new(SearchHistoryService::new(repositories)),
            directory: Arc::new(DirectoryService::new(repositories)),
        }
    }
}

/// The complete `/api` surface.
pub fn router(services: AppServices) -> Router {
    Router::new()
        .merge(listing_router(services.listings))
        .merge(viewing_router(services.viewings))
        .merge(subscription_router(services.subscriptions))
        .merge(favorite_router(services.favorites))
        .merge(contact_router(services.contacts))
        .merge(history_router(services.history))
        .merge(directory_router(services.directory))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_category() {
        let cases = [
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::InvalidState("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::Unexpected("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError(error).status(), status);
        }
    }

    #[tokio::test]
    async fn unexpected_failures_hide_their_detail() {
        let response =
            ApiError(ServiceError::Unexpected("disk I/O error at page 7".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "An unexpected error occurred");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn blocking_calls_surface_service_errors() {
        let value = blocking(|| Ok(7)).await.expect("value");
        assert_eq!(value, 7);
        let err = blocking::<(), _>(|| Err(ServiceError::not_found("property", 9)))
            .await
            .expect_err("missing");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn success_envelope_carries_data() {
        let json = serde_json::to_value(ApiResponse::with_message(3, "counted")).expect("json");
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 3);
        assert_eq!(json["message"], "counted");
        assert!(json["timestamp"].is_string());
    }
}
