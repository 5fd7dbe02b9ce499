use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::assembler::PropertyResponse;
use super::search::SearchRequest;
use super::service::ListingService;
use crate::api::{
    blocking, created, ok, ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, Created,
    PageQuery, ViewerQuery,
};
use crate::domain::{
    ImageId, ImageUpdate, NewProperty, NewPropertyImage, Property, PropertyId, PropertyImage,
    PropertyUpdate, UserId,
};
use crate::page::Page;

/// Router exposing listing search, details and catalogue endpoints.
pub fn listing_router(service: Arc<ListingService>) -> Router {
    Router::new()
        .route(
            "/api/properties/search",
            get(search_query_handler).post(search_body_handler),
        )
        .route("/api/properties", post(create_handler))
        .route("/api/properties/cities", get(cities_handler))
        .route("/api/properties/states", get(states_handler))
        .route("/api/properties/recommendations", get(recommendations_handler))
        .route("/api/properties/stats/count", get(count_handler))
        .route(
            "/api/properties/stats/average-price/:city",
            get(average_price_handler),
        )
        .route(
            "/api/properties/owner/:owner_id/paged",
            get(owner_paged_handler),
        )
        .route(
            "/api/properties/:id",
            put(update_handler).delete(delete_handler),
        )
        .route("/api/properties/:id/details", get(details_handler))
        .route(
            "/api/properties/:id/images",
            get(images_handler).post(add_image_handler),
        )
        .route("/api/properties/:id/images/reorder", post(reorder_handler))
        .route(
            "/api/properties/:id/images/:image_id",
            put(update_image_handler).delete(delete_image_handler),
        )
        .route(
            "/api/properties/:id/images/:image_id/primary",
            put(primary_image_handler),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    location: String,
    budget: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageUpload {
    image_url: String,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    is_primary: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailableCount {
    available_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AveragePrice {
    average_price: BigDecimal,
}

async fn search_body_handler(
    State(service): State<Arc<ListingService>>,
    ApiQuery(viewer): ApiQuery<ViewerQuery>,
    ApiJson(request): ApiJson<SearchRequest>,
) -> ApiResult<Page<PropertyResponse>> {
    run_search(service, request, viewer.user_id).await
}

async fn search_query_handler(
    State(service): State<Arc<ListingService>>,
    ApiQuery(viewer): ApiQuery<ViewerQuery>,
    ApiQuery(request): ApiQuery<SearchRequest>,
) -> ApiResult<Page<PropertyResponse>> {
    run_search(service, request, viewer.user_id).await
}

async fn run_search(
    service: Arc<ListingService>,
    request: SearchRequest,
    viewer: Option<UserId>,
) -> ApiResult<Page<PropertyResponse>> {
    let searcher = service.clone();
    let (page, request) = blocking(move || {
        let page = searcher.search(&request, viewer)?;
        Ok((page, request))
    })
    .await?;
    if let Some(user_id) = viewer {
        let results = page.total_elements;
        // the response never waits on the history write
        tokio::task::spawn_blocking(move || service.record_search(user_id, &request, results));
    }
    ok(page)
}

async fn details_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath(id): ApiPath<PropertyId>,
    ApiQuery(viewer): ApiQuery<ViewerQuery>,
) -> ApiResult<PropertyResponse> {
    ok(blocking(move || service.details(id, viewer.user_id)).await?)
}

async fn cities_handler(State(service): State<Arc<ListingService>>) -> ApiResult<Vec<String>> {
    ok(blocking(move || service.cities()).await?)
}

async fn states_handler(State(service): State<Arc<ListingService>>) -> ApiResult<Vec<String>> {
    ok(blocking(move || service.states()).await?)
}

async fn count_handler(State(service): State<Arc<ListingService>>) -> ApiResult<AvailableCount> {
    let available_count = blocking(move || service.available_count()).await?;
    ok(AvailableCount { available_count })
}

async fn average_price_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath(city): ApiPath<String>,
) -> ApiResult<AveragePrice> {
    let average_price = blocking(move || service.average_price(&city)).await?;
    ok(AveragePrice { average_price })
}

async fn owner_paged_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath(owner_id): ApiPath<UserId>,
    ApiQuery(paging): ApiQuery<PageQuery>,
) -> ApiResult<Page<PropertyResponse>> {
    let page = paging.request()?;
    ok(blocking(move || service.by_owner(owner_id, page)).await?)
}

async fn recommendations_handler(
    State(service): State<Arc<ListingService>>,
    ApiQuery(query): ApiQuery<RecommendationQuery>,
) -> ApiResult<Vec<Property>> {
    ok(service
        .recommendations(&query.location, query.budget)
        .await?)
}

async fn create_handler(
    State(service): State<Arc<ListingService>>,
    ApiJson(property): ApiJson<NewProperty>,
) -> Created<PropertyResponse> {
    let stored = blocking(move || service.create(property)).await?;
    created(stored, "Property created successfully")
}

async fn update_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath(id): ApiPath<PropertyId>,
    ApiJson(update): ApiJson<PropertyUpdate>,
) -> ApiResult<PropertyResponse> {
    let updated = blocking(move || service.update(id, update)).await?;
    Ok(Json(ApiResponse::with_message(
        updated,
        "Property updated successfully",
    )))
}

async fn delete_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath(id): ApiPath<PropertyId>,
) -> ApiResult<()> {
    blocking(move || service.delete(id)).await?;
    Ok(Json(ApiResponse::done("Property deleted successfully")))
}

async fn images_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath(id): ApiPath<PropertyId>,
) -> ApiResult<Vec<PropertyImage>> {
    ok(blocking(move || service.images(id)).await?)
}

async fn add_image_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath(id): ApiPath<PropertyId>,
    ApiJson(upload): ApiJson<ImageUpload>,
) -> Created<PropertyImage> {
    let image = blocking(move || {
        service.add_image(NewPropertyImage {
            property_id: id,
            image_url: upload.image_url,
            caption: upload.caption,
            is_primary: upload.is_primary,
        })
    })
    .await?;
    created(image, "Image uploaded successfully")
}

async fn update_image_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath((id, image_id)): ApiPath<(PropertyId, ImageId)>,
    ApiJson(update): ApiJson<ImageUpdate>,
) -> ApiResult<PropertyImage> {
    let image = blocking(move || service.update_image(id, image_id, update)).await?;
    Ok(Json(ApiResponse::with_message(
        image,
        "Image updated successfully",
    )))
}

async fn delete_image_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath((id, image_id)): ApiPath<(PropertyId, ImageId)>,
) -> ApiResult<()> {
    blocking(move || service.delete_image(id, image_id)).await?;
    Ok(Json(ApiResponse::done("Image deleted successfully")))
}

async fn reorder_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath(id): ApiPath<PropertyId>,
    ApiJson(order): ApiJson<Vec<ImageId>>,
) -> ApiResult<()> {
    blocking(move || service.reorder_images(id, &order)).await?;
    Ok(Json(ApiResponse::done("Images reordered successfully")))
}

async fn primary_image_handler(
    State(service): State<Arc<ListingService>>,
    ApiPath((id, image_id)): ApiPath<(PropertyId, ImageId)>,
) -> ApiResult<()> {
    blocking(move || service.set_primary_image(id, image_id)).await?;
    Ok(Json(ApiResponse::done("Primary image updated")))
}
