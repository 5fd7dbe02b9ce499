#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use estate_hub::api::{self, AppServices};
use estate_hub::clock::FixedClock;
use estate_hub::domain::Property;
use estate_hub::listings::RecommendationClient;
use estate_hub::repository::Repositories;
use estate_hub::store::Database;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

/// Ranks nothing; keeps candidates in the requested city under budget.
pub struct CityRecommender;

#[async_trait]
impl RecommendationClient for CityRecommender {
    async fn recommend(&self, candidates: &[Property], location: &str, budget: f64) -> Vec<Property> {
        candidates
            .iter()
            .filter(|property| property.city.eq_ignore_ascii_case(location))
            .filter(|property| {
                property
                    .price
                    .to_string()
                    .parse::<f64>()
                    .map(|price| price <= budget)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

pub fn services(db: Database) -> AppServices {
    let repositories = Repositories::sqlite(Arc::new(db));
    AppServices::new(
        &repositories,
        Arc::new(FixedClock::on(today())),
        Arc::new(CityRecommender),
    )
}

pub fn app() -> Router {
    api::router(services(
        Database::open_in_memory().expect("in-memory database"),
    ))
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");

    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn register(app: &Router, email: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users",
        Some(json!({
            "firstName": "Casey",
            "lastName": "Buyer",
            "email": email,
            "password": "secret",
            "userType": "BUYER",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_i64().expect("user id")
}

pub fn listing(title: &str, city: &str, price: u32) -> Value {
    json!({
        "title": title,
        "description": format!("{title} with a garden"),
        "price": price.to_string(),
        "address": format!("{price} Main St"),
        "city": city,
        "state": "TX",
        "propertyType": "HOUSE",
        "listingType": "FOR_SALE",
        "bedrooms": 3,
        "bathrooms": 2,
        "squareFeet": "1500",
    })
}

pub async fn create_listing(app: &Router, listing: Value) -> i64 {
    let (status, body) = send(app, Method::POST, "/api/properties", Some(listing)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_i64().expect("property id")
}
