use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::RecommendationConfig;
use crate::domain::Property;

/// Outbound ranking collaborator: filters candidates for a location and budget.
#[async_trait]
pub trait RecommendationClient: Send + Sync {
    /// Never fails; transport problems surface as an empty list.
    async fn recommend(&self, candidates: &[Property], location: &str, budget: f64)
        -> Vec<Property>;
}

#[derive(Debug, Serialize)]
struct RecommendationRequest<'a> {
    properties: &'a [Property],
    location: &'a str,
    budget: f64,
}

pub struct HttpRecommendationClient {
    http: reqwest::Client,
    url: String,
}

impl HttpRecommendationClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn from_config(config: &RecommendationConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.url.clone(), config.timeout)
    }

    async fn call(
        &self,
        candidates: &[Property],
        location: &str,
        budget: f64,
    ) -> Result<Vec<Property>, reqwest::Error> {
        let body = RecommendationRequest {
            properties: candidates,
            location,
            budget,
        };
        self.http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Property>>()
            .await
    }
}

#[async_trait]
impl RecommendationClient for HttpRecommendationClient {
    async fn recommend(
        &self,
        candidates: &[Property],
        location: &str,
        budget: f64,
    ) -> Vec<Property> {
        tracing::info!(location, budget, candidates = candidates.len(), "requesting recommendations");
        match self.call(candidates, location, budget).await {
            Ok(recommended) => {
                tracing::info!(count = recommended.len(), "received recommendations");
                recommended
            }
            Err(err) => {
                tracing::warn!(url = %self.url, error = %err, "recommendation service failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_service_yields_empty_list() {
        // port 9 (discard) is closed on test hosts
        let client =
            HttpRecommendationClient::new("http://127.0.0.1:9/api/recommend", Duration::from_millis(200))
                .expect("client builds");
        let recommended = client.recommend(&[], "Austin", 250_000.0).await;
        assert!(recommended.is_empty());
    }

    #[test]
    fn request_body_uses_collaborator_field_names() {
        let body = RecommendationRequest {
            properties: &[],
            location: "Austin",
            budget: 1200.5,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["location"], "Austin");
        assert_eq!(json["budget"], 1200.5);
        assert!(json["properties"].as_array().expect("array").is_empty());
    }
}
