use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::domain::{
    ImageId, ImageUpdate, NewProperty, NewPropertyImage, Property, PropertyId, PropertyImage,
    PropertyUpdate, UserId,
};
use crate::error::{ServiceError, ServiceResult};
use crate::page::{Page, PageRequest};
use crate::repository::{
    ImageRepository, PropertyRepository, Repositories, RepositoryError, SearchHistoryRepository,
};

use super::assembler::{PropertyResponse, ResponseAssembler};
use super::recommendations::RecommendationClient;
use super::search::SearchRequest;

/// Search, detail and catalogue operations over listings.
pub struct ListingService {
    properties: Arc<dyn PropertyRepository>,
    images: Arc<dyn ImageRepository>,
    history: Arc<dyn SearchHistoryRepository>,
    assembler: ResponseAssembler,
    recommender: Arc<dyn RecommendationClient>,
}

impl ListingService {
    pub fn new(repositories: &Repositories, recommender: Arc<dyn RecommendationClient>) -> Self {
        Self {
            properties: repositories.properties.clone(),
            images: repositories.images.clone(),
            history: repositories.search_history.clone(),
            assembler: ResponseAssembler::new(repositories),
            recommender,
        }
    }

    pub fn search(
        &self,
        request: &SearchRequest,
        viewer: Option<UserId>,
    ) -> ServiceResult<Page<PropertyResponse>> {
        let plan = request.plan()?;
        let (rows, total) = self.properties.search(&plan)?;
        tracing::debug!(
            total,
            keyword = request.keyword().is_some(),
            page = plan.page.page(),
            "property search executed"
        );
        self.assembler.page(Page::new(rows, plan.page, total), viewer)
    }

    /// Appends a search-history row; failures are logged and swallowed.
    pub fn record_search(&self, user_id: UserId, request: &SearchRequest, results_count: u64) {
        let entry = request.history_entry(user_id, results_count);
        if let Err(err) = self.history.insert(entry) {
            tracing::warn!(user_id, error = %err, "failed to record search history");
        }
    }

    pub fn details(&self, id: PropertyId, viewer: Option<UserId>) -> ServiceResult<PropertyResponse> {
        let property = self.require_property(id)?;
        self.assembler.property(property, viewer)
    }

    pub fn by_owner(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> ServiceResult<Page<PropertyResponse>> {
        let (rows, total) = self.properties.by_owner(owner_id, page)?;
        self.assembler.page(Page::new(rows, page, total), None)
    }

    pub fn cities(&self) -> ServiceResult<Vec<String>> {
        Ok(self.properties.available_cities()?)
    }

    pub fn states(&self) -> ServiceResult<Vec<String>> {
        Ok(self.properties.available_states()?)
    }

    pub fn create(&self, property: NewProperty) -> ServiceResult<PropertyResponse> {
        let created = self.properties.insert(property).map_err(|err| match err {
            RepositoryError::NotFound => ServiceError::InvalidArgument(
                "owner or builder group does not exist".to_string(),
            ),
            other => other.into(),
        })?;
        tracing::info!(property_id = created.id, "property created");
        self.assembler.property(created, None)
    }

    pub fn update(&self, id: PropertyId, update: PropertyUpdate) -> ServiceResult<PropertyResponse> {
        let updated = self
            .properties
            .update(id, update)?
            .ok_or_else(|| ServiceError::not_found("property", id))?;
        tracing::info!(property_id = id, available = updated.available, "property updated");
        self.assembler.property(updated, None)
    }

    pub fn available_count(&self) -> ServiceResult<u64> {
        Ok(self.properties.count_available()?)
    }

    /// Zero when the city has no available listings.
    pub fn average_price(&self, city: &str) -> ServiceResult<BigDecimal> {
        Ok(self
            .properties
            .average_price_in(city.trim())?
            .unwrap_or_else(|| BigDecimal::from(0)))
    }

    pub fn delete(&self, id: PropertyId) -> ServiceResult<()> {
        if !self.properties.delete(id)? {
            return Err(ServiceError::not_found("property", id));
        }
        tracing::info!(property_id = id, "property deleted");
        Ok(())
    }

    pub fn add_image(&self, image: NewPropertyImage) -> ServiceResult<PropertyImage> {
        let property_id = image.property_id;
        self.images.insert(image).map_err(|err| match err {
            RepositoryError::NotFound => {
                ServiceError::not_found("property", property_id)
            }
            other => other.into(),
        })
    }

    pub fn images(&self, property_id: PropertyId) -> ServiceResult<Vec<PropertyImage>> {
        self.require_property(property_id)?;
        Ok(self.images.for_property(property_id)?)
    }

    pub fn set_primary_image(&self, property_id: PropertyId, image_id: ImageId) -> ServiceResult<()> {
        self.images
            .set_primary(property_id, image_id)
            .map_err(|err| foreign_image(err, property_id, image_id))
    }

    pub fn update_image(
        &self,
        property_id: PropertyId,
        image_id: ImageId,
        update: ImageUpdate,
    ) -> ServiceResult<PropertyImage> {
        self.images
            .update(property_id, image_id, update)
            .map_err(|err| foreign_image(err, property_id, image_id))
    }

    pub fn delete_image(&self, property_id: PropertyId, image_id: ImageId) -> ServiceResult<()> {
        if !self.images.delete(property_id, image_id)? {
            return Err(ServiceError::NotFound(format!(
                "image {image_id} does not belong to property {property_id}"
            )));
        }
        tracing::info!(property_id, image_id, "property image deleted");
        Ok(())
    }

    pub fn reorder_images(&self, property_id: PropertyId, order: &[ImageId]) -> ServiceResult<()> {
        self.require_property(property_id)?;
        self.images
            .reorder(property_id, order)
            .map_err(|err| match err {
                RepositoryError::NotFound => ServiceError::InvalidArgument(format!(
                    "image order must list every image of property {property_id} exactly once"
                )),
                other => other.into(),
            })
    }

    fn require_property(&self, id: PropertyId) -> ServiceResult<Property> {
        self.properties
            .find(id)?
            .ok_or_else(|| ServiceError::not_found("property", id))
    }

    /// Candidates are read before the outbound call so no store access spans the await.
    pub async fn recommendations(&self, location: &str, budget: f64) -> ServiceResult<Vec<Property>> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(ServiceError::InvalidArgument(
                "budget must be a non-negative number".to_string(),
            ));
        }
        let properties = self.properties.clone();
        let candidates = tokio::task::spawn_blocking(move || properties.available())
            .await
            .map_err(|err| ServiceError::Unexpected(format!("candidate load aborted: {err}")))??;
        Ok(self.recommender.recommend(&candidates, location, budget).await)
    }
}

fn foreign_image(err: RepositoryError, property_id: PropertyId, image_id: ImageId) -> ServiceError {
    match err {
        RepositoryError::NotFound => ServiceError::NotFound(format!(
            "image {image_id} does not belong to property {property_id}"
        )),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::listings::search::SearchRequest;
    use crate::testing::{new_property, Fixture};

    #[derive(Default)]
    struct EchoRecommender {
        seen: Mutex<Vec<(usize, String)>>,
    }

    #[async_trait]
    impl RecommendationClient for EchoRecommender {
        async fn recommend(
            &self,
            candidates: &[Property],
            location: &str,
            _budget: f64,
        ) -> Vec<Property> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((candidates.len(), location.to_string()));
            }
            candidates
                .iter()
                .filter(|property| property.city == location)
                .cloned()
                .collect()
        }
    }

    fn service(fixture: &Fixture, recommender: Arc<EchoRecommender>) -> ListingService {
        ListingService::new(&fixture.repositories, recommender)
    }

    #[test]
    fn search_pages_through_twenty_five_matches() {
        let fixture = Fixture::new();
        for index in 0..25 {
            fixture.property(&format!("Home {index}"), "Phoenix");
        }
        let listings = service(&fixture, Arc::default());

        let request = SearchRequest {
            city: Some("phoe".into()),
            page: Some(2),
            size: Some(10),
            ..SearchRequest::default()
        };
        let page = listings.search(&request, None).expect("search");
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.content.len(), 5);
        assert!(page.last);
        assert!(!page.has_next);
    }

    #[test]
    fn details_of_missing_property_is_not_found() {
        let fixture = Fixture::new();
        let listings = service(&fixture, Arc::default());
        assert!(matches!(
            listings.details(41, None),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn images_of_missing_property_is_not_found() {
        let fixture = Fixture::new();
        let listings = service(&fixture, Arc::default());
        assert!(matches!(listings.images(12), Err(ServiceError::NotFound(_))));

        let property = fixture.property("Bare", "Provo");
        assert!(listings.images(property.id).expect("images").is_empty());
    }

    #[test]
    fn reorder_with_partial_order_is_invalid_argument() {
        let fixture = Fixture::new();
        let listings = service(&fixture, Arc::default());
        let property = fixture.property("Duplex", "Ogden");
        let kept = fixture.image(property.id, "https://img/1.jpg", true);
        fixture.image(property.id, "https://img/2.jpg", false);

        assert!(matches!(
            listings.reorder_images(property.id, &[kept.id]),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            listings.reorder_images(property.id + 40, &[]),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            listings.delete_image(property.id, kept.id + 40),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn average_price_defaults_to_zero() {
        let fixture = Fixture::new();
        let listings = service(&fixture, Arc::default());
        assert_eq!(listings.average_price("Nowhere").expect("average"), BigDecimal::from(0));
    }

    #[test]
    fn record_search_appends_history() {
        let fixture = Fixture::new();
        let user = fixture.user("history@example.com");
        let listings = service(&fixture, Arc::default());
        let request = SearchRequest {
            city: Some("Boston".into()),
            ..SearchRequest::default()
        };
        listings.record_search(user.id, &request, 3);
        listings.record_search(user.id + 100, &request, 3);

        let entries = fixture
            .repositories
            .search_history
            .for_user(user.id, None)
            .expect("history");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].results_count, 3);
    }

    #[test]
    fn create_with_unknown_owner_is_invalid_argument() {
        let fixture = Fixture::new();
        let listings = service(&fixture, Arc::default());
        let mut property = new_property("Orphan", "Tacoma");
        property.owner_id = Some(77);
        assert!(matches!(
            listings.create(property),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn recommendations_receive_only_available_candidates() {
        let fixture = Fixture::new();
        fixture.property("Open", "Austin");
        fixture.property("Elsewhere", "Dallas");
        let mut hidden = new_property("Hidden", "Austin");
        hidden.available = false;
        fixture.repositories.properties.insert(hidden).expect("insert");

        let recommender = Arc::new(EchoRecommender::default());
        let listings = service(&fixture, recommender.clone());
        let recommended = listings
            .recommendations("Austin", 500_000.0)
            .await
            .expect("recommendations");
        assert_eq!(recommended.len(), 1);
        assert_eq!(recommended[0].title, "Open");
        let seen = recommender.seen.lock().expect("lock");
        assert_eq!(seen.as_slice(), &[(2, "Austin".to_string())]);
    }

    #[tokio::test]
    async fn negative_budget_is_rejected() {
        let fixture = Fixture::new();
        let listings = service(&fixture, Arc::default());
        assert!(matches!(
            listings.recommendations("Austin", -1.0).await,
            Err(ServiceError::InvalidArgument(_))
        ));
    }
}
