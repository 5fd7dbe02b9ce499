//! Projects properties and favorites into response shapes.
//!
//! Every related aggregate (owner, builder group, images, favorite counts) is
//! fetched through an explicit repository call so the per-response query cost
//! stays visible.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    BuilderGroup, Favorite, FavoriteId, ListingType, Property, PropertyId, PropertyImage,
    PropertyType, User, UserId,
};
use crate::error::ServiceResult;
use crate::page::Page;
use crate::repository::{
    BuilderGroupRepository, FavoriteRepository, ImageRepository, PropertyRepository,
    Repositories, UserRepository,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub profile_image_url: Option<String>,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            company: user.company.clone(),
            profile_image_url: user.profile_image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderGroupSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<&BuilderGroup> for BuilderGroupSummary {
    fn from(group: &BuilderGroup) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            description: group.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    pub id: PropertyId,
    pub title: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: Option<String>,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub square_feet: Option<BigDecimal>,
    pub year_built: Option<i32>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Option<OwnerSummary>,
    pub builder_group: Option<BuilderGroupSummary>,
    pub image_urls: Vec<String>,
    pub favorite_count: u64,
    /// Only resolved when the caller identified itself.
    pub is_favorited: Option<bool>,
}

/// Condensed property used inside favorite listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: PropertyId,
    pub title: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub property: Option<PropertySummary>,
}

pub struct ResponseAssembler {
    users: Arc<dyn UserRepository>,
    builder_groups: Arc<dyn BuilderGroupRepository>,
    properties: Arc<dyn PropertyRepository>,
    images: Arc<dyn ImageRepository>,
    favorites: Arc<dyn FavoriteRepository>,
}

impl ResponseAssembler {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            users: repositories.users.clone(),
            builder_groups: repositories.builder_groups.clone(),
            properties: repositories.properties.clone(),
            images: repositories.images.clone(),
            favorites: repositories.favorites.clone(),
        }
    }

    pub fn property(
        &self,
        property: Property,
        viewer: Option<UserId>,
    ) -> ServiceResult<PropertyResponse> {
        let owner = match property.owner_id {
            Some(owner_id) => self.users.find(owner_id)?.as_ref().map(OwnerSummary::from),
            None => None,
        };
        let builder_group = match property.builder_group_id {
            Some(group_id) => self
                .builder_groups
                .find(group_id)?
                .as_ref()
                .map(BuilderGroupSummary::from),
            None => None,
        };
        let image_urls = self
            .ordered_images(property.id)
            .into_iter()
            .map(|image| image.image_url)
            .collect();
        let favorite_count = self.favorites.count_for_property(property.id)?;
        let is_favorited = match viewer {
            Some(user_id) => Some(self.favorites.find_pair(user_id, property.id)?.is_some()),
            None => None,
        };

        Ok(PropertyResponse {
            id: property.id,
            title: property.title,
            description: property.description,
            price: property.price,
            address: property.address,
            city: property.city,
            state: property.state,
            zip_code: property.zip_code,
            property_type: property.property_type,
            listing_type: property.listing_type,
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            square_feet: property.square_feet,
            year_built: property.year_built,
            available: property.available,
            created_at: property.created_at,
            updated_at: property.updated_at,
            owner,
            builder_group,
            image_urls,
            favorite_count,
            is_favorited,
        })
    }

    pub fn page(
        &self,
        page: Page<Property>,
        viewer: Option<UserId>,
    ) -> ServiceResult<Page<PropertyResponse>> {
        page.try_map(|property| self.property(property, viewer))
    }

    pub fn favorite(&self, favorite: Favorite) -> ServiceResult<FavoriteResponse> {
        let property = self
            .properties
            .find(favorite.property_id)?
            .map(|property| self.summary(property));

        Ok(FavoriteResponse {
            id: favorite.id,
            user_id: favorite.user_id,
            property_id: favorite.property_id,
            notes: favorite.notes,
            created_at: favorite.created_at,
            property,
        })
    }

    fn summary(&self, property: Property) -> PropertySummary {
        let images = self.ordered_images(property.id);
        let image_url = images
            .iter()
            .find(|image| image.is_primary)
            .or_else(|| images.first())
            .map(|image| image.image_url.clone());

        PropertySummary {
            id: property.id,
            title: property.title,
            address: property.address,
            city: property.city,
            state: property.state,
            price: property.price,
            image_url,
        }
    }

    /// Images by display order; a failed fetch yields an empty list.
    fn ordered_images(&self, property_id: PropertyId) -> Vec<PropertyImage> {
        match self.images.for_property(property_id) {
            Ok(mut images) => {
                images.retain(|image| image.property_id == property_id);
                images.sort_by_key(|image| image.display_order);
                images
            }
            Err(err) => {
                tracing::warn!(property_id, error = %err, "image lookup failed; returning no images");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ImageId, ImageUpdate, NewPropertyImage};
    use crate::repository::{RepositoryError, RepositoryResult};
    use crate::testing::Fixture;

    struct BrokenImages;

    impl ImageRepository for BrokenImages {
        fn insert(&self, _image: NewPropertyImage) -> RepositoryResult<PropertyImage> {
            Err(RepositoryError::Unavailable("blob store offline".into()))
        }

        fn for_property(&self, _property_id: PropertyId) -> RepositoryResult<Vec<PropertyImage>> {
            Err(RepositoryError::Unavailable("blob store offline".into()))
        }

        fn set_primary(&self, _property_id: PropertyId, _image_id: ImageId) -> RepositoryResult<()> {
            Err(RepositoryError::Unavailable("blob store offline".into()))
        }

        fn update(
            &self,
            _property_id: PropertyId,
            _image_id: ImageId,
            _update: ImageUpdate,
        ) -> RepositoryResult<PropertyImage> {
            Err(RepositoryError::Unavailable("blob store offline".into()))
        }

        fn delete(&self, _property_id: PropertyId, _image_id: ImageId) -> RepositoryResult<bool> {
            Err(RepositoryError::Unavailable("blob store offline".into()))
        }

        fn reorder(&self, _property_id: PropertyId, _order: &[ImageId]) -> RepositoryResult<()> {
            Err(RepositoryError::Unavailable("blob store offline".into()))
        }
    }

    #[test]
    fn resolves_owner_images_and_favorites() {
        let fixture = Fixture::new();
        let owner = fixture.user("owner@example.com");
        let fan = fixture.user("fan@example.com");
        let property = fixture.owned_property("Loft", "Denver", owner.id);
        fixture.image(property.id, "https://img/0.jpg", false);
        fixture.image(property.id, "https://img/1.jpg", true);
        let other = fixture.property("Elsewhere", "Denver");
        fixture.image(other.id, "https://img/other.jpg", true);
        fixture
            .repositories
            .favorites
            .insert(fan.id, property.id, None)
            .expect("favorite");

        let assembler = ResponseAssembler::new(&fixture.repositories);
        let response = assembler
            .property(property.clone(), Some(fan.id))
            .expect("assemble");
        assert_eq!(
            response.image_urls,
            vec!["https://img/0.jpg".to_string(), "https://img/1.jpg".to_string()]
        );
        assert_eq!(response.favorite_count, 1);
        assert_eq!(response.is_favorited, Some(true));
        let summary = response.owner.expect("owner summary");
        assert_eq!(summary.id, owner.id);
        assert_eq!(summary.full_name, owner.full_name());

        let anonymous = assembler.property(property, None).expect("assemble");
        assert_eq!(anonymous.is_favorited, None);
    }

    #[test]
    fn image_failure_degrades_to_empty_list() {
        let fixture = Fixture::new();
        let property = fixture.property("Shed", "Provo");
        let mut repositories = fixture.repositories.clone();
        repositories.images = Arc::new(BrokenImages);

        let response = ResponseAssembler::new(&repositories)
            .property(property, None)
            .expect("assembly still succeeds");
        assert!(response.image_urls.is_empty());
        assert_eq!(response.favorite_count, 0);
    }

    #[test]
    fn favorite_summary_prefers_primary_then_first_image() {
        let fixture = Fixture::new();
        let user = fixture.user("summary@example.com");
        let with_primary = fixture.property("Primary", "Waco");
        fixture.image(with_primary.id, "https://img/first.jpg", false);
        fixture.image(with_primary.id, "https://img/hero.jpg", true);
        let without_primary = fixture.property("First", "Waco");
        fixture.image(without_primary.id, "https://img/only.jpg", false);
        let bare = fixture.property("Bare", "Waco");

        let assembler = ResponseAssembler::new(&fixture.repositories);
        let favorites = &fixture.repositories.favorites;
        let image_for = |property_id| {
            let favorite = favorites.insert(user.id, property_id, None).expect("favorite");
            assembler
                .favorite(favorite)
                .expect("summary")
                .property
                .expect("property present")
                .image_url
        };

        assert_eq!(image_for(with_primary.id).as_deref(), Some("https://img/hero.jpg"));
        assert_eq!(image_for(without_primary.id).as_deref(), Some("https://img/only.jpg"));
        assert_eq!(image_for(bare.id), None);
    }
}
