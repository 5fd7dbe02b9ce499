use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{FavoriteId, PropertyId, UserId};
use crate::error::{ServiceError, ServiceResult};
use crate::listings::{FavoriteResponse, ResponseAssembler};
use crate::page::{Page, PageError, PageRequest, SortDirection};
use crate::repository::{
    FavoriteOrder, FavoriteRepository, PropertyRepository, Repositories, RepositoryError,
    UserRepository,
};

/// Result of flipping a favorite: the new state and, when added, the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub favorited: bool,
    pub favorite: Option<FavoriteResponse>,
}

/// Parses a "my favorites" sort key; only creation time and id are sortable.
pub fn favorite_order(
    sort_by: Option<&str>,
    direction: Option<&str>,
) -> Result<FavoriteOrder, PageError> {
    let direction = match direction.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => raw.parse::<SortDirection>()?,
        None => SortDirection::Desc,
    };
    match sort_by.map(str::trim).filter(|raw| !raw.is_empty()) {
        None | Some("createdAt") | Some("created_at") => Ok(FavoriteOrder::CreatedAt(direction)),
        Some("id") => Ok(FavoriteOrder::Id(direction)),
        Some(other) => Err(PageError::SortField(other.to_string())),
    }
}

pub struct FavoriteService {
    favorites: Arc<dyn FavoriteRepository>,
    users: Arc<dyn UserRepository>,
    properties: Arc<dyn PropertyRepository>,
    assembler: ResponseAssembler,
}

impl FavoriteService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            favorites: repositories.favorites.clone(),
            users: repositories.users.clone(),
            properties: repositories.properties.clone(),
            assembler: ResponseAssembler::new(repositories),
        }
    }

    pub fn add(
        &self,
        user_id: UserId,
        property_id: PropertyId,
        notes: Option<String>,
    ) -> ServiceResult<FavoriteResponse> {
        if self.users.find(user_id)?.is_none() {
            return Err(ServiceError::not_found("user", user_id));
        }
        if self.properties.find(property_id)?.is_none() {
            return Err(ServiceError::not_found("property", property_id));
        }
        if self.favorites.find_pair(user_id, property_id)?.is_some() {
            return Err(already_favorited());
        }
        let favorite = self
            .favorites
            .insert(user_id, property_id, notes)
            .map_err(|err| match err {
                RepositoryError::Conflict => already_favorited(),
                other => other.into(),
            })?;
        tracing::info!(user_id, property_id, "favorite added");
        self.assembler.favorite(favorite)
    }

    pub fn remove(&self, user_id: UserId, property_id: PropertyId) -> ServiceResult<()> {
        let favorite = self
            .favorites
            .find_pair(user_id, property_id)?
            .ok_or_else(|| ServiceError::NotFound("favorite not found".to_string()))?;
        self.remove_by_id(favorite.id)
    }

    pub fn remove_by_id(&self, id: FavoriteId) -> ServiceResult<()> {
        if !self.favorites.delete(id)? {
            return Err(ServiceError::not_found("favorite", id));
        }
        tracing::info!(favorite_id = id, "favorite removed");
        Ok(())
    }

    /// Removes the favorite if present, otherwise adds it without notes.
    /// A concurrent toggle that got there first settles to the state it left.
    pub fn toggle(&self, user_id: UserId, property_id: PropertyId) -> ServiceResult<ToggleOutcome> {
        match self.favorites.find_pair(user_id, property_id)? {
            Some(existing) => match self.remove_by_id(existing.id) {
                Ok(()) | Err(ServiceError::NotFound(_)) => Ok(ToggleOutcome {
                    favorited: false,
                    favorite: None,
                }),
                Err(err) => Err(err),
            },
            None => {
                let favorite = match self.add(user_id, property_id, None) {
                    Ok(favorite) => favorite,
                    Err(ServiceError::Conflict(_)) => {
                        let existing = self
                            .favorites
                            .find_pair(user_id, property_id)?
                            .ok_or_else(already_favorited)?;
                        self.assembler.favorite(existing)?
                    }
                    Err(err) => return Err(err),
                };
                Ok(ToggleOutcome {
                    favorited: true,
                    favorite: Some(favorite),
                })
            }
        }
    }

    pub fn is_favorited(&self, user_id: UserId, property_id: PropertyId) -> ServiceResult<bool> {
        Ok(self.favorites.find_pair(user_id, property_id)?.is_some())
    }

    pub fn count(&self, property_id: PropertyId) -> ServiceResult<u64> {
        Ok(self.favorites.count_for_property(property_id)?)
    }

    pub fn for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
        order: FavoriteOrder,
    ) -> ServiceResult<Page<FavoriteResponse>> {
        let (rows, total) = self.favorites.for_user(user_id, page, order)?;
        Page::new(rows, page, total).try_map(|favorite| self.assembler.favorite(favorite))
    }

    pub fn update_notes(
        &self,
        id: FavoriteId,
        notes: Option<String>,
    ) -> ServiceResult<FavoriteResponse> {
        let favorite = self
            .favorites
            .update_notes(id, notes)
            .map_err(|err| match err {
                RepositoryError::NotFound => ServiceError::not_found("favorite", id),
                other => other.into(),
            })?;
        self.assembler.favorite(favorite)
    }
}

fn already_favorited() -> ServiceError {
    ServiceError::Conflict("property is already in favorites".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::domain::Favorite;
    use crate::repository::RepositoryResult;
    use crate::testing::Fixture;

    /// Answers the first `stale` pair lookups with "absent", like a reader
    /// that lost the race to a concurrent insert.
    struct LaggingFavorites {
        inner: Arc<dyn FavoriteRepository>,
        stale: AtomicUsize,
    }

    impl FavoriteRepository for LaggingFavorites {
        fn insert(
            &self,
            user_id: UserId,
            property_id: PropertyId,
            notes: Option<String>,
        ) -> RepositoryResult<Favorite> {
            self.inner.insert(user_id, property_id, notes)
        }

        fn find(&self, id: FavoriteId) -> RepositoryResult<Option<Favorite>> {
            self.inner.find(id)
        }

        fn find_pair(
            &self,
            user_id: UserId,
            property_id: PropertyId,
        ) -> RepositoryResult<Option<Favorite>> {
            let lagging = self
                .stale
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if lagging {
                return Ok(None);
            }
            self.inner.find_pair(user_id, property_id)
        }

        fn delete(&self, id: FavoriteId) -> RepositoryResult<bool> {
            self.inner.delete(id)
        }

        fn count_for_property(&self, property_id: PropertyId) -> RepositoryResult<u64> {
            self.inner.count_for_property(property_id)
        }

        fn for_user(
            &self,
            user_id: UserId,
            page: PageRequest,
            order: FavoriteOrder,
        ) -> RepositoryResult<(Vec<Favorite>, u64)> {
            self.inner.for_user(user_id, page, order)
        }

        fn update_notes(&self, id: FavoriteId, notes: Option<String>) -> RepositoryResult<Favorite> {
            self.inner.update_notes(id, notes)
        }
    }

    #[test]
    fn toggle_that_loses_the_insert_race_reports_favorited() {
        let fixture = Fixture::new();
        let user = fixture.user("racer@example.com");
        let property = fixture.property("Cabin", "Moab");
        let winner = fixture
            .repositories
            .favorites
            .insert(user.id, property.id, None)
            .expect("concurrent insert");

        let mut repositories = fixture.repositories.clone();
        repositories.favorites = Arc::new(LaggingFavorites {
            inner: fixture.repositories.favorites.clone(),
            stale: AtomicUsize::new(2),
        });
        let service = FavoriteService::new(&repositories);

        let outcome = service.toggle(user.id, property.id).expect("toggle");
        assert!(outcome.favorited);
        assert_eq!(outcome.favorite.map(|favorite| favorite.id), Some(winner.id));
        assert_eq!(service.count(property.id).expect("count"), 1);
    }

    #[test]
    fn add_twice_conflicts_and_toggle_flips() {
        let fixture = Fixture::new();
        let user = fixture.user("toggle@example.com");
        let property = fixture.property("Chalet", "Aspen");
        let service = FavoriteService::new(&fixture.repositories);

        service
            .add(user.id, property.id, Some("dream home".into()))
            .expect("add");
        assert!(matches!(
            service.add(user.id, property.id, None),
            Err(ServiceError::Conflict(_))
        ));

        let removed = service.toggle(user.id, property.id).expect("toggle off");
        assert!(!removed.favorited);
        assert!(!service.is_favorited(user.id, property.id).expect("check"));

        let added = service.toggle(user.id, property.id).expect("toggle on");
        assert!(added.favorited);
        let favorite = added.favorite.expect("favorite returned");
        assert_eq!(favorite.notes, None);
        assert_eq!(service.count(property.id).expect("count"), 1);
    }

    #[test]
    fn removing_absent_favorite_is_not_found() {
        let fixture = Fixture::new();
        let user = fixture.user("absent@example.com");
        let property = fixture.property("Yurt", "Bend");
        let service = FavoriteService::new(&fixture.repositories);
        assert!(matches!(
            service.remove(user.id, property.id),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.add(user.id, 999, None),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn my_favorites_page_carries_summaries() {
        let fixture = Fixture::new();
        let user = fixture.user("pager@example.com");
        let service = FavoriteService::new(&fixture.repositories);
        for index in 0..3 {
            let property = fixture.property(&format!("Unit {index}"), "Reno");
            fixture.image(property.id, &format!("https://img/{index}.jpg"), false);
            service.add(user.id, property.id, None).expect("add");
        }

        let page = service
            .for_user(
                user.id,
                PageRequest::new(0, 2).expect("page"),
                FavoriteOrder::Id(SortDirection::Asc),
            )
            .expect("page");
        assert_eq!(page.total_elements, 3);
        assert!(page.has_next);
        let summary = page.content[0].property.as_ref().expect("summary");
        assert_eq!(summary.title, "Unit 0");
        assert_eq!(summary.image_url.as_deref(), Some("https://img/0.jpg"));
    }

    #[test]
    fn notes_update_and_missing_id() {
        let fixture = Fixture::new();
        let user = fixture.user("notes@example.com");
        let property = fixture.property("Manor", "Bath");
        let service = FavoriteService::new(&fixture.repositories);
        let favorite = service.add(user.id, property.id, None).expect("add");
        let updated = service
            .update_notes(favorite.id, Some("call agent".into()))
            .expect("update");
        assert_eq!(updated.notes.as_deref(), Some("call agent"));
        assert!(matches!(
            service.update_notes(favorite.id + 10, None),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn favorite_sort_keys_are_restricted() {
        assert_eq!(
            favorite_order(None, None),
            Ok(FavoriteOrder::CreatedAt(SortDirection::Desc))
        );
        assert_eq!(
            favorite_order(Some("id"), Some("asc")),
            Ok(FavoriteOrder::Id(SortDirection::Asc))
        );
        assert!(matches!(
            favorite_order(Some("price"), None),
            Err(PageError::SortField(_))
        ));
    }
}
