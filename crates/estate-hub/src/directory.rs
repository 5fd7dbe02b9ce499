//! Registration and lookup of users and builder groups.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;

use crate::api::{blocking, created, ok, ApiJson, ApiPath, ApiResult, Created};
use crate::domain::{BuilderGroup, BuilderGroupId, NewBuilderGroup, NewUser, User, UserId};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{BuilderGroupRepository, Repositories, RepositoryError, UserRepository};

pub struct DirectoryService {
    users: Arc<dyn UserRepository>,
    builder_groups: Arc<dyn BuilderGroupRepository>,
}

impl DirectoryService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            users: repositories.users.clone(),
            builder_groups: repositories.builder_groups.clone(),
        }
    }

    pub fn register(&self, mut user: NewUser) -> ServiceResult<User> {
        user.email = user.email.trim().to_ascii_lowercase();
        if !user.email.contains('@') {
            return Err(ServiceError::InvalidArgument(format!(
                "'{}' is not an email address",
                user.email
            )));
        }
        if user.first_name.trim().is_empty() || user.last_name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "first and last name are required".to_string(),
            ));
        }
        let email = user.email.clone();
        let created = self.users.insert(user).map_err(|err| match err {
            RepositoryError::Conflict => {
                ServiceError::Conflict(format!("email {email} is already registered"))
            }
            other => other.into(),
        })?;
        tracing::info!(user_id = created.id, user_type = %created.user_type, "user registered");
        Ok(created)
    }

    pub fn user(&self, id: UserId) -> ServiceResult<User> {
        self.users
            .find(id)?
            .ok_or_else(|| ServiceError::not_found("user", id))
    }

    pub fn user_by_email(&self, email: &str) -> ServiceResult<User> {
        self.users
            .find_by_email(&email.trim().to_ascii_lowercase())?
            .ok_or_else(|| ServiceError::NotFound(format!("user not found with email: {email}")))
    }

    pub fn create_builder_group(&self, group: NewBuilderGroup) -> ServiceResult<BuilderGroup> {
        if group.name.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "builder group name is required".to_string(),
            ));
        }
        let group = self.builder_groups.insert(group)?;
        tracing::info!(builder_group_id = group.id, "builder group created");
        Ok(group)
    }

    pub fn builder_group(&self, id: BuilderGroupId) -> ServiceResult<BuilderGroup> {
        self.builder_groups
            .find(id)?
            .ok_or_else(|| ServiceError::not_found("builder group", id))
    }
}

pub fn directory_router(service: Arc<DirectoryService>) -> Router {
    Router::new()
        .route("/api/users", post(register_handler))
        .route("/api/users/:id", get(user_handler))
        .route("/api/users/email/:email", get(user_by_email_handler))
        .route("/api/builder-groups", post(create_group_handler))
        .route("/api/builder-groups/:id", get(group_handler))
        .with_state(service)
}

async fn register_handler(
    State(service): State<Arc<DirectoryService>>,
    ApiJson(user): ApiJson<NewUser>,
) -> Created<User> {
    let user = blocking(move || service.register(user)).await?;
    created(user, "User created successfully")
}

async fn user_handler(
    State(service): State<Arc<DirectoryService>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<User> {
    ok(blocking(move || service.user(id)).await?)
}

async fn user_by_email_handler(
    State(service): State<Arc<DirectoryService>>,
    ApiPath(email): ApiPath<String>,
) -> ApiResult<User> {
    ok(blocking(move || service.user_by_email(&email)).await?)
}

async fn create_group_handler(
    State(service): State<Arc<DirectoryService>>,
    ApiJson(group): ApiJson<NewBuilderGroup>,
) -> Created<BuilderGroup> {
    let group = blocking(move || service.create_builder_group(group)).await?;
    created(group, "Builder group created successfully")
}

async fn group_handler(
    State(service): State<Arc<DirectoryService>>,
    ApiPath(id): ApiPath<BuilderGroupId>,
) -> ApiResult<BuilderGroup> {
    ok(blocking(move || service.builder_group(id)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_user, Fixture};

    #[test]
    fn duplicate_email_is_conflict() {
        let fixture = Fixture::new();
        let directory = DirectoryService::new(&fixture.repositories);
        let first = directory
            .register(new_user("Jane@Example.com"))
            .expect("register");
        assert_eq!(first.email, "jane@example.com");
        assert!(matches!(
            directory.register(new_user("jane@example.com ")),
            Err(ServiceError::Conflict(_))
        ));
        assert_eq!(
            directory.user_by_email("JANE@example.com").expect("lookup").id,
            first.id
        );
    }

    #[test]
    fn rejects_malformed_registrations() {
        let fixture = Fixture::new();
        let directory = DirectoryService::new(&fixture.repositories);
        assert!(matches!(
            directory.register(new_user("not-an-email")),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            directory.create_builder_group(NewBuilderGroup {
                name: " ".into(),
                description: None,
            }),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(directory.user(42), Err(ServiceError::NotFound(_))));
    }
}
