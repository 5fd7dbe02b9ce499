//! Storage abstractions so services can be exercised in isolation.
//!
//! Every trait is synchronous; async handlers reach them on the blocking pool
//! through [`crate::api::blocking`]. Implementations must make each
//! method atomic: a multi-row write either lands completely or not at all.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    BuilderGroup, BuilderGroupId, ContactAgent, ContactId, Favorite, FavoriteId, ImageId,
    ImageUpdate, NewBuilderGroup, NewContactAgent, NewProperty, NewPropertyImage,
    NewScheduleViewing, NewSearchHistory, NewSubscription, NewUser, PlanType, Property,
    PropertyId, PropertyImage, PropertyType, PropertyUpdate, ScheduleViewing, SearchHistory,
    SearchHistoryId, Subscription, User, UserId, ViewingId, ViewingStatus,
};
use crate::listings::plan::SearchPlan;
use crate::page::{PageRequest, SortDirection};

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub trait UserRepository: Send + Sync {
    fn insert(&self, user: NewUser) -> RepositoryResult<User>;
    fn find(&self, id: UserId) -> RepositoryResult<Option<User>>;
    fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
}

pub trait BuilderGroupRepository: Send + Sync {
    fn insert(&self, group: NewBuilderGroup) -> RepositoryResult<BuilderGroup>;
    fn find(&self, id: BuilderGroupId) -> RepositoryResult<Option<BuilderGroup>>;
}

pub trait PropertyRepository: Send + Sync {
    fn insert(&self, property: NewProperty) -> RepositoryResult<Property>;
    fn find(&self, id: PropertyId) -> RepositoryResult<Option<Property>>;
    /// Returns `None` when no such property exists.
    fn update(&self, id: PropertyId, update: PropertyUpdate) -> RepositoryResult<Option<Property>>;
    /// Removes the property together with its images, favorites, viewings and inquiries.
    fn delete(&self, id: PropertyId) -> RepositoryResult<bool>;
    /// Returns the requested page and the total number of matching rows.
    fn search(&self, plan: &SearchPlan) -> RepositoryResult<(Vec<Property>, u64)>;
    fn by_owner(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> RepositoryResult<(Vec<Property>, u64)>;
    fn available(&self) -> RepositoryResult<Vec<Property>>;
    fn available_cities(&self) -> RepositoryResult<Vec<String>>;
    fn available_states(&self) -> RepositoryResult<Vec<String>>;
    fn count_available(&self) -> RepositoryResult<u64>;
    /// Mean price of available listings whose city matches case-insensitively.
    fn average_price_in(&self, city: &str) -> RepositoryResult<Option<BigDecimal>>;
}

pub trait ImageRepository: Send + Sync {
    fn insert(&self, image: NewPropertyImage) -> RepositoryResult<PropertyImage>;
    /// Images of one property ordered by display order.
    fn for_property(&self, property_id: PropertyId) -> RepositoryResult<Vec<PropertyImage>>;
    fn set_primary(&self, property_id: PropertyId, image_id: ImageId) -> RepositoryResult<()>;
    /// `NotFound` when the image does not belong to the property.
    fn update(
        &self,
        property_id: PropertyId,
        image_id: ImageId,
        update: ImageUpdate,
    ) -> RepositoryResult<PropertyImage>;
    /// Closes the gap in display order and, if the primary image went,
    /// promotes the new first image.
    fn delete(&self, property_id: PropertyId, image_id: ImageId) -> RepositoryResult<bool>;
    /// Renumbers the images 0.. in the given order. `NotFound` unless `order`
    /// names every image of the property exactly once.
    fn reorder(&self, property_id: PropertyId, order: &[ImageId]) -> RepositoryResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteOrder {
    CreatedAt(SortDirection),
    Id(SortDirection),
}

pub trait FavoriteRepository: Send + Sync {
    fn insert(
        &self,
        user_id: UserId,
        property_id: PropertyId,
        notes: Option<String>,
    ) -> RepositoryResult<Favorite>;
    fn find(&self, id: FavoriteId) -> RepositoryResult<Option<Favorite>>;
    fn find_pair(
        &self,
        user_id: UserId,
        property_id: PropertyId,
    ) -> RepositoryResult<Option<Favorite>>;
    fn delete(&self, id: FavoriteId) -> RepositoryResult<bool>;
    fn count_for_property(&self, property_id: PropertyId) -> RepositoryResult<u64>;
    fn for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
        order: FavoriteOrder,
    ) -> RepositoryResult<(Vec<Favorite>, u64)>;
    fn update_notes(&self, id: FavoriteId, notes: Option<String>) -> RepositoryResult<Favorite>;
}

/// Whose viewings a listing query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewingScope {
    All,
    User(UserId),
    Property(PropertyId),
    /// Viewings of every property owned by the user.
    Owner(UserId),
}

/// A guarded status change: applied only while the row is still in `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewingTransition {
    pub from: ViewingStatus,
    pub to: ViewingStatus,
    pub at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

pub trait ViewingRepository: Send + Sync {
    /// Fails with `Conflict` when the property already has an active viewing on that date.
    fn insert(&self, viewing: NewScheduleViewing) -> RepositoryResult<ScheduleViewing>;
    fn find(&self, id: ViewingId) -> RepositoryResult<Option<ScheduleViewing>>;
    fn has_active_on(&self, property_id: PropertyId, date: NaiveDate) -> RepositoryResult<bool>;
    /// Returns `None` when the row no longer holds `transition.from`.
    fn transition(
        &self,
        id: ViewingId,
        transition: &ViewingTransition,
    ) -> RepositoryResult<Option<ScheduleViewing>>;
    fn list(
        &self,
        scope: ViewingScope,
        status: Option<ViewingStatus>,
    ) -> RepositoryResult<Vec<ScheduleViewing>>;
    fn between(&self, start: NaiveDate, end: NaiveDate) -> RepositoryResult<Vec<ScheduleViewing>>;
    fn count_with_status(
        &self,
        property_id: PropertyId,
        status: ViewingStatus,
    ) -> RepositoryResult<u64>;
    fn delete(&self, id: ViewingId) -> RepositoryResult<bool>;
}

pub trait SubscriptionRepository: Send + Sync {
    fn for_user(&self, user_id: UserId) -> RepositoryResult<Option<Subscription>>;
    /// Inserts the row and mirrors the plan onto the user in one transaction.
    /// An inactive row for the same user is replaced; an active one is a `Conflict`.
    fn create(&self, subscription: NewSubscription) -> RepositoryResult<Subscription>;
    /// Persists the row and, when given, the user's denormalized plan in one transaction.
    fn save(
        &self,
        subscription: &Subscription,
        user_plan: Option<PlanType>,
    ) -> RepositoryResult<Subscription>;
    fn active(&self) -> RepositoryResult<Vec<Subscription>>;
    /// Active subscriptions whose end date is strictly before `today`.
    fn expired(&self, today: NaiveDate) -> RepositoryResult<Vec<Subscription>>;
    fn ending_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Subscription>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactScope {
    All,
    User(UserId),
    Property(PropertyId),
    Owner(UserId),
}

pub trait ContactRepository: Send + Sync {
    fn insert(&self, contact: NewContactAgent) -> RepositoryResult<ContactAgent>;
    fn find(&self, id: ContactId) -> RepositoryResult<Option<ContactAgent>>;
    fn list(&self, scope: ContactScope, unread_only: bool) -> RepositoryResult<Vec<ContactAgent>>;
    fn mark_read(&self, id: ContactId, at: DateTime<Utc>) -> RepositoryResult<ContactAgent>;
    fn count_unread_for_owner(&self, owner_id: UserId) -> RepositoryResult<u64>;
    fn delete(&self, id: ContactId) -> RepositoryResult<bool>;
}

pub trait SearchHistoryRepository: Send + Sync {
    fn insert(&self, entry: NewSearchHistory) -> RepositoryResult<SearchHistory>;
    /// Newest first, optionally truncated.
    fn for_user(&self, user_id: UserId, limit: Option<u32>)
        -> RepositoryResult<Vec<SearchHistory>>;
    fn delete(&self, id: SearchHistoryId) -> RepositoryResult<bool>;
    fn clear_for_user(&self, user_id: UserId) -> RepositoryResult<u64>;
    fn count_for_user(&self, user_id: UserId) -> RepositoryResult<u64>;
    fn top_cities(&self, limit: u32) -> RepositoryResult<Vec<(String, u64)>>;
    fn top_property_types(&self, limit: u32) -> RepositoryResult<Vec<(PropertyType, u64)>>;
}

/// Every repository the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub builder_groups: Arc<dyn BuilderGroupRepository>,
    pub properties: Arc<dyn PropertyRepository>,
    pub images: Arc<dyn ImageRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub viewings: Arc<dyn ViewingRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    pub search_history: Arc<dyn SearchHistoryRepository>,
}
