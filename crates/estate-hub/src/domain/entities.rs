use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ListingType, PlanType, PropertyType, Role, UserType, ViewingStatus};

pub type UserId = i64;
pub type PropertyId = i64;
pub type ImageId = i64;
pub type BuilderGroupId = i64;
pub type FavoriteId = i64;
pub type ViewingId = i64;
pub type ContactId = i64;
pub type SubscriptionId = i64;
pub type SearchHistoryId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub role: Role,
    pub subscription_type: PlanType,
    pub company: Option<String>,
    pub license_number: Option<String>,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Insert payload for [`User`]; the store assigns id and audit timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub user_type: UserType,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

fn default_role() -> Role {
    Role::User
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderGroup {
    pub id: BuilderGroupId,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBuilderGroup {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
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
    pub owner_id: Option<UserId>,
    pub builder_group_id: Option<BuilderGroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: BigDecimal,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub zip_code: Option<String>,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    #[serde(default)]
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub bathrooms: Option<i32>,
    #[serde(default)]
    pub square_feet: Option<BigDecimal>,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub builder_group_id: Option<BuilderGroupId>,
}

fn default_available() -> bool {
    true
}

/// Full replacement of a listing's own fields. Ownership and grouping are
/// fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyUpdate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: BigDecimal,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub zip_code: Option<String>,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    #[serde(default)]
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub bathrooms: Option<i32>,
    #[serde(default)]
    pub square_feet: Option<BigDecimal>,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default = "default_available")]
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    pub id: ImageId,
    pub property_id: PropertyId,
    pub image_url: String,
    pub caption: Option<String>,
    pub is_primary: bool,
    pub display_order: i32,
    pub uploaded_at: DateTime<Utc>,
}

/// Images are appended at the next dense display order of their property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPropertyImage {
    pub property_id: PropertyId,
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// Edit of one image. The caption is always replaced; the URL and primary
/// flag only when given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpdate {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleViewing {
    pub id: ViewingId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub viewing_date: NaiveDate,
    pub viewing_time: NaiveTime,
    pub status: ViewingStatus,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewScheduleViewing {
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub viewing_date: NaiveDate,
    pub viewing_time: NaiveTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAgent {
    pub id: ContactId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub subject: String,
    pub message: String,
    pub sender_name: String,
    pub sender_email: String,
    pub sender_phone: Option<String>,
    pub additional_info: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContactAgent {
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub subject: String,
    pub message: String,
    pub sender_name: String,
    pub sender_email: String,
    #[serde(default)]
    pub sender_phone: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub price: BigDecimal,
    pub active: bool,
    pub auto_renew: bool,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// A subscription is expired once today is strictly after its end date.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| today > end)
    }
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistory {
    pub id: SearchHistoryId,
    pub user_id: UserId,
    pub search_keyword: Option<String>,
    pub search_city: Option<String>,
    pub search_state: Option<String>,
    pub search_property_type: Option<PropertyType>,
    pub search_listing_type: Option<ListingType>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub min_bedrooms: Option<i32>,
    pub max_bedrooms: Option<i32>,
    pub min_bathrooms: Option<i32>,
    pub max_bathrooms: Option<i32>,
    pub min_square_feet: Option<BigDecimal>,
    pub max_square_feet: Option<BigDecimal>,
    pub results_count: i64,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSearchHistory {
    pub user_id: UserId,
    pub search_keyword: Option<String>,
    pub search_city: Option<String>,
    pub search_state: Option<String>,
    pub search_property_type: Option<PropertyType>,
    pub search_listing_type: Option<ListingType>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub min_bedrooms: Option<i32>,
    pub max_bedrooms: Option<i32>,
    pub min_bathrooms: Option<i32>,
    pub max_bathrooms: Option<i32>,
    pub min_square_feet: Option<BigDecimal>,
    pub max_square_feet: Option<BigDecimal>,
    pub results_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn subscription(end_date: Option<NaiveDate>) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: 1,
            user_id: 1,
            plan_type: PlanType::Basic,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            end_date,
            price: BigDecimal::from_str("9.99").expect("decimal"),
            active: true,
            auto_renew: false,
            payment_method: None,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn subscription_expires_after_end_date() {
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).expect("date");
        let record = subscription(Some(end));
        assert!(!record.is_expired(end));
        assert!(record.is_expired(end.succ_opt().expect("next day")));
        assert!(!subscription(None).is_expired(end));
    }

    #[test]
    fn user_password_is_never_serialized() {
        let now = Utc::now();
        let user = User {
            id: 7,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "secret".into(),
            phone: None,
            user_type: UserType::Agent,
            role: Role::Agent,
            subscription_type: PlanType::Free,
            company: None,
            license_number: None,
            bio: None,
            profile_image_url: None,
            active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).expect("serialize");
        assert!(json.get("password").is_none());
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(user.full_name(), "Ada Lovelace");
    }
}
