//! Shared fixtures for unit tests: a fresh in-memory store per test.

use std::sync::Arc;

use crate::domain::{
    ListingType, NewProperty, NewPropertyImage, NewUser, Property, PropertyId, PropertyImage,
    PropertyType, Role, User, UserId, UserType,
};
use crate::repository::Repositories;
use crate::store::Database;

pub(crate) struct Fixture {
    pub repositories: Repositories,
}

impl Fixture {
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().expect("in-memory database"));
        Self {
            repositories: Repositories::sqlite(db),
        }
    }

    pub fn user(&self, email: &str) -> User {
        self.repositories
            .users
            .insert(new_user(email))
            .expect("insert user")
    }

    pub fn property(&self, title: &str, city: &str) -> Property {
        self.repositories
            .properties
            .insert(new_property(title, city))
            .expect("insert property")
    }

    pub fn owned_property(&self, title: &str, city: &str, owner_id: UserId) -> Property {
        let mut property = new_property(title, city);
        property.owner_id = Some(owner_id);
        self.repositories
            .properties
            .insert(property)
            .expect("insert property")
    }

    pub fn image(&self, property_id: PropertyId, url: &str, is_primary: bool) -> PropertyImage {
        self.repositories
            .images
            .insert(NewPropertyImage {
                property_id,
                image_url: url.to_string(),
                caption: None,
                is_primary,
            })
            .expect("insert image")
    }
}

pub(crate) fn new_user(email: &str) -> NewUser {
    NewUser {
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: email.to_string(),
        password: "password".to_string(),
        phone: None,
        user_type: UserType::Buyer,
        role: Role::User,
        company: None,
        license_number: None,
        bio: None,
        profile_image_url: None,
    }
}

pub(crate) fn new_property(title: &str, city: &str) -> NewProperty {
    NewProperty {
        title: title.to_string(),
        description: Some(format!("{title} description")),
        price: "250000".parse().expect("decimal"),
        address: format!("1 {title} Way"),
        city: city.to_string(),
        state: "TX".to_string(),
        zip_code: None,
        property_type: PropertyType::House,
        listing_type: ListingType::ForSale,
        bedrooms: Some(3),
        bathrooms: Some(2),
        square_feet: Some("1800".parse().expect("decimal")),
        year_built: Some(2001),
        available: true,
        owner_id: None,
        builder_group_id: None,
    }
}
