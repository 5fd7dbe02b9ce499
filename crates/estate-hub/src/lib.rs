//! Real-estate marketplace backend: listing search, viewing scheduling,
//! subscriptions and the buyer-side extras (favorites, inquiries, search log).

pub mod api;
pub mod clock;
pub mod config;
pub mod contacts;
pub mod directory;
pub mod domain;
pub mod error;
pub mod favorites;
pub mod history;
pub mod listings;
pub mod page;
pub mod repository;
pub mod store;
pub mod subscriptions;
pub mod telemetry;
pub mod viewings;

#[cfg(test)]
pub(crate) mod testing;
