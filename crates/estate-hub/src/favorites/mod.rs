//! User bookmarks of listings.

pub mod router;
pub mod service;

pub use router::favorite_router;
pub use service::{favorite_order, FavoriteService, ToggleOutcome};
