//! Marketplace entities and the labelled enums they carry.
//!
//! Relationships are plain foreign-key ids; related rows are resolved through
//! explicit repository calls rather than embedded object graphs.

pub mod entities;
pub mod enums;

pub use entities::*;
pub use enums::{
    ListingType, PlanType, PropertyType, Role, UnknownVariant, UserType, ViewingStatus,
};
