//! Subscription plans, upgrades and the expiry sweep.

pub mod plan;
pub mod router;
pub mod service;

pub use router::subscription_router;
pub use service::{SubscriptionService, SweepReport, DEFAULT_EXPIRY_WINDOW_DAYS};
