//! Viewing bookings and their status workflow.

pub mod router;
pub mod service;
pub mod state;

pub use router::viewing_router;
pub use service::{parse_time, ViewingRequest, ViewingService};
pub use state::{IllegalTransition, ViewingAction};
