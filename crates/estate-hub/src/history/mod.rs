//! Per-user search log and search analytics.

pub mod router;
pub mod service;

pub use router::history_router;
pub use service::{SearchHistoryService, SearchTally};
