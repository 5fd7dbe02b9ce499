//! Inquiries sent to the agent or owner of a listing.

pub mod router;
pub mod service;

pub use router::contact_router;
pub use service::ContactService;
