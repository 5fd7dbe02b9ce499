//! Listing search, response assembly and recommendations.

pub mod assembler;
pub mod plan;
pub mod recommendations;
pub mod router;
pub mod search;
pub mod service;

pub use assembler::{
    BuilderGroupSummary, FavoriteResponse, OwnerSummary, PropertyResponse, PropertySummary,
    ResponseAssembler,
};
pub use recommendations::{HttpRecommendationClient, RecommendationClient};
pub use router::listing_router;
pub use search::SearchRequest;
pub use service::ListingService;
