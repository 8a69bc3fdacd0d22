//! Scored-candidate aggregation: concurrent detail lookups joined into a
//! single ranked list per category.

pub mod aggregator;
pub mod domain;
pub mod lookup;
pub mod router;
pub mod service;

pub use aggregator::{Aggregator, AggregatorConfig};
pub use domain::{
    BatchOutcome, CandidateFields, CandidateScore, Category, EnrichedResult, RecommendationError,
    ScoredRequest, MAX_SCORE,
};
pub use lookup::{DetailLookup, LookupError};
pub use router::recommendation_router;
pub use service::{
    CategoryLookups, RecommendationBoard, RecommendationRequest, RecommendationService,
};
