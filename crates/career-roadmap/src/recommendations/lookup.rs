use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::domain::CandidateFields;

/// Resolves a candidate id to its display fields.
///
/// Implementations own their transport concerns; the aggregator treats every
/// error the same way.
#[async_trait]
pub trait DetailLookup: Send + Sync {
    async fn lookup(&self, id: u32) -> Result<CandidateFields, LookupError>;
}

#[async_trait]
impl<T: DetailLookup + ?Sized> DetailLookup for Arc<T> {
    async fn lookup(&self, id: u32) -> Result<CandidateFields, LookupError> {
        (**self).lookup(id).await
    }
}

/// Lookup failure taxonomy. All variants are absorbed by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("candidate {0} not found")]
    NotFound(u32),
    #[error("lookup transport failed: {0}")]
    Transport(String),
    #[error("lookup timed out after {0:?}")]
    TimedOut(Duration),
    #[error("lookup task ended before reporting")]
    Abandoned,
}
