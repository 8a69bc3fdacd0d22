use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::aggregator::{Aggregator, AggregatorConfig};
use super::domain::{BatchOutcome, CandidateScore, Category, RecommendationError, ScoredRequest};
use super::lookup::DetailLookup;

/// Category-partitioned candidates from the ranking source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub streams: Vec<CandidateScore>,
    #[serde(default)]
    pub exams: Vec<CandidateScore>,
    #[serde(default)]
    pub jobs: Vec<CandidateScore>,
}

/// One resolved batch per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationBoard {
    pub streams: BatchOutcome,
    pub exams: BatchOutcome,
    pub jobs: BatchOutcome,
}

/// Detail lookups for each category.
#[derive(Clone)]
pub struct CategoryLookups {
    pub streams: Arc<dyn DetailLookup>,
    pub exams: Arc<dyn DetailLookup>,
    pub jobs: Arc<dyn DetailLookup>,
}

impl CategoryLookups {
    /// Use the same lookup for every category.
    pub fn shared(lookup: Arc<dyn DetailLookup>) -> Self {
        Self {
            streams: Arc::clone(&lookup),
            exams: Arc::clone(&lookup),
            jobs: lookup,
        }
    }
}

/// Runs one aggregator per category.
#[derive(Debug, Clone)]
pub struct RecommendationService {
    streams: Aggregator,
    exams: Aggregator,
    jobs: Aggregator,
}

impl RecommendationService {
    pub fn new(lookups: CategoryLookups, config: AggregatorConfig) -> Self {
        Self {
            streams: Aggregator::new(Category::Streams, lookups.streams, config),
            exams: Aggregator::new(Category::Exams, lookups.exams, config),
            jobs: Aggregator::new(Category::Jobs, lookups.jobs, config),
        }
    }

    fn aggregator(&self, category: Category) -> &Aggregator {
        match category {
            Category::Streams => &self.streams,
            Category::Exams => &self.exams,
            Category::Jobs => &self.jobs,
        }
    }

    /// Validate every category up front, then resolve all three concurrently.
    pub async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> Result<RecommendationBoard, RecommendationError> {
        let streams = ScoredRequest::batch(Category::Streams, &request.streams)?;
        let exams = ScoredRequest::batch(Category::Exams, &request.exams)?;
        let jobs = ScoredRequest::batch(Category::Jobs, &request.jobs)?;

        let (streams, exams, jobs) = tokio::join!(
            self.streams.run_batch(streams),
            self.exams.run_batch(exams),
            self.jobs.run_batch(jobs),
        );

        Ok(RecommendationBoard {
            streams,
            exams,
            jobs,
        })
    }

    pub async fn recommend_category(
        &self,
        category: Category,
        candidates: &[CandidateScore],
    ) -> Result<BatchOutcome, RecommendationError> {
        let requests = ScoredRequest::batch(category, candidates)?;
        Ok(self.aggregator(category).run_batch(requests).await)
    }
}
