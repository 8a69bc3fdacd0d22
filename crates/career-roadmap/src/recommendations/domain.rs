use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const MAX_SCORE: u8 = 100;

/// Recommendation partitions delivered by the ranking source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Streams,
    Exams,
    Jobs,
}

impl Category {
    pub const fn ordered() -> [Self; 3] {
        [Self::Streams, Self::Exams, Self::Jobs]
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Streams => "streams",
            Self::Exams => "exams",
            Self::Jobs => "jobs",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Streams => "Streams",
            Self::Exams => "Entrance Exams",
            Self::Jobs => "Jobs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = RecommendationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|category| {
                category.slug() == normalized || category.slug().trim_end_matches('s') == normalized
            })
            .ok_or_else(|| RecommendationError::UnknownCategory(value.to_string()))
    }
}

/// Wire form of a ranked candidate before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub id: u32,
    pub score: u32,
}

/// A candidate id with its precomputed score, awaiting enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoredRequest {
    pub id: u32,
    pub score: u8,
    pub category: Category,
}

impl ScoredRequest {
    pub fn new(id: u32, score: u32, category: Category) -> Result<Self, RecommendationError> {
        match u8::try_from(score) {
            Ok(score) if score <= MAX_SCORE => Ok(Self {
                id,
                score,
                category,
            }),
            _ => Err(RecommendationError::ScoreOutOfRange { id, score }),
        }
    }

    pub fn batch(
        category: Category,
        candidates: &[CandidateScore],
    ) -> Result<Vec<Self>, RecommendationError> {
        candidates
            .iter()
            .map(|candidate| Self::new(candidate.id, candidate.score, category))
            .collect()
    }
}

/// Display fields returned by a detail lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFields {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl CandidateFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A successfully resolved candidate in its final ranked position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedResult {
    pub rank: usize,
    pub id: u32,
    pub score: u8,
    pub category: Category,
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    pub top_match: bool,
}

/// Final, sorted result of one aggregation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub category: Category,
    pub results: Vec<EnrichedResult>,
    pub top_index: Option<usize>,
    pub no_data: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deadline_expired: bool,
}

impl BatchOutcome {
    pub fn no_data(category: Category) -> Self {
        Self {
            category,
            results: Vec::new(),
            top_index: None,
            no_data: true,
            deadline_expired: false,
        }
    }

    /// Build an outcome from results already in rank order.
    pub(crate) fn ranked(
        category: Category,
        ranked: Vec<(ScoredRequest, CandidateFields)>,
        deadline_expired: bool,
    ) -> Self {
        let results: Vec<EnrichedResult> = ranked
            .into_iter()
            .enumerate()
            .map(|(index, (request, fields))| EnrichedResult {
                rank: index + 1,
                id: request.id,
                score: request.score,
                category,
                name: fields.name,
                attributes: fields.attributes,
                top_match: index == 0,
            })
            .collect();

        let no_data = results.is_empty();
        Self {
            category,
            top_index: if no_data { None } else { Some(0) },
            results,
            no_data,
            deadline_expired,
        }
    }

    pub fn top_match(&self) -> Option<&EnrichedResult> {
        self.top_index.and_then(|index| self.results.get(index))
    }

    pub fn ids(&self) -> Vec<u32> {
        self.results.iter().map(|result| result.id).collect()
    }
}

/// Error raised while validating recommendation input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecommendationError {
    #[error("candidate {id} has score {score}; scores must be between 0 and 100")]
    ScoreOutOfRange { id: u32, score: u32 },
    #[error("unknown recommendation category '{0}'")]
    UnknownCategory(String),
}
