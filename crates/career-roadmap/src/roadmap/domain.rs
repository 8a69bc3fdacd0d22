use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Milestone categories a roadmap can pass through.
///
/// The engine treats kinds as opaque tags; only equality matters for the
/// sequence policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    EducationLevel,
    Stream,
    Exam,
    Job,
    Experience,
    Preparation,
}

impl StepKind {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::EducationLevel,
            Self::Stream,
            Self::Exam,
            Self::Job,
            Self::Experience,
            Self::Preparation,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::EducationLevel => "Education Level",
            Self::Stream => "Stream",
            Self::Exam => "Entrance Exam",
            Self::Job => "Job",
            Self::Experience => "Experience",
            Self::Preparation => "Preparation",
        }
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::EducationLevel => "education_level",
            Self::Stream => "stream",
            Self::Exam => "exam",
            Self::Job => "job",
            Self::Experience => "experience",
            Self::Preparation => "preparation",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown step kind '{0}'")]
pub struct UnknownStepKind(pub String);

impl FromStr for StepKind {
    type Err = UnknownStepKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ordered()
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| UnknownStepKind(value.to_string()))
    }
}

/// One committed selection in the roadmap.
///
/// Steps are never edited in place; replacing one means removing it and
/// inserting a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepKind,
    pub ref_id: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Step {
    pub fn new(kind: StepKind, ref_id: u32, title: impl Into<String>) -> Self {
        Self {
            kind,
            ref_id,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The terminal objective the roadmap is built toward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGoal {
    pub ref_id: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TargetGoal {
    pub fn new(ref_id: u32, title: impl Into<String>) -> Self {
        Self {
            ref_id,
            title: title.into(),
            salary_range: None,
            description: None,
        }
    }

    pub fn with_salary_range(mut self, salary_range: impl Into<String>) -> Self {
        self.salary_range = Some(salary_range.into());
        self
    }
}

/// Read-only view of a step together with its zero-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedStep {
    pub position: usize,
    #[serde(flatten)]
    pub step: Step,
}
