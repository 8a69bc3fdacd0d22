use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{OrderedStep, Step, StepKind, TargetGoal};
use super::sequence::StepSequence;
use super::store::{KeyValueStore, StoreError};

pub const DEFAULT_SESSION_KEY: &str = "roadmap_session";

/// Persisted shape of an in-progress roadmap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDocument {
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub target_goal: Option<TargetGoal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionDocument {
    fn from_sequence(sequence: &StepSequence) -> Self {
        Self {
            steps: sequence.steps().to_vec(),
            target_goal: sequence.target_goal().cloned(),
            updated_at: Some(Utc::now()),
        }
    }

    fn into_sequence(self) -> StepSequence {
        StepSequence::from_parts(self.steps, self.target_goal)
    }
}

/// Carries one roadmap session across process restarts.
///
/// Reads fail open: a missing, unreadable, or malformed document yields an
/// empty sequence rather than an error.
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_SESSION_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load(&self) -> StepSequence {
        let bytes = match self.store.get(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return StepSequence::new(),
            Err(err) => {
                warn!(key = %self.key, error = %err, "roadmap session unreadable; starting empty");
                return StepSequence::new();
            }
        };

        match serde_json::from_slice::<SessionDocument>(&bytes) {
            Ok(document) => {
                debug!(key = %self.key, steps = document.steps.len(), "roadmap session restored");
                document.into_sequence()
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "roadmap session malformed; starting empty");
                StepSequence::new()
            }
        }
    }

    /// Write steps and goal as a single document, replacing any previous one.
    pub fn commit(&self, sequence: &StepSequence) -> Result<(), StoreError> {
        let document = SessionDocument::from_sequence(sequence);
        let bytes = serde_json::to_vec(&document)
            .map_err(|err| StoreError::Unavailable(format!("encode session: {err}")))?;
        self.store.set(&self.key, &bytes)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key)
    }
}

/// Error raised by the roadmap session facade.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{}", incomplete_message(.missing_steps, .missing_goal))]
    Incomplete {
        missing_steps: bool,
        missing_goal: bool,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn incomplete_message(missing_steps: &bool, missing_goal: &bool) -> &'static str {
    match (*missing_steps, *missing_goal) {
        (true, true) => "add at least one roadmap step and choose a target goal before saving",
        (true, false) => "add at least one roadmap step before saving",
        _ => "choose a target goal before saving",
    }
}

/// Current roadmap as presented to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoadmapView {
    pub steps: Vec<OrderedStep>,
    pub target_goal: Option<TargetGoal>,
    pub valid: bool,
}

/// A completed roadmap handed off by a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedRoadmap {
    pub steps: Vec<OrderedStep>,
    pub target_goal: TargetGoal,
    pub saved_at: DateTime<Utc>,
}

/// Sequence plus store, committing after every effective mutation.
#[derive(Debug)]
pub struct RoadmapSession<S> {
    store: SessionStore<S>,
    sequence: StepSequence,
}

impl<S: KeyValueStore> RoadmapSession<S> {
    /// Load the persisted roadmap. A cleared or missing document opens as a
    /// fresh session, so teardown after `save`/`reset` does not outlive the
    /// process.
    pub fn open(store: SessionStore<S>) -> Self {
        let sequence = store.load();
        Self { store, sequence }
    }

    pub fn sequence(&self) -> &StepSequence {
        &self.sequence
    }

    pub fn append(&mut self, step: Step) -> Result<(), SessionError> {
        self.transact(|sequence| {
            sequence.append(step);
            ((), true)
        })
    }

    pub fn remove_all_of_kind(&mut self, kind: StepKind) -> Result<usize, SessionError> {
        self.transact(|sequence| {
            let removed = sequence.remove_all_of_kind(kind);
            (removed, removed > 0)
        })
    }

    pub fn remove_from_kind(&mut self, kind: StepKind) -> Result<usize, SessionError> {
        self.transact(|sequence| {
            let removed = sequence.remove_from_kind(kind);
            (removed, removed > 0)
        })
    }

    pub fn insert_before_last_of_kind(
        &mut self,
        anchor: StepKind,
        step: Step,
    ) -> Result<Option<usize>, SessionError> {
        self.transact(|sequence| {
            let position = sequence.insert_before_last_of_kind(anchor, step);
            (position, position.is_some())
        })
    }

    pub fn set_target_goal(&mut self, goal: TargetGoal) -> Result<(), SessionError> {
        self.transact(|sequence| {
            if sequence.is_torn_down() {
                return ((), false);
            }
            sequence.set_target_goal(goal);
            ((), true)
        })
    }

    /// Re-select a branch: drop every step of the step's kind, then append it.
    pub fn replace_kind(&mut self, step: Step) -> Result<(), SessionError> {
        self.transact(|sequence| {
            sequence.remove_all_of_kind(step.kind);
            sequence.append(step);
            ((), true)
        })
    }

    pub fn snapshot(&self) -> RoadmapView {
        RoadmapView {
            steps: self.sequence.to_ordered_list(),
            target_goal: self.sequence.target_goal().cloned(),
            valid: self.sequence.is_valid(),
        }
    }

    /// Hand off a complete roadmap and clear the session.
    pub fn save(&mut self) -> Result<SavedRoadmap, SessionError> {
        let target_goal = match (self.sequence.is_empty(), self.sequence.target_goal()) {
            (false, Some(goal)) => goal.clone(),
            (missing_steps, goal) => {
                return Err(SessionError::Incomplete {
                    missing_steps,
                    missing_goal: goal.is_none(),
                })
            }
        };

        let saved = SavedRoadmap {
            steps: self.sequence.to_ordered_list(),
            target_goal,
            saved_at: Utc::now(),
        };

        self.store.clear()?;
        self.sequence.teardown();
        info!(steps = saved.steps.len(), goal = %saved.target_goal.title, "roadmap saved");
        Ok(saved)
    }

    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.store.clear()?;
        self.sequence.teardown();
        Ok(())
    }

    /// Apply `mutate` to a copy and keep it only once the store accepts it,
    /// so a failed write leaves memory matching the persisted document.
    fn transact<T>(
        &mut self,
        mutate: impl FnOnce(&mut StepSequence) -> (T, bool),
    ) -> Result<T, SessionError> {
        let mut next = self.sequence.clone();
        let (outcome, changed) = mutate(&mut next);
        if changed {
            self.store.commit(&next)?;
            self.sequence = next;
        }
        Ok(outcome)
    }
}
