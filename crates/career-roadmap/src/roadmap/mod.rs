//! Roadmap step sequencing and the persisted session that carries it across
//! screens.

pub mod domain;
pub mod router;
pub mod sequence;
pub mod session;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{OrderedStep, Step, StepKind, TargetGoal, UnknownStepKind};
pub use router::{roadmap_router, InsertBeforeRequest, SharedRoadmapSession};
pub use sequence::StepSequence;
pub use session::{
    RoadmapSession, RoadmapView, SavedRoadmap, SessionDocument, SessionError, SessionStore,
    DEFAULT_SESSION_KEY,
};
pub use store::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, StoreError};
