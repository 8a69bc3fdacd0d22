use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::roadmap::domain::{OrderedStep, Step, StepKind, TargetGoal};
use crate::roadmap::session::{RoadmapSession, SessionStore};
use crate::roadmap::store::{InMemoryKeyValueStore, KeyValueStore, StoreError};
use crate::roadmap::{roadmap_router, StepSequence};

pub(super) fn level(ref_id: u32, title: &str) -> Step {
    Step::new(StepKind::EducationLevel, ref_id, title)
}

pub(super) fn stream(ref_id: u32, title: &str) -> Step {
    Step::new(StepKind::Stream, ref_id, title)
}

pub(super) fn exam(ref_id: u32, title: &str) -> Step {
    Step::new(StepKind::Exam, ref_id, title)
}

pub(super) fn goal() -> TargetGoal {
    TargetGoal::new(501, "Software Engineer").with_salary_range("6-18 LPA")
}

pub(super) fn sequence_of(steps: impl IntoIterator<Item = Step>) -> StepSequence {
    let mut sequence = StepSequence::new();
    for step in steps {
        sequence.append(step);
    }
    sequence
}

pub(super) fn titles(list: &[OrderedStep]) -> Vec<&str> {
    list.iter().map(|entry| entry.step.title.as_str()).collect()
}

pub(super) fn assert_contiguous(list: &[OrderedStep]) {
    for (index, entry) in list.iter().enumerate() {
        assert_eq!(entry.position, index, "positions must be zero-based and gap free");
    }
}

pub(super) fn memory_session() -> (RoadmapSession<InMemoryKeyValueStore>, InMemoryKeyValueStore) {
    let store = InMemoryKeyValueStore::new();
    let session = RoadmapSession::open(SessionStore::new(store.clone()));
    (session, store)
}

/// Store that accepts reads but rejects every write.
#[derive(Debug, Default)]
pub(super) struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only".to_string()))
    }
}

/// In-memory store whose writes can be switched off part way through a test.
#[derive(Debug, Default, Clone)]
pub(super) struct SwitchableStore {
    inner: InMemoryKeyValueStore,
    read_only: Arc<AtomicBool>,
}

impl SwitchableStore {
    pub(super) fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("read-only".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for SwitchableStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.remove(key)
    }
}

/// Store whose reads always fail.
#[derive(Debug, Default)]
pub(super) struct UnreadableStore;

impl KeyValueStore for UnreadableStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(super) fn router_with_store(store: InMemoryKeyValueStore) -> axum::Router {
    let session = RoadmapSession::open(SessionStore::new(store));
    roadmap_router(Arc::new(Mutex::new(session)))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
