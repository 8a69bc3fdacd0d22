use super::common::*;
use crate::roadmap::domain::StepKind;
use crate::roadmap::session::{
    RoadmapSession, SessionDocument, SessionError, SessionStore, DEFAULT_SESSION_KEY,
};
use crate::roadmap::store::{InMemoryKeyValueStore, KeyValueStore, StoreError};

#[test]
fn session_is_created_lazily_on_first_mutation() {
    let (mut session, store) = memory_session();
    assert!(!store.contains(DEFAULT_SESSION_KEY));

    session
        .remove_all_of_kind(StepKind::Exam)
        .expect("no-op removal succeeds");
    assert!(
        !store.contains(DEFAULT_SESSION_KEY),
        "no-op removals should not create a document"
    );

    session.append(level(10, "Class 10")).expect("append commits");
    assert!(store.contains(DEFAULT_SESSION_KEY));
}

#[test]
fn committed_session_survives_reopen() {
    let (mut session, store) = memory_session();
    session.append(level(10, "Class 10")).expect("append");
    session.append(stream(1, "Science")).expect("append");
    session
        .insert_before_last_of_kind(StepKind::Stream, exam(30, "NTSE"))
        .expect("insert");
    session.set_target_goal(goal()).expect("goal");

    let reopened = RoadmapSession::open(SessionStore::new(store));
    let view = reopened.snapshot();
    assert_eq!(titles(&view.steps), vec!["Class 10", "NTSE", "Science"]);
    assert_eq!(view.target_goal, Some(goal()));
    assert!(view.valid);
}

#[test]
fn malformed_document_loads_as_empty_session() {
    let store = InMemoryKeyValueStore::new();
    store
        .set(DEFAULT_SESSION_KEY, b"{\"steps\": [{\"kind\": \"wizard\"}]")
        .expect("seed corrupt document");

    let session = RoadmapSession::open(SessionStore::new(store));
    assert!(session.sequence().is_empty());
    assert!(session.sequence().target_goal().is_none());
}

#[test]
fn unreadable_store_loads_as_empty_session() {
    let session = RoadmapSession::open(SessionStore::new(UnreadableStore));
    assert!(session.sequence().is_empty());
}

#[test]
fn document_without_goal_field_is_accepted() {
    let store = InMemoryKeyValueStore::new();
    store
        .set(
            "custom",
            br#"{"steps":[{"kind":"stream","ref_id":4,"title":"Commerce"}]}"#,
        )
        .expect("seed document");

    let session = RoadmapSession::open(SessionStore::with_key(store, "custom"));
    assert_eq!(session.sequence().len(), 1);
    assert!(session.sequence().target_goal().is_none());
}

#[test]
fn committed_document_has_single_key_shape() {
    let (mut session, store) = memory_session();
    session.append(stream(1, "Science")).expect("append");
    session.set_target_goal(goal()).expect("goal");

    let bytes = store
        .get(DEFAULT_SESSION_KEY)
        .expect("read")
        .expect("document present");
    let document: SessionDocument = serde_json::from_slice(&bytes).expect("valid json");
    assert_eq!(document.steps.len(), 1);
    assert_eq!(document.target_goal, Some(goal()));
    assert!(document.updated_at.is_some());
}

#[test]
fn save_rejects_steps_without_goal() {
    let (mut session, store) = memory_session();
    session.append(level(10, "Class 10")).expect("append");
    session.append(stream(1, "Science")).expect("append");

    match session.save() {
        Err(SessionError::Incomplete {
            missing_steps: false,
            missing_goal: true,
        }) => {}
        other => panic!("expected incomplete session, got {other:?}"),
    }
    assert!(store.contains(DEFAULT_SESSION_KEY), "rejected save keeps progress");
    assert_eq!(session.sequence().len(), 2);
}

#[test]
fn save_rejects_goal_without_steps() {
    let (mut session, _) = memory_session();
    session.set_target_goal(goal()).expect("goal");

    let err = session.save().expect_err("empty roadmap cannot be saved");
    assert_eq!(
        err.to_string(),
        "add at least one roadmap step before saving"
    );
}

#[test]
fn save_hands_off_roadmap_and_clears_session() {
    let (mut session, store) = memory_session();
    session.append(level(10, "Class 10")).expect("append");
    session.append(stream(1, "Science")).expect("append");
    session.set_target_goal(goal()).expect("goal");

    let saved = session.save().expect("complete roadmap saves");
    assert_eq!(titles(&saved.steps), vec!["Class 10", "Science"]);
    assert_eq!(saved.target_goal, goal());
    assert!(!store.contains(DEFAULT_SESSION_KEY));
    assert!(session.sequence().is_torn_down());

    session.set_target_goal(goal()).expect("ignored");
    assert!(
        !store.contains(DEFAULT_SESSION_KEY),
        "torn down session ignores goal updates"
    );

    session.append(level(12, "Class 12")).expect("append revives");
    assert!(store.contains(DEFAULT_SESSION_KEY));
    assert!(session.sequence().target_goal().is_none());
}

#[test]
fn reset_discards_persisted_progress() {
    let (mut session, store) = memory_session();
    session.append(stream(1, "Science")).expect("append");
    session.reset().expect("reset");

    assert!(!store.contains(DEFAULT_SESSION_KEY));
    assert!(session.snapshot().steps.is_empty());
    let reopened = RoadmapSession::open(SessionStore::new(store));
    assert!(reopened.sequence().is_empty());
}

#[test]
fn replace_kind_swaps_previous_selection() {
    let (mut session, _) = memory_session();
    session.append(level(10, "Class 10")).expect("append");
    session.append(stream(1, "Science")).expect("append");
    session.append(exam(30, "JEE Main")).expect("append");

    session.replace_kind(stream(2, "Commerce")).expect("replace");

    let view = session.snapshot();
    assert_eq!(titles(&view.steps), vec!["Class 10", "JEE Main", "Commerce"]);
    assert_contiguous(&view.steps);
}

#[test]
fn write_failures_surface_from_mutations() {
    let mut session = RoadmapSession::open(SessionStore::new(ReadOnlyStore));

    match session.append(stream(1, "Science")) {
        Err(SessionError::Store(StoreError::Unavailable(reason))) => {
            assert_eq!(reason, "read-only");
        }
        other => panic!("expected store failure, got {other:?}"),
    }
}

#[test]
fn failed_append_leaves_memory_untouched() {
    let mut session = RoadmapSession::open(SessionStore::new(ReadOnlyStore));

    assert!(session.append(stream(1, "Science")).is_err());

    assert_eq!(session.sequence().len(), 0);
    assert!(session.snapshot().steps.is_empty());
}

#[test]
fn failed_writes_roll_back_every_mutation() {
    let store = SwitchableStore::default();
    let mut session = RoadmapSession::open(SessionStore::new(store.clone()));
    session.append(level(10, "Class 10")).expect("append");
    session.append(stream(1, "Science")).expect("append");
    let committed = session.sequence().clone();

    store.set_read_only(true);
    assert!(session.append(exam(30, "JEE Main")).is_err());
    assert!(session.remove_all_of_kind(StepKind::Stream).is_err());
    assert!(session.remove_from_kind(StepKind::EducationLevel).is_err());
    assert!(session
        .insert_before_last_of_kind(StepKind::Stream, exam(31, "NEET"))
        .is_err());
    assert!(session.set_target_goal(goal()).is_err());
    assert!(session.replace_kind(stream(2, "Commerce")).is_err());
    assert!(session.save().is_err());

    assert_eq!(session.sequence(), &committed);
    assert!(!session.sequence().is_torn_down());

    store.set_read_only(false);
    let reopened = RoadmapSession::open(SessionStore::new(store));
    assert_eq!(titles(&reopened.snapshot().steps), vec!["Class 10", "Science"]);
}

#[test]
fn reopening_after_save_starts_a_fresh_session() {
    let (mut session, store) = memory_session();
    session.append(stream(1, "Science")).expect("append");
    session.set_target_goal(goal()).expect("goal");
    session.save().expect("save");
    session.set_target_goal(goal()).expect("ignored after teardown");
    assert!(!store.contains(DEFAULT_SESSION_KEY));

    let mut reopened = RoadmapSession::open(SessionStore::new(store.clone()));
    assert!(!reopened.sequence().is_torn_down());
    reopened.set_target_goal(goal()).expect("fresh session takes a goal");

    let view = reopened.snapshot();
    assert!(view.steps.is_empty());
    assert_eq!(view.target_goal, Some(goal()));
    assert!(!view.valid);
    assert!(store.contains(DEFAULT_SESSION_KEY));
}
