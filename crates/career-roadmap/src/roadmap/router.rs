use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Step, StepKind, TargetGoal};
use super::session::{RoadmapSession, SessionError};
use super::store::KeyValueStore;

/// Single active session shared by the request handlers.
pub type SharedRoadmapSession<S> = Arc<Mutex<RoadmapSession<S>>>;

#[derive(Debug, Deserialize)]
pub struct InsertBeforeRequest {
    pub anchor: StepKind,
    pub step: Step,
}

/// Router builder exposing the roadmap session operations.
pub fn roadmap_router<S>(session: SharedRoadmapSession<S>) -> Router
where
    S: KeyValueStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/roadmap",
            get(snapshot_handler::<S>).delete(reset_handler::<S>),
        )
        .route("/api/v1/roadmap/steps", post(append_handler::<S>))
        .route(
            "/api/v1/roadmap/steps/before-last",
            post(insert_before_handler::<S>),
        )
        .route("/api/v1/roadmap/steps/replace", post(replace_handler::<S>))
        .route(
            "/api/v1/roadmap/steps/kind/:kind",
            delete(remove_all_handler::<S>),
        )
        .route(
            "/api/v1/roadmap/steps/from/:kind",
            delete(remove_from_handler::<S>),
        )
        .route("/api/v1/roadmap/goal", put(goal_handler::<S>))
        .route("/api/v1/roadmap/save", post(save_handler::<S>))
        .with_state(session)
}

pub(crate) async fn snapshot_handler<S: KeyValueStore + 'static>(
    State(session): State<SharedRoadmapSession<S>>,
) -> Response {
    let view = session.lock().expect("session mutex poisoned").snapshot();
    (StatusCode::OK, Json(view)).into_response()
}

pub(crate) async fn append_handler<S: KeyValueStore + 'static>(
    State(session): State<SharedRoadmapSession<S>>,
    Json(step): Json<Step>,
) -> Response {
    let mut guard = session.lock().expect("session mutex poisoned");
    match guard.append(step) {
        Ok(()) => (StatusCode::CREATED, Json(guard.snapshot())).into_response(),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn insert_before_handler<S: KeyValueStore + 'static>(
    State(session): State<SharedRoadmapSession<S>>,
    Json(request): Json<InsertBeforeRequest>,
) -> Response {
    let mut guard = session.lock().expect("session mutex poisoned");
    match guard.insert_before_last_of_kind(request.anchor, request.step) {
        Ok(position) => {
            let status = if position.is_some() {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let payload = json!({ "position": position, "roadmap": guard.snapshot() });
            (status, Json(payload)).into_response()
        }
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn replace_handler<S: KeyValueStore + 'static>(
    State(session): State<SharedRoadmapSession<S>>,
    Json(step): Json<Step>,
) -> Response {
    let mut guard = session.lock().expect("session mutex poisoned");
    match guard.replace_kind(step) {
        Ok(()) => (StatusCode::OK, Json(guard.snapshot())).into_response(),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn remove_all_handler<S: KeyValueStore + 'static>(
    State(session): State<SharedRoadmapSession<S>>,
    Path(kind): Path<String>,
) -> Response {
    let kind = match kind.parse::<StepKind>() {
        Ok(kind) => kind,
        Err(err) => return unknown_kind_response(err.to_string()),
    };
    let mut guard = session.lock().expect("session mutex poisoned");
    match guard.remove_all_of_kind(kind) {
        Ok(removed) => removal_response(removed, &guard),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn remove_from_handler<S: KeyValueStore + 'static>(
    State(session): State<SharedRoadmapSession<S>>,
    Path(kind): Path<String>,
) -> Response {
    let kind = match kind.parse::<StepKind>() {
        Ok(kind) => kind,
        Err(err) => return unknown_kind_response(err.to_string()),
    };
    let mut guard = session.lock().expect("session mutex poisoned");
    match guard.remove_from_kind(kind) {
        Ok(removed) => removal_response(removed, &guard),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn goal_handler<S: KeyValueStore + 'static>(
    State(session): State<SharedRoadmapSession<S>>,
    Json(goal): Json<TargetGoal>,
) -> Response {
    let mut guard = session.lock().expect("session mutex poisoned");
    match guard.set_target_goal(goal) {
        Ok(()) => (StatusCode::OK, Json(guard.snapshot())).into_response(),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn save_handler<S: KeyValueStore + 'static>(
    State(session): State<SharedRoadmapSession<S>>,
) -> Response {
    let result = session.lock().expect("session mutex poisoned").save();
    match result {
        Ok(saved) => (StatusCode::OK, Json(saved)).into_response(),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn reset_handler<S: KeyValueStore + 'static>(
    State(session): State<SharedRoadmapSession<S>>,
) -> Response {
    let result = session.lock().expect("session mutex poisoned").reset();
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => session_error_response(err),
    }
}

fn removal_response<S: KeyValueStore>(removed: usize, session: &RoadmapSession<S>) -> Response {
    let payload = json!({ "removed": removed, "roadmap": session.snapshot() });
    (StatusCode::OK, Json(payload)).into_response()
}

fn unknown_kind_response(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn session_error_response(err: SessionError) -> Response {
    match err {
        SessionError::Incomplete {
            missing_steps,
            missing_goal,
        } => {
            let payload = json!({
                "error": err.to_string(),
                "missing_steps": missing_steps,
                "missing_goal": missing_goal,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        SessionError::Store(_) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
