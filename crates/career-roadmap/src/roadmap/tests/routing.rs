use super::common::*;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::roadmap::session::DEFAULT_SESSION_KEY;
use crate::roadmap::store::InMemoryKeyValueStore;

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
        .expect("request builds")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn append_route_returns_ordered_roadmap() {
    let router = router_with_store(InMemoryKeyValueStore::new());

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/roadmap/steps",
            json!({ "kind": "education_level", "ref_id": 10, "title": "Class 10" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["steps"][0]["position"], 0);
    assert_eq!(payload["steps"][0]["kind"], "education_level");
    assert_eq!(payload["valid"], false);
}

#[tokio::test]
async fn insert_before_route_reports_position() {
    let store = InMemoryKeyValueStore::new();
    let router = router_with_store(store.clone());

    for body in [
        json!({ "kind": "stream", "ref_id": 1, "title": "A" }),
        json!({ "kind": "stream", "ref_id": 2, "title": "B" }),
    ] {
        let response = router
            .clone()
            .oneshot(json_request(Method::POST, "/api/v1/roadmap/steps", body))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/roadmap/steps/before-last",
            json!({
                "anchor": "stream",
                "step": { "kind": "exam", "ref_id": 30, "title": "X" }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["position"], 1);
    let titles: Vec<&str> = payload["roadmap"]["steps"]
        .as_array()
        .expect("steps array")
        .iter()
        .filter_map(|step| step["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["A", "X", "B"]);
    assert!(store.contains(DEFAULT_SESSION_KEY));
}

#[tokio::test]
async fn replace_route_swaps_the_stream_choice() {
    let router = router_with_store(InMemoryKeyValueStore::new());
    for body in [
        json!({ "kind": "education_level", "ref_id": 10, "title": "L" }),
        json!({ "kind": "stream", "ref_id": 1, "title": "Commerce" }),
    ] {
        router
            .clone()
            .oneshot(json_request(Method::POST, "/api/v1/roadmap/steps", body))
            .await
            .expect("route executes");
    }

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/roadmap/steps/replace",
            json!({ "kind": "stream", "ref_id": 4, "title": "Humanities" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let steps = payload["steps"].as_array().expect("steps array");
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1]["title"], "Humanities");
    assert_eq!(steps[1]["position"], 1);
}

#[tokio::test]
async fn remove_routes_reject_unknown_kinds() {
    let router = router_with_store(InMemoryKeyValueStore::new());

    let response = router
        .oneshot(empty_request(
            Method::DELETE,
            "/api/v1/roadmap/steps/kind/astronaut",
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "unknown step kind 'astronaut'");
}

#[tokio::test]
async fn remove_from_route_truncates_suffix() {
    let router = router_with_store(InMemoryKeyValueStore::new());
    for body in [
        json!({ "kind": "education_level", "ref_id": 10, "title": "L" }),
        json!({ "kind": "stream", "ref_id": 1, "title": "S" }),
        json!({ "kind": "exam", "ref_id": 30, "title": "E" }),
        json!({ "kind": "stream", "ref_id": 2, "title": "S2" }),
    ] {
        router
            .clone()
            .oneshot(json_request(Method::POST, "/api/v1/roadmap/steps", body))
            .await
            .expect("route executes");
    }

    let response = router
        .oneshot(empty_request(Method::DELETE, "/api/v1/roadmap/steps/from/exam"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["removed"], 2);
    assert_eq!(payload["roadmap"]["steps"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn save_route_returns_unprocessable_without_goal() {
    let router = router_with_store(InMemoryKeyValueStore::new());
    router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/roadmap/steps",
            json!({ "kind": "stream", "ref_id": 1, "title": "Science" }),
        ))
        .await
        .expect("route executes");

    let response = router
        .oneshot(empty_request(Method::POST, "/api/v1/roadmap/save"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["missing_goal"], true);
    assert_eq!(payload["missing_steps"], false);
    assert_eq!(payload["error"], "choose a target goal before saving");
}

#[tokio::test]
async fn save_route_clears_completed_session() {
    let store = InMemoryKeyValueStore::new();
    let router = router_with_store(store.clone());
    router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/roadmap/steps",
            json!({ "kind": "stream", "ref_id": 1, "title": "Science" }),
        ))
        .await
        .expect("route executes");
    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/roadmap/goal",
            json!({ "ref_id": 501, "title": "Software Engineer", "salary_range": "6-18 LPA" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["valid"], true);

    let response = router
        .clone()
        .oneshot(empty_request(Method::POST, "/api/v1/roadmap/save"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["target_goal"]["title"], "Software Engineer");
    assert!(payload.get("saved_at").is_some());
    assert!(!store.contains(DEFAULT_SESSION_KEY));

    let response = router
        .oneshot(empty_request(Method::GET, "/api/v1/roadmap"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["steps"].as_array().map(Vec::len), Some(0));
    assert_eq!(payload["target_goal"], Value::Null);
}

#[tokio::test]
async fn reset_route_returns_no_content() {
    let store = InMemoryKeyValueStore::new();
    let router = router_with_store(store.clone());
    router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/roadmap/steps",
            json!({ "kind": "job", "ref_id": 9, "title": "Intern" }),
        ))
        .await
        .expect("route executes");

    let response = router
        .oneshot(empty_request(Method::DELETE, "/api/v1/roadmap"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!store.contains(DEFAULT_SESSION_KEY));
}

#[tokio::test]
async fn insert_after_reset_is_ignored_without_created_status() {
    let store = InMemoryKeyValueStore::new();
    let router = router_with_store(store.clone());
    router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/roadmap/steps",
            json!({ "kind": "stream", "ref_id": 1, "title": "Science" }),
        ))
        .await
        .expect("route executes");
    let response = router
        .clone()
        .oneshot(empty_request(Method::DELETE, "/api/v1/roadmap"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/roadmap/steps/before-last",
            json!({
                "anchor": "stream",
                "step": { "kind": "exam", "ref_id": 30, "title": "JEE Main" }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["position"], Value::Null);
    assert_eq!(payload["roadmap"]["steps"].as_array().map(Vec::len), Some(0));
    assert!(!store.contains(DEFAULT_SESSION_KEY));
}
