use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::service::{RecommendationRequest, RecommendationService};

/// Router builder exposing the recommendation board endpoint.
pub fn recommendation_router(service: Arc<RecommendationService>) -> Router {
    Router::new()
        .route("/api/v1/recommendations", post(recommend_handler))
        .with_state(service)
}

pub(crate) async fn recommend_handler(
    State(service): State<Arc<RecommendationService>>,
    Json(request): Json<RecommendationRequest>,
) -> Response {
    match service.recommend(request).await {
        Ok(board) => (StatusCode::OK, Json(board)).into_response(),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}
