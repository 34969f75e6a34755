use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tokio::task::JoinSet;

use super::domain::ReadinessInput;
use super::engine::ReadinessEngine;
use super::pillar::ReadinessScore;

/// Router builder exposing the scoring endpoints.
pub fn readiness_router(engine: Arc<ReadinessEngine>) -> Router {
    Router::new()
        .route("/api/v1/readiness", post(score_handler))
        .route("/api/v1/readiness/batch", post(batch_handler))
        .with_state(engine)
}

fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": rejection.body_text(),
    });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

pub(crate) async fn score_handler(
    State(engine): State<Arc<ReadinessEngine>>,
    payload: Result<Json<ReadinessInput>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(input)) => {
            let score = engine.score(input).await;
            (StatusCode::OK, Json(score)).into_response()
        }
        Err(rejection) => rejection_response(rejection),
    }
}

pub(crate) async fn batch_handler(
    State(engine): State<Arc<ReadinessEngine>>,
    payload: Result<Json<Vec<ReadinessInput>>, JsonRejection>,
) -> Response {
    let inputs = match payload {
        Ok(Json(inputs)) => inputs,
        Err(rejection) => return rejection_response(rejection),
    };

    let mut tasks = JoinSet::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move { (index, engine.score(input).await) });
    }

    let mut scored: Vec<Option<ReadinessScore>> = vec![None; tasks.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, score)) => scored[index] = Some(score),
            Err(err) => {
                let payload = json!({
                    "error": format!("batch scoring task failed: {err}"),
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
            }
        }
    }

    let scores: Vec<ReadinessScore> = scored.into_iter().flatten().collect();
    (StatusCode::OK, Json(scores)).into_response()
}
