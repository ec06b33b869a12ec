//! HTTP routes.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wappenquiz_domain::{HistoryEntry, ImageId, Municipality, Stats};

use super::player_session::PlayerSession;
use crate::app::App;
use crate::use_cases::{DatasetError, ImageError, PuzzleError};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/puzzle", get(get_puzzle))
        .route("/api/submit", post(submit_answer))
        .route("/api/reset", post(reset_player))
        .route("/api/municipalities", get(list_municipalities))
        .route("/image/{id}", get(proxy_image))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Puzzle
// =============================================================================

#[derive(Debug, Serialize)]
struct PuzzleResponse {
    image_url: String,
    image_desc: String,
    options: Vec<String>,
    stats: Stats,
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    is_correct: bool,
    correct_answer: String,
    stats: Stats,
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    status: &'static str,
    message: &'static str,
}

async fn get_puzzle(State(app): State<Arc<App>>, session: PlayerSession) -> Response {
    let result = app.use_cases.puzzle.get_puzzle(&session.key).await;
    let response = match result {
        Ok(issued) => Json(PuzzleResponse {
            image_url: issued.puzzle.emblem_ref().to_string(),
            image_desc: issued.puzzle.description().to_string(),
            options: issued.puzzle.options().to_vec(),
            stats: issued.stats,
            history: issued.history,
        })
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    };
    session.respond(response)
}

async fn submit_answer(
    State(app): State<Arc<App>>,
    session: PlayerSession,
    Json(request): Json<SubmitRequest>,
) -> Response {
    let answer = request.answer.unwrap_or_default();
    let result = app.use_cases.puzzle.submit(&session.key, &answer).await;
    let response = match result {
        Ok(result) => Json(SubmitResponse {
            is_correct: result.outcome.is_correct,
            correct_answer: result.outcome.correct_name,
            stats: result.stats,
            history: result.history,
        })
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    };
    session.respond(response)
}

async fn reset_player(State(app): State<Arc<App>>, session: PlayerSession) -> Response {
    let response = match app.use_cases.puzzle.reset(&session.key).await {
        Ok(()) => Json(ResetResponse {
            status: "ok",
            message: "Player state reset",
        })
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    };
    session.respond(response)
}

// =============================================================================
// Dataset & Images
// =============================================================================

async fn list_municipalities(
    State(app): State<Arc<App>>,
) -> Result<Json<Vec<Municipality>>, ApiError> {
    let snapshot = app.use_cases.dataset.get_dataset().await?;
    Ok(Json(snapshot.entities().to_vec()))
}

async fn proxy_image(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: ImageId = id.parse().map_err(|_| ApiError::NotFound)?;
    let image = app.use_cases.images.proxy(&id).await?;
    Ok(([(header::CONTENT_TYPE, image.content_type)], image.bytes).into_response())
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    BadGateway(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<PuzzleError> for ApiError {
    fn from(e: PuzzleError) -> Self {
        match e {
            PuzzleError::NoPuzzlePending => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<DatasetError> for ApiError {
    fn from(e: DatasetError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<ImageError> for ApiError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::UnknownImageId => ApiError::NotFound,
            ImageError::Fetch(e) => ApiError::BadGateway(format!("Failed to load image: {e}")),
        }
    }
}
