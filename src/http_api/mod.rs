use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::persistence::write_board_csv;
use crate::{
    BoardError, BoardMetadata, NewEntry, OptimizeSummary, PasteSummary, RotationBoard,
    ScheduleEntry, TimelineView,
};

/// Environment variable holding the bind address.
pub const ADDR_ENV_VAR: &str = "ROTATION_TOOL_HTTP_ADDR";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone)]
pub struct AppState {
    board: Arc<RwLock<RotationBoard>>,
}

impl AppState {
    pub fn new(board: RotationBoard) -> Self {
        Self {
            board: Arc::new(RwLock::new(board)),
        }
    }

    pub fn with_shared(board: Arc<RwLock<RotationBoard>>) -> Self {
        Self { board }
    }

    fn board(&self) -> Arc<RwLock<RotationBoard>> {
        self.board.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl From<BoardError> for ApiError {
    fn from(value: BoardError) -> Self {
        match value {
            BoardError::EntryNotFound(_) => ApiError::NotFound(value.to_string()),
            other => ApiError::Invalid(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedEntry {
    pub index: usize,
    pub entry: ScheduleEntry,
}

#[derive(Debug, Deserialize)]
struct LanePayload {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedLane {
    pub lane: String,
    pub removed_entries: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metadata", get(get_metadata).put(update_metadata))
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/:index", delete(delete_entry))
        .route("/entries/:index/duplicate", post(duplicate_entry))
        .route("/lanes", get(list_lanes).post(add_lane))
        .route("/lanes/:name", delete(remove_lane))
        .route("/optimize", post(optimize))
        .route("/paste", post(paste))
        .route("/timeline", get(timeline))
        .route("/export", get(export_csv))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, board: RotationBoard) -> std::io::Result<()> {
    let state = AppState::new(board);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_metadata(State(state): State<AppState>) -> Json<BoardMetadata> {
    let board = state.board();
    let metadata = board.read().metadata().clone();
    Json(metadata)
}

async fn update_metadata(
    State(state): State<AppState>,
    Json(metadata): Json<BoardMetadata>,
) -> Result<Json<BoardMetadata>, ApiError> {
    let board = state.board();
    let mut guard = board.write();
    guard.set_metadata(metadata)?;
    Ok(Json(guard.metadata().clone()))
}

async fn list_entries(State(state): State<AppState>) -> Json<Vec<ScheduleEntry>> {
    let board = state.board();
    let entries = board.read().entries().to_vec();
    Json(entries)
}

async fn create_entry(
    State(state): State<AppState>,
    Json(form): Json<NewEntry>,
) -> Result<(StatusCode, Json<CreatedEntry>), ApiError> {
    let board = state.board();
    let mut guard = board.write();
    let index = guard.add_entry(form)?;
    let entry = guard
        .entry(index)
        .cloned()
        .ok_or_else(|| ApiError::Internal("entry missing after creation".into()))?;
    Ok((StatusCode::CREATED, Json(CreatedEntry { index, entry })))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<StatusCode, ApiError> {
    let board = state.board();
    board.write().delete_entry(index)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn duplicate_entry(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<(StatusCode, Json<CreatedEntry>), ApiError> {
    let board = state.board();
    let mut guard = board.write();
    let copy_index = guard.duplicate_entry(index)?;
    let entry = guard
        .entry(copy_index)
        .cloned()
        .ok_or_else(|| ApiError::Internal("entry missing after duplication".into()))?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedEntry {
            index: copy_index,
            entry,
        }),
    ))
}

async fn list_lanes(State(state): State<AppState>) -> Json<Vec<String>> {
    let board = state.board();
    let lanes = board.read().visible_lanes();
    Json(lanes)
}

async fn add_lane(
    State(state): State<AppState>,
    Json(payload): Json<LanePayload>,
) -> Result<Json<Vec<String>>, ApiError> {
    let board = state.board();
    let mut guard = board.write();
    if !guard.add_lane(&payload.name)? {
        return Err(ApiError::Conflict(format!(
            "lane '{}' already exists",
            payload.name
        )));
    }
    Ok(Json(guard.visible_lanes()))
}

async fn remove_lane(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RemovedLane>, ApiError> {
    let board = state.board();
    let removed_entries = board.write().remove_lane(&name)?;
    Ok(Json(RemovedLane {
        lane: name,
        removed_entries,
    }))
}

async fn optimize(State(state): State<AppState>) -> Result<Json<OptimizeSummary>, ApiError> {
    let board = state.board();
    let summary = board.write().optimize()?;
    info!(lanes = summary.lane_count, "optimize requested over http");
    Ok(Json(summary))
}

async fn paste(
    State(state): State<AppState>,
    payload: String,
) -> Result<Json<PasteSummary>, ApiError> {
    let board = state.board();
    let summary = board.write().apply_paste(&payload)?;
    Ok(Json(summary))
}

async fn timeline(State(state): State<AppState>) -> Json<TimelineView> {
    let board = state.board();
    let view = board.read().timeline();
    Json(view)
}

async fn export_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let board = state.board();
    let mut buffer = Vec::new();
    write_board_csv(&board.read(), &mut buffer)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    let body = String::from_utf8(buffer).map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], body).into_response())
}
