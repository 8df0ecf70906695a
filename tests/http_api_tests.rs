#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode, header},
    response::Response,
};
use rotation_tool::http_api::{self, CreatedEntry, RemovedLane};
use rotation_tool::{
    BoardMetadata, OptimizeSummary, PasteSummary, RotationBoard, ScheduleEntry, TimelineView,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let board = RotationBoard::with_sample_entries(BoardMetadata::default());
    let state = http_api::AppState::new(board);
    http_api::router(state)
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = new_router();
    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = read_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn entry_lifecycle_via_http_api() {
    let app = new_router();

    let response = send(&app, "GET", "/entries", None).await;
    let entries: Vec<ScheduleEntry> = read_json(response).await;
    assert_eq!(entries.len(), 2);

    let form = json!({
        "resource": "#3",
        "day": 2,
        "departure": "08:00:00",
        "duration_minutes": 30
    });
    let response = send(&app, "POST", "/entries", Some(form)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: CreatedEntry = read_json(response).await;
    assert_eq!(created.index, 2);
    assert_eq!(created.entry.label, "ICN-LAX");
    assert_eq!(created.entry.color, "#90EE90");

    let response = send(&app, "POST", "/entries/2/duplicate", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let copy: CreatedEntry = read_json(response).await;
    assert_eq!(copy.index, 3);
    assert_eq!(copy.entry.label, "ICN-LAX (Copy)");

    let response = send(&app, "DELETE", "/entries/0", None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", "/entries", None).await;
    let entries: Vec<ScheduleEntry> = read_json(response).await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].label, "EWR");
}

#[tokio::test]
async fn invalid_form_and_missing_entry_map_to_client_errors() {
    let app = new_router();

    let form = json!({ "resource": "#3", "day": 9, "departure": "08:00:00" });
    let response = send(&app, "POST", "/entries", Some(form)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = read_json(response).await;
    assert_eq!(body["error"], "invalid_request");

    let response = send(&app, "DELETE", "/entries/42", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = read_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn lane_endpoints_add_and_remove() {
    let app = new_router();

    let response = send(&app, "POST", "/lanes", Some(json!({ "name": "Spare" }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let lanes: Vec<String> = read_json(response).await;
    assert_eq!(lanes.last().map(String::as_str), Some("Spare"));

    let response = send(&app, "POST", "/lanes", Some(json!({ "name": "Spare" }))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, "DELETE", "/lanes/%231", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let removed: RemovedLane = read_json(response).await;
    assert_eq!(removed.lane, "#1");
    assert_eq!(removed.removed_entries, 1);

    let response = send(&app, "GET", "/lanes", None).await;
    let lanes: Vec<String> = read_json(response).await;
    assert!(!lanes.contains(&"#1".to_string()));
}

#[tokio::test]
async fn optimize_returns_summary() {
    let app = new_router();
    let response = send(&app, "POST", "/optimize", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary: OptimizeSummary = read_json(response).await;
    assert_eq!(summary.entry_count, 2);
    assert_eq!(summary.lane_count, 2);
    assert_eq!(summary.peak_overlap, 2);
}

#[tokio::test]
async fn paste_replaces_entries_and_rejects_garbage() {
    let app = new_router();

    let payload = json!([
        {"Resource": "#5", "Start_ISO": "2024-01-04T06:00:00", "End_ISO": "2024-01-04T09:00:00", "Label": "NRT", "Color": "#FFFFE0"},
        {"Resource": "Ghost", "Start_ISO": "2024-01-04T06:00:00", "End_ISO": "2024-01-04T09:00:00", "Label": "SFO", "Color": "#FFFFE0"}
    ]);
    let response = send(&app, "POST", "/paste", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary: PasteSummary = read_json(response).await;
    assert_eq!(summary.kept, 1);
    assert_eq!(summary.dropped_resources, vec!["Ghost".to_string()]);

    let response = send(&app, "POST", "/paste", Some(json!({ "rows": [] }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/entries", None).await;
    let entries: Vec<ScheduleEntry> = read_json(response).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "NRT");
}

#[tokio::test]
async fn metadata_update_validates_input() {
    let app = new_router();

    let update = json!({ "board_name": "Summer Block", "base_date": "2024-06-03", "base_lane_count": 4 });
    let response = send(&app, "PUT", "/metadata", Some(update)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let metadata: BoardMetadata = read_json(response).await;
    assert_eq!(metadata.board_name, "Summer Block");

    let response = send(&app, "PUT", "/metadata", Some(json!({ "board_name": "", "base_date": "2024-06-03" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let oversized = json!({ "board_name": "Summer Block", "base_date": "2024-06-03", "base_lane_count": 1_000_000_000_000u64 });
    let response = send(&app, "PUT", "/metadata", Some(oversized)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/metadata", None).await;
    let metadata: BoardMetadata = read_json(response).await;
    assert_eq!(metadata.base_lane_count, 4);
}

#[tokio::test]
async fn timeline_and_export_reflect_board() {
    let app = new_router();

    let response = send(&app, "GET", "/timeline", None).await;
    let view: TimelineView = read_json(response).await;
    assert_eq!(view.groups.len(), 8);
    assert_eq!(view.items.len(), 2);

    let response = send(&app, "GET", "/export", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("Resource,Start_D,End_D,Label,Color,Start,End"));
    assert!(text.contains("D1 2155"));
}
