use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const MOCK_ACCESS_TOKEN: &str = "mock_access_token";

// --- Data Structures (aligning with the v3.4 assignment resource) ---
#[derive(Debug, Clone, Serialize)]
struct MockAssignment {
    id: i64,
    assigned_by: MockUser,
    date_assigned: String,
    date_resolved: Option<String>,
    events: Vec<serde_json::Value>,
    assigned_to: MockUser,
    resolved_by: Option<MockUser>,
    outcome: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
struct MockUser {
    id: i64,
    username: String,
}

#[derive(Debug, Clone, Serialize)]
struct MockNote {
    id: i64,
    date_created: String,
    created_by: String,
    note: String,
}

#[derive(Deserialize, Debug)]
struct MockAssignmentInput {
    assign_to_user_id: i64,
    assign_host_id: Option<i64>,
    assign_account_id: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct MockNoteInput {
    note: String,
}

#[derive(Deserialize, Debug)]
struct MockDetectionUpdate {
    #[serde(rename = "detectionIdList")]
    detection_id_list: Vec<i64>,
    mark_as_fixed: String,
}

struct MockData {
    assignments: BTreeMap<i64, MockAssignment>,
    notes: HashMap<i64, Vec<MockNote>>,
    fixed_detections: HashMap<i64, bool>,
    next_assignment_id: i64,
    next_note_id: i64,
}

fn user(id: i64) -> MockUser {
    MockUser {
        id,
        username: format!("analyst{}", id),
    }
}

static MOCK_DATA: Lazy<Mutex<MockData>> = Lazy::new(|| {
    let mut assignments = BTreeMap::new();

    assignments.insert(
        1,
        MockAssignment {
            id: 1,
            assigned_by: user(1),
            date_assigned: "2024-03-01T10:00:00Z".to_string(),
            date_resolved: None,
            events: vec![],
            assigned_to: user(7),
            resolved_by: None,
            outcome: None,
            host_id: Some(10),
            account_id: None,
        },
    );
    assignments.insert(
        2,
        MockAssignment {
            id: 2,
            assigned_by: user(1),
            date_assigned: "2024-03-02T09:30:00Z".to_string(),
            date_resolved: None,
            events: vec![],
            assigned_to: user(8),
            resolved_by: None,
            outcome: None,
            host_id: None,
            account_id: Some(20),
        },
    );

    Mutex::new(MockData {
        assignments,
        notes: HashMap::new(),
        fixed_detections: HashMap::new(),
        next_assignment_id: 100,
        next_note_id: 1,
    })
});

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", MOCK_ACCESS_TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Authentication credentials were not provided."})),
    )
        .into_response()
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn issue_token(headers: HeaderMap, body: String) -> impl IntoResponse {
    info!("POST /oauth2/token");
    if !headers.contains_key("authorization") || !body.contains("grant_type=client_credentials") {
        warn!("Rejecting token request: {}", body);
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_client"})),
        )
            .into_response();
    }
    (
        StatusCode::OK,
        Json(json!({"access_token": MOCK_ACCESS_TOKEN, "token_type": "Bearer", "expires_in": 3600})),
    )
        .into_response()
}

fn id_set(raw: Option<&String>) -> Option<Vec<i64>> {
    raw.map(|s| s.split(',').filter_map(|id| id.trim().parse().ok()).collect())
}

async fn list_assignments(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    info!("GET /api/v3.4/assignments with params: {:?}", params);
    if !authorized(&headers) {
        return unauthorized();
    }

    let resolved = params.get("resolved").map(|v| v == "true");
    let assignee = params.get("assignees").and_then(|v| v.parse::<i64>().ok());
    let hosts = id_set(params.get("hosts"));
    let accounts = id_set(params.get("accounts"));

    let data = MOCK_DATA.lock().unwrap();
    let results: Vec<MockAssignment> = data
        .assignments
        .values()
        .filter(|a| resolved.map_or(true, |r| a.date_resolved.is_some() == r))
        .filter(|a| assignee.map_or(true, |u| a.assigned_to.id == u))
        .filter(|a| {
            hosts
                .as_ref()
                .map_or(true, |ids| a.host_id.is_some_and(|h| ids.contains(&h)))
        })
        .filter(|a| {
            accounts
                .as_ref()
                .map_or(true, |ids| a.account_id.is_some_and(|h| ids.contains(&h)))
        })
        .cloned()
        .collect();

    (
        StatusCode::OK,
        Json(json!({"count": results.len(), "next": null, "previous": null, "results": results})),
    )
        .into_response()
}

async fn get_assignment(headers: HeaderMap, Path(id): Path<i64>) -> axum::response::Response {
    info!("GET /api/v3.4/assignments/{}", id);
    if !authorized(&headers) {
        return unauthorized();
    }

    let data = MOCK_DATA.lock().unwrap();
    match data.assignments.get(&id) {
        Some(assignment) => {
            (StatusCode::OK, Json(json!({"assignment": assignment}))).into_response()
        }
        None => {
            warn!("Assignment not found: {}", id);
            (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
        }
    }
}

async fn create_assignment(
    headers: HeaderMap,
    Json(payload): Json<MockAssignmentInput>,
) -> axum::response::Response {
    info!("POST /api/v3.4/assignments with payload: {:?}", payload);
    if !authorized(&headers) {
        return unauthorized();
    }
    if payload.assign_host_id.is_none() == payload.assign_account_id.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"errors": [{"title": "Exactly one of assign_host_id or assign_account_id is required"}]})),
        )
            .into_response();
    }

    let mut data = MOCK_DATA.lock().unwrap();
    let id = data.next_assignment_id;
    data.next_assignment_id += 1;

    let assignment = MockAssignment {
        id,
        assigned_by: user(1),
        date_assigned: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        date_resolved: None,
        events: vec![],
        assigned_to: user(payload.assign_to_user_id),
        resolved_by: None,
        outcome: None,
        host_id: payload.assign_host_id,
        account_id: payload.assign_account_id,
    };
    data.assignments.insert(id, assignment.clone());

    info!("Created assignment {}", id);
    (StatusCode::CREATED, Json(json!({"assignment": assignment}))).into_response()
}

async fn delete_assignment(headers: HeaderMap, Path(id): Path<i64>) -> axum::response::Response {
    info!("DELETE /api/v3.4/assignments/{}", id);
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut data = MOCK_DATA.lock().unwrap();
    match data.assignments.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => {
            warn!("Assignment not found for deletion: {}", id);
            (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
        }
    }
}

async fn add_entity_note(
    headers: HeaderMap,
    Path(entity_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    Json(payload): Json<MockNoteInput>,
) -> axum::response::Response {
    info!(
        "POST /api/v3.4/entities/{}/notes with params: {:?}",
        entity_id, params
    );
    if !authorized(&headers) {
        return unauthorized();
    }
    match params.get("type").map(|s| s.as_str()) {
        Some("host") | Some("account") => {}
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"detail": format!("Invalid entity type: {:?}", other)})),
            )
                .into_response();
        }
    }

    let mut data = MOCK_DATA.lock().unwrap();
    let id = data.next_note_id;
    data.next_note_id += 1;
    let note = MockNote {
        id,
        date_created: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        created_by: "api_client".to_string(),
        note: payload.note,
    };
    data.notes.entry(entity_id).or_default().push(note.clone());

    (StatusCode::CREATED, Json(note)).into_response()
}

async fn update_detections(
    headers: HeaderMap,
    Json(payload): Json<MockDetectionUpdate>,
) -> axum::response::Response {
    info!("PATCH /api/v3.4/detections with payload: {:?}", payload);
    if !authorized(&headers) {
        return unauthorized();
    }

    let fixed = match payload.mark_as_fixed.as_str() {
        "True" => true,
        "False" => false,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"detail": format!("Invalid mark_as_fixed value: {}", other)})),
            )
                .into_response();
        }
    };

    // Detection 999 simulates a backend failure.
    if payload.detection_id_list.contains(&999) {
        warn!("Simulating error for detection 999");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "Internal server error"})),
        )
            .into_response();
    }

    let mut data = MOCK_DATA.lock().unwrap();
    for id in &payload.detection_id_list {
        data.fixed_detections.insert(*id, fixed);
    }

    (
        StatusCode::OK,
        Json(json!({"_meta": {"level": "Success", "message": "Successfully marked detections"}})),
    )
        .into_response()
}

async fn catch_all(method: axum::http::Method, uri: axum::http::Uri) -> impl IntoResponse {
    let path = uri.path().to_string();
    warn!("Unhandled request: {} {}", method, path);

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "detail": format!("No handler for: {} {}", method, path),
            "available_routes_info": [
                "GET /health",
                "POST /oauth2/token",
                "GET|POST /api/v3.4/assignments",
                "GET|DELETE /api/v3.4/assignments/:id",
                "POST /api/v3.4/entities/:id/notes?type=host|account",
                "PATCH /api/v3.4/detections"
            ]
        })),
    )
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting Mock Vectra Server...");

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/oauth2/token", post(issue_token))
        .route(
            "/api/v3.4/assignments",
            get(list_assignments).post(create_assignment),
        )
        .route(
            "/api/v3.4/assignments/:id",
            get(get_assignment).delete(delete_assignment),
        )
        .route("/api/v3.4/entities/:id/notes", post(add_entity_note))
        .route("/api/v3.4/detections", patch(update_detections))
        .fallback(catch_all);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    println!("MOCK_SERVER_PORT={}", port); // read by the integration test harness
    info!("Mock server listening on 127.0.0.1:{}", port);

    axum::serve(listener, app).await.unwrap();
}
