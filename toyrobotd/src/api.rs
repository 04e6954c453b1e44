//! HTTP API for the toy robot history.
//!
//! Provides REST endpoints for:
//! - Health check
//! - Append a robot state (`POST /robot/move`)
//! - Latest robot state (`GET /robot/current`)
//! - Robot history (`GET /robot/history`)
//!
//! Request bodies are validated at this boundary even though the session
//! controller already keeps states on the grid; other clients may not.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use toyrobot_domain::{Direction, HistoryRecord, RobotState, GRID_MAX, GRID_MIN};
use toyrobot_store::{HistoryQuery, RobotRepository, StoreError};

use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState<S: RobotRepository + 'static> {
    pub store: Arc<S>,
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Query string of `GET /robot/history`.
///
/// Kept as text so that malformed numbers produce a validation message
/// instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Error response.
///
/// `{"statusCode": 400, "error": "Bad Request", "message": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub error: String,
    pub message: ErrorMessage,
}

/// A single message, or one per failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router<S>(state: Arc<ApiState<S>>) -> Router
where
    S: RobotRepository + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/robot/move", post(save_state_handler))
        .route("/robot/current", get(current_handler))
        .route("/robot/history", get(history_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy allowing the web client at `origin`.
pub fn cors_layer(origin: &str) -> DaemonResult<CorsLayer> {
    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|_| DaemonError::Config(format!("Invalid CORS origin: {}", origin)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Append a robot state to the history.
async fn save_state_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<HistoryRecord>, ApiError>
where
    S: RobotRepository + 'static,
{
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Rejected malformed body");
        error_response(StatusCode::BAD_REQUEST, ErrorMessage::One(rejection.body_text()))
    })?;

    let robot = validate_robot_state(&body)
        .map_err(|messages| to_error_response(DaemonError::Validation(messages)))?;

    let record = state
        .store
        .save_state(&robot)
        .await
        .map_err(|e| to_error_response(e.into()))?;

    debug!(id = %record.id, robot = %record.state, "Stored robot state");
    Ok(Json(record))
}

/// Latest robot state, or `{}` when none exists.
async fn current_handler<S>(State(state): State<Arc<ApiState<S>>>) -> Result<Json<Value>, ApiError>
where
    S: RobotRepository + 'static,
{
    let history = state
        .store
        .fetch_history(HistoryQuery::latest(1))
        .await
        .map_err(|e| to_error_response(e.into()))?;

    let body = match history.into_iter().next() {
        Some(record) => serde_json::to_value(record).map_err(|e| {
            to_error_response(StoreError::Serialization(e.to_string()).into())
        })?,
        None => Value::Object(Map::new()),
    };

    Ok(Json(body))
}

/// History, newest first, optionally paged.
async fn history_handler<S>(
    State(state): State<Arc<ApiState<S>>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError>
where
    S: RobotRepository + 'static,
{
    let query = validate_history_params(&params)
        .map_err(|messages| to_error_response(DaemonError::Validation(messages)))?;

    let records = state
        .store
        .fetch_history(query)
        .await
        .map_err(|e| to_error_response(e.into()))?;

    Ok(Json(records))
}

// =============================================================================
// Validation
// =============================================================================

/// Check a `{x, y, direction}` body.
///
/// Collects the first failed rule of every field, in field order.
pub fn validate_robot_state(body: &Value) -> Result<RobotState, Vec<String>> {
    let mut messages = Vec::new();

    let x = validate_bounded_int(body.get("x"), "x", GRID_MIN.into(), GRID_MAX.into())
        .map_err(|m| messages.push(m))
        .ok();
    let y = validate_bounded_int(body.get("y"), "y", GRID_MIN.into(), GRID_MAX.into())
        .map_err(|m| messages.push(m))
        .ok();
    let direction = validate_direction(body.get("direction"))
        .map_err(|m| messages.push(m))
        .ok();

    match (x, y, direction) {
        (Some(x), Some(y), Some(direction)) if messages.is_empty() => {
            RobotState::new(x as i32, y as i32, direction).map_err(|e| vec![e.to_string()])
        },
        _ => Err(messages),
    }
}

/// Check `limit` (1..=1000) and `offset` (>= 0).
pub fn validate_history_params(params: &HistoryParams) -> Result<HistoryQuery, Vec<String>> {
    let mut messages = Vec::new();

    let limit = params
        .limit
        .as_deref()
        .map(|raw| parse_bounded_param(raw, "limit", 1, HistoryQuery::MAX_LIMIT.into()))
        .transpose()
        .map_err(|m| messages.push(m))
        .ok()
        .flatten();
    let offset = params
        .offset
        .as_deref()
        .map(|raw| parse_bounded_param(raw, "offset", 0, u32::MAX.into()))
        .transpose()
        .map_err(|m| messages.push(m))
        .ok()
        .flatten();

    if !messages.is_empty() {
        return Err(messages);
    }

    Ok(HistoryQuery {
        limit: limit.map(|l| l as u32),
        offset: offset.map(|o| o as u32),
    })
}

fn validate_bounded_int(value: Option<&Value>, field: &str, min: i64, max: i64) -> Result<i64, String> {
    let value = match value {
        Some(Value::Number(n)) => n,
        _ => return Err(format!("{} must be a number conforming to the specified constraints", field)),
    };
    let Some(value) = value.as_i64() else {
        return Err(format!("{} must be an integer number", field));
    };
    check_bounds(value, field, min, max)
}

fn parse_bounded_param(raw: &str, field: &str, min: i64, max: i64) -> Result<i64, String> {
    let value = raw.trim().parse::<i64>().map_err(|_| {
        format!("{} must be a number conforming to the specified constraints", field)
    })?;
    check_bounds(value, field, min, max)
}

fn check_bounds(value: i64, field: &str, min: i64, max: i64) -> Result<i64, String> {
    if value < min {
        return Err(format!("{} must not be less than {}", field, min));
    }
    if value > max {
        return Err(format!("{} must not be greater than {}", field, max));
    }
    Ok(value)
}

fn validate_direction(value: Option<&Value>) -> Result<Direction, String> {
    value
        .and_then(Value::as_str)
        .and_then(|s| Direction::ALL.into_iter().find(|d| d.as_str() == s))
        .ok_or_else(|| {
            let names: Vec<&str> = Direction::ALL.iter().map(|d| d.as_str()).collect();
            format!("direction must be one of the following values: {}", names.join(", "))
        })
}

// =============================================================================
// Helpers
// =============================================================================

fn error_response(status: StatusCode, message: ErrorMessage) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
        }),
    )
}

fn to_error_response(error: DaemonError) -> ApiError {
    match error {
        DaemonError::Validation(messages) => {
            debug!(?messages, "Request failed validation");
            error_response(StatusCode::BAD_REQUEST, ErrorMessage::Many(messages))
        },
        DaemonError::Domain(e) => error_response(StatusCode::BAD_REQUEST, ErrorMessage::One(e.to_string())),
        DaemonError::Store(StoreError::Rejected(message)) => {
            error_response(StatusCode::BAD_REQUEST, ErrorMessage::One(message))
        },
        other => {
            error!(error = %other, "Request failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorMessage::One("Internal server error".to_string()),
            )
        },
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::json;
    use toyrobot_store::MemoryStore;
    use tower::util::ServiceExt;

    fn create_test_app(store: Arc<MemoryStore>) -> Router {
        create_router(Arc::new(ApiState { store }))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(Arc::new(MemoryStore::new()));

        let (status, body) = send(app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = serde_json::from_value(body).unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn test_current_empty_is_empty_object() {
        let app = create_test_app(Arc::new(MemoryStore::new()));

        let (status, body) = send(app, get("/robot/current")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_save_then_current() {
        let store = Arc::new(MemoryStore::new());

        let (status, body) = send(
            create_test_app(store.clone()),
            post_json("/robot/move", r#"{"x": 2, "y": 3, "direction": "NORTH"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["x"], 2);
        assert_eq!(body["direction"], "NORTH");
        assert!(body["createdAt"].is_string());

        let (_, current) = send(create_test_app(store.clone()), get("/robot/current")).await;
        assert_eq!(current, body);
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_save_out_of_bounds() {
        let store = Arc::new(MemoryStore::new());

        let (status, body) = send(
            create_test_app(store.clone()),
            post_json("/robot/move", r#"{"x": 5, "y": -1, "direction": "NORTH"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "statusCode": 400,
                "error": "Bad Request",
                "message": ["x must not be greater than 4", "y must not be less than 0"],
            })
        );
        assert_eq!(store.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_save_invalid_direction() {
        let (status, body) = send(
            create_test_app(Arc::new(MemoryStore::new())),
            post_json("/robot/move", r#"{"x": 0, "y": 0, "direction": "UP"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            json!(["direction must be one of the following values: NORTH, SOUTH, EAST, WEST"])
        );
    }

    #[tokio::test]
    async fn test_save_malformed_json() {
        let (status, body) = send(
            create_test_app(Arc::new(MemoryStore::new())),
            post_json("/robot/move", r#"{"x": 0,"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
    }

    #[tokio::test]
    async fn test_save_storage_failure_is_500() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next(StoreError::Database("disk full".to_string()));

        let (status, body) = send(
            create_test_app(store),
            post_json("/robot/move", r#"{"x": 0, "y": 0, "direction": "EAST"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["statusCode"], 500);
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_history_paging() {
        let store = Arc::new(MemoryStore::with_states([
            RobotState::new(0, 0, Direction::North).unwrap(),
            RobotState::new(0, 1, Direction::North).unwrap(),
            RobotState::new(0, 2, Direction::North).unwrap(),
        ]));

        let (status, body) = send(create_test_app(store.clone()), get("/robot/history")).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = body.as_array().unwrap().iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let (_, page) =
            send(create_test_app(store.clone()), get("/robot/history?limit=1&offset=1")).await;
        assert_eq!(page.as_array().unwrap().len(), 1);
        assert_eq!(page[0]["id"], 2);
    }

    #[tokio::test]
    async fn test_history_rejects_bad_params() {
        let store = Arc::new(MemoryStore::new());

        let (status, body) = send(create_test_app(store.clone()), get("/robot/history?limit=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!(["limit must not be less than 1"]));

        let (status, body) =
            send(create_test_app(store.clone()), get("/robot/history?limit=1001&offset=-2")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            json!(["limit must not be greater than 1000", "offset must not be less than 0"])
        );

        let (status, _) = send(create_test_app(store), get("/robot/history?limit=ten")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validate_robot_state_messages() {
        assert_eq!(
            validate_robot_state(&json!({"x": 4, "y": 4, "direction": "WEST"})),
            Ok(RobotState::new(4, 4, Direction::West).unwrap())
        );
        assert_eq!(
            validate_robot_state(&json!({"y": 1.5, "direction": "north"})),
            Err(vec![
                "x must be a number conforming to the specified constraints".to_string(),
                "y must be an integer number".to_string(),
                "direction must be one of the following values: NORTH, SOUTH, EAST, WEST".to_string(),
            ])
        );
        assert!(validate_robot_state(&json!([1, 2, "NORTH"])).is_err());
    }
}
