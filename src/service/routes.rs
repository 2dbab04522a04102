//! Axum routes for the task service.

use axum::{
    extract::{Json, Path, Query, State},
    http::{header::SET_COOKIE, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::store::TaskStore;
use crate::types::{Identity, InsertAck, TaskDocument, TaskId, TaskRecord, TaskUpdate, UpdateAck};

use super::cookie::{clear_session_cookie, session_cookie};
use super::error::ApiError;
use super::middleware::access_gate;
use super::state::ServiceState;

/// Plain-text banner served at `/`.
pub const BANNER: &str = "TaskMaster Server Running";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to open a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    /// Email to embed in the token.
    #[serde(default)]
    pub email: Option<String>,
    /// User id to embed in the token.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Generic success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Query for listing a user's tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTasksQuery {
    /// Owner email to filter by.
    #[serde(default)]
    pub email: Option<String>,
}

/// Request to update a task.
///
/// `email`/`userId` are read by the access gate; the handler only uses
/// `blogData`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// Fields to replace.
    pub blog_data: TaskUpdate,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub store: bool,
    pub details: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Issue a session token and set it as the `token` cookie.
///
/// Unauthenticated: this endpoint is the trust root.
async fn authenticate_handler<S: TaskStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Json(request): Json<AuthenticateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(user_id)) = (
        request.email.filter(|s| !s.is_empty()),
        request.user_id.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "email and userId are required".to_string(),
        ));
    };

    let identity = Identity::new(email, user_id);
    let token = state.tokens().issue(&identity);
    info!(user_email = %identity.user_email, "Session issued");

    Ok((
        [(SET_COOKIE, session_cookie(&token, state.mode()))],
        SuccessResponse::ok(),
    ))
}

/// Expire the `token` cookie. Idempotent.
async fn logout_handler<S: TaskStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> impl IntoResponse {
    (
        [(SET_COOKIE, clear_session_cookie(state.mode()))],
        SuccessResponse::ok(),
    )
}

/// List all tasks owned by `?email=`. Open endpoint.
async fn list_tasks_handler<S: TaskStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskRecord>>, ApiError> {
    let Some(email) = query.email.filter(|s| !s.is_empty()) else {
        return Ok(Json(Vec::new()));
    };

    let tasks = state.store.find_by_owner(&email).await.map_err(ApiError::store)?;
    debug!(user_email = %email, count = tasks.len(), "Tasks listed");
    Ok(Json(tasks))
}

/// Insert a task document verbatim. Open endpoint.
async fn create_task_handler<S: TaskStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Json(document): Json<TaskDocument>,
) -> Result<Json<InsertAck>, ApiError> {
    debug!(fields = document.len(), "Creating task");
    let ack = state.store.insert(document).await.map_err(ApiError::store)?;
    info!(task_id = %ack.inserted_id, "Task created");
    Ok(Json(ack))
}

/// Replace the supplied fields of a task owned by the verified caller.
/// Runs behind the access gate.
async fn update_task_handler<S: TaskStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Path(raw_id): Path<String>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<UpdateAck>, ApiError> {
    let id = TaskId::parse(&raw_id).map_err(|_| ApiError::InvalidTaskId(raw_id.clone()))?;

    let ack = state
        .store
        .update_fields(&id, &identity.user_email, &request.blog_data)
        .await
        .map_err(ApiError::store)?;

    info!(
        task_id = %id,
        user_email = %identity.user_email,
        matched = ack.matched_count,
        modified = ack.modified_count,
        "Task updated"
    );
    Ok(Json(ack))
}

/// Banner endpoint.
async fn root_handler() -> &'static str {
    BANNER
}

/// Liveness probe endpoint.
///
/// Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 if the store answers, 503 otherwise.
async fn readiness_handler<S: TaskStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.store.is_healthy().await {
        Ok(Json(ReadinessResponse {
            ready: true,
            store: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                store: false,
                details: Some("Store health check failed".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the task service.
pub fn create_router<S: TaskStore + 'static>(state: ServiceState<S>) -> Router {
    let gate = middleware::from_fn_with_state(Arc::clone(state.tokens()), access_gate);
    let state = Arc::new(state);

    Router::new()
        .route("/", get(root_handler))
        // Sessions
        .route("/authenticate", post(authenticate_handler::<S>))
        .route("/logout", post(logout_handler::<S>))
        // Tasks
        .route("/allTasks", get(list_tasks_handler::<S>))
        .route("/create-task", post(create_task_handler::<S>))
        .route("/updateBlog/:id", put(update_task_handler::<S>).route_layer(gate))
        // Health checks
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .with_state(state)
}
