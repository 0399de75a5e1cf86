/// Task endpoints
///
/// # Endpoints
///
/// Any authenticated user (always scoped to the requester's own tasks):
/// - `GET /api/tasks` - Own tasks, newest first
/// - `POST /api/tasks` - Create a self-created task
/// - `PUT /api/tasks/:id` - Update fields of an owned task
/// - `PATCH /api/tasks/:id/status` - Set work-progress status
/// - `PATCH /api/tasks/:id/respond` - Accept or reject an assignment
/// - `GET /api/tasks/assigned` - Tasks that entered the assignment
///   workflow, annotated with the assigner
/// - `DELETE /api/tasks/:id` - Delete an owned task
///
/// Admin only:
/// - `GET /api/tasks/admin/all` - Every task, annotated with owner and
///   assigner
/// - `PUT /api/tasks/admin/:id` / `DELETE /api/tasks/admin/:id` - Any task
/// - `POST /api/tasks/assign` - Assign a task to a user
///
/// Ownership checks live in the queries' WHERE clauses, so "not yours" and
/// "does not exist" are the same 404 and each mutation is a single atomic
/// statement.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::middleware::AuthContext,
    models::task::{
        AssignTask, AssignedTask, AssignmentResponse, CreateTask, Task, TaskOverview, TaskStatus,
        UpdateTask,
    },
    models::user::User,
};
use uuid::Uuid;

/// Create task request
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Update task request
///
/// `status` arrives as a raw string and is parsed against the closed enum,
/// so an unknown value is a 400 rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Status update request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// Assign task request (admin)
#[derive(Debug, Deserialize)]
pub struct AssignTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,

    /// The user who must complete the task
    pub user_id: Option<Uuid>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Respond request
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    /// Exactly `accepted` or `rejected`
    pub response: Option<String>,
}

/// Mutation acknowledgement with the affected task
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: Task,
}

/// Acknowledgement carrying an annotated task
#[derive(Debug, Serialize)]
pub struct TaskOverviewResponse {
    pub message: String,
    pub task: TaskOverview,
}

/// Bare acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Own tasks, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_by_owner(&state.db, ctx.user_id).await?;
    Ok(Json(tasks))
}

/// Create a self-created task
pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let (title, description) = match (req.title, req.description) {
        (Some(t), Some(d)) if !t.is_empty() && !d.is_empty() => (t, d),
        _ => {
            return Err(ApiError::BadRequest(
                "Title and description are required".to_string(),
            ))
        }
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            title,
            description,
            owner_id: ctx.user_id,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully".to_string(),
            task,
        }),
    ))
}

/// Update fields of an owned task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let status = parse_status(req.status)?;

    let task = Task::update_owned(
        &state.db,
        id,
        ctx.user_id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse {
        message: "Task updated successfully".to_string(),
        task,
    }))
}

/// Set the work-progress status of an owned task
///
/// The status axis is independent of the assignment workflow: an owner may
/// start work on a task they have not yet accepted.
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let status = req
        .status
        .as_deref()
        .and_then(TaskStatus::parse)
        .ok_or_else(|| ApiError::BadRequest("Valid status is required".to_string()))?;

    let task = Task::set_status(&state.db, id, ctx.user_id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse {
        message: "Task status updated successfully".to_string(),
        task,
    }))
}

/// Delete an owned task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = Task::delete_owned(&state.db, id, ctx.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// Update any task (admin)
pub async fn admin_update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let status = parse_status(req.status)?;

    let task = Task::update_any(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskResponse {
        message: "Task updated successfully".to_string(),
        task,
    }))
}

/// Delete any task (admin)
pub async fn admin_delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = Task::delete_any(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// Assign a task to a user (admin)
///
/// The task starts in the `assigned` workflow state with the caller
/// recorded as the assigner; the target user responds via
/// [`respond_to_task`].
///
/// # Errors
///
/// - `400 Bad Request`: missing title, description, or user_id
/// - `404 Not Found`: the target user does not exist
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<AssignTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskOverviewResponse>)> {
    let (title, description, user_id) = match (req.title, req.description, req.user_id) {
        (Some(t), Some(d), Some(u)) if !t.is_empty() && !d.is_empty() => (t, d, u),
        _ => {
            return Err(ApiError::BadRequest(
                "Title, description, and userId are required".to_string(),
            ))
        }
    };

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let task = Task::assign(
        &state.db,
        AssignTask {
            title,
            description,
            owner_id: user_id,
            assigned_by: ctx.user_id,
            due_date: req.due_date,
        },
    )
    .await?;

    let task = Task::find_overview(&state.db, task.id)
        .await?
        .ok_or_else(|| ApiError::Internal("Assigned task vanished".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(TaskOverviewResponse {
            message: "Task assigned successfully".to_string(),
            task,
        }),
    ))
}

/// Accept or reject an assigned task
///
/// Valid only while the task is in the `assigned` state and owned by the
/// caller; every other case (wrong owner, already responded, self-created,
/// nonexistent) is the same 404, so callers cannot probe for tasks they do
/// not own.
///
/// # Errors
///
/// - `400 Bad Request`: response is not exactly `accepted` or `rejected`
/// - `404 Not Found`: task not respondable by this caller
pub async fn respond_to_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let response = req
        .response
        .as_deref()
        .and_then(AssignmentResponse::parse)
        .ok_or_else(|| {
            ApiError::BadRequest("Valid response (accepted/rejected) is required".to_string())
        })?;

    let task = Task::respond(&state.db, id, ctx.user_id, response)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Task not found or already responded".to_string())
        })?;

    Ok(Json(TaskResponse {
        message: format!("Task {} successfully", response.as_str()),
        task,
    }))
}

/// Own tasks that entered the assignment workflow
///
/// Excludes self-created tasks; each row carries the assigner's public
/// summary. Newest first.
pub async fn list_assigned_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<AssignedTask>>> {
    let tasks = Task::list_assigned(&state.db, ctx.user_id).await?;
    Ok(Json(tasks))
}

/// Every task with owner and assigner summaries (admin)
pub async fn list_all_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<TaskOverview>>> {
    let tasks = Task::list_all(&state.db).await?;
    Ok(Json(tasks))
}

fn parse_status(status: Option<String>) -> Result<Option<TaskStatus>, ApiError> {
    match status {
        None => Ok(None),
        Some(s) => TaskStatus::parse(&s)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest("Valid status is required".to_string())),
    }
}
