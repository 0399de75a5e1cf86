/// Task model and database operations
///
/// This module provides the Task model. A task carries two independent
/// state axes:
///
/// - `status` tracks work progress (`pending`, `started`, `completed`) and
///   is mutated only by the owning user.
/// - `assignment_status` tracks the assignment workflow between an
///   administrator and the owner.
///
/// # Assignment state machine
///
/// ```text
/// (owner creates)  → self-created            [terminal for respond]
/// (admin assigns)  → assigned
/// assigned → accepted                        [terminal]
/// assigned → rejected                        [terminal]
/// ```
///
/// The transition is encoded once, in [`AssignmentStatus::respond`], and
/// enforced atomically at the store: the response UPDATE pins both the
/// owner and the `assigned` source state in its WHERE clause, so a racing
/// second response (or a response from a non-owner) matches zero rows.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'started', 'completed');
/// CREATE TYPE assignment_status AS ENUM ('self-created', 'assigned', 'accepted', 'rejected');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status task_status NOT NULL DEFAULT 'pending',
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     assignment_status assignment_status NOT NULL DEFAULT 'self-created',
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

use crate::models::user::{UserRole, UserSummary};

/// Work-progress state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not yet started
    Pending,

    /// Work in progress
    Started,

    /// Work finished
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Started => "started",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parses a client-supplied status string, `None` for anything outside
    /// the enum
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "started" => Some(TaskStatus::Started),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// Assignment-workflow state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "assignment_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentStatus {
    /// Created by its owner; never entered the assignment workflow
    SelfCreated,

    /// Assigned by an administrator, awaiting the owner's response
    Assigned,

    /// Owner accepted the assignment
    Accepted,

    /// Owner rejected the assignment
    Rejected,
}

impl sqlx::postgres::PgHasArrayType for AssignmentStatus {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_assignment_status")
    }
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::SelfCreated => "self-created",
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::Accepted => "accepted",
            AssignmentStatus::Rejected => "rejected",
        }
    }

    /// Whether a response can still move this state
    pub fn is_respondable(&self) -> bool {
        matches!(self, AssignmentStatus::Assigned)
    }

    /// Transition function for the assignee's response
    ///
    /// Only `Assigned` may move, to `Accepted` or `Rejected`. Every other
    /// state is terminal with respect to the response operation.
    pub fn respond(self, response: AssignmentResponse) -> Result<Self, TransitionError> {
        match self {
            AssignmentStatus::Assigned => Ok(match response {
                AssignmentResponse::Accepted => AssignmentStatus::Accepted,
                AssignmentResponse::Rejected => AssignmentStatus::Rejected,
            }),
            AssignmentStatus::SelfCreated
            | AssignmentStatus::Accepted
            | AssignmentStatus::Rejected => Err(TransitionError::NotRespondable(self)),
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The assignee's answer to an assigned task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentResponse {
    Accepted,
    Rejected,
}

impl AssignmentResponse {
    /// Parses a client-supplied response string, `None` for anything that
    /// is not exactly `accepted` or `rejected`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accepted" => Some(AssignmentResponse::Accepted),
            "rejected" => Some(AssignmentResponse::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentResponse::Accepted => "accepted",
            AssignmentResponse::Rejected => "rejected",
        }
    }
}

/// Error type for invalid assignment-state transitions
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// The task is not awaiting a response
    #[error("task in state '{0}' is not awaiting a response")]
    NotRespondable(AssignmentStatus),
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title (non-empty)
    pub title: String,

    /// Longer description (non-empty)
    pub description: String,

    /// Work-progress state, owner-mutated
    pub status: TaskStatus,

    /// The user who must complete the task. Immutable after creation.
    pub owner_id: Uuid,

    /// The administrator who assigned the task (null for self-created
    /// tasks, or if that administrator's account was deleted)
    pub assigned_by: Option<Uuid>,

    /// Assignment-workflow state
    pub assignment_status: AssignmentStatus,

    /// Optional deadline
    pub due_date: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for a self-created task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub owner_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for an administrator-assigned task
#[derive(Debug, Clone)]
pub struct AssignTask {
    pub title: String,
    pub description: String,

    /// The user who must complete the task
    pub owner_id: Uuid,

    /// The administrator making the assignment
    pub assigned_by: Uuid,

    pub due_date: Option<DateTime<Utc>>,
}

/// Input for updating a task's plain fields
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

/// A task annotated with its assigner's public summary
///
/// Returned by the "assigned tasks" projection.
#[derive(Debug, Clone, Serialize)]
pub struct AssignedTask {
    #[serde(flatten)]
    pub task: Task,

    /// Public summary of the assigning administrator, if the account
    /// still exists
    pub assigner: Option<UserSummary>,
}

/// A task annotated with both owner and assigner summaries
///
/// Returned by the administrator-only "all tasks" projection.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOverview {
    #[serde(flatten)]
    pub task: Task,

    /// Public summary of the owner
    pub owner: UserSummary,

    /// Public summary of the assigner, if any
    pub assigner: Option<UserSummary>,
}

#[derive(Debug, sqlx::FromRow)]
struct AssignedTaskRow {
    #[sqlx(flatten)]
    task: Task,
    assigner_username: Option<String>,
    assigner_email: Option<String>,
    assigner_role: Option<UserRole>,
}

impl From<AssignedTaskRow> for AssignedTask {
    fn from(row: AssignedTaskRow) -> Self {
        let assigner = match (row.task.assigned_by, row.assigner_username, row.assigner_email) {
            (Some(id), Some(username), Some(email)) => Some(UserSummary {
                id,
                username,
                email,
                role: row.assigner_role.unwrap_or(UserRole::Admin),
            }),
            _ => None,
        };
        AssignedTask {
            task: row.task,
            assigner,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaskOverviewRow {
    #[sqlx(flatten)]
    task: Task,
    owner_username: String,
    owner_email: String,
    owner_role: UserRole,
    assigner_username: Option<String>,
    assigner_email: Option<String>,
    assigner_role: Option<UserRole>,
}

impl From<TaskOverviewRow> for TaskOverview {
    fn from(row: TaskOverviewRow) -> Self {
        let owner = UserSummary {
            id: row.task.owner_id,
            username: row.owner_username,
            email: row.owner_email,
            role: row.owner_role,
        };
        let assigner = match (row.task.assigned_by, row.assigner_username, row.assigner_email) {
            (Some(id), Some(username), Some(email)) => Some(UserSummary {
                id,
                username,
                email,
                role: row.assigner_role.unwrap_or(UserRole::Admin),
            }),
            _ => None,
        };
        TaskOverview {
            task: row.task,
            owner,
            assigner,
        }
    }
}

const TASK_COLUMNS: &str = "id, title, description, status, owner_id, assigned_by, \
                            assignment_status, due_date, created_at, updated_at";

impl Task {
    /// Creates a self-created task owned by its creator
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, owner_id, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.owner_id)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Creates a task assigned by an administrator to a target user
    ///
    /// The task enters the workflow in the `assigned` state, awaiting the
    /// owner's response.
    pub async fn assign(pool: &PgPool, data: AssignTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, owner_id, assigned_by, assignment_status, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.owner_id)
        .bind(data.assigned_by)
        .bind(AssignmentStatus::Assigned)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, `None` if absent
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Updates a task's plain fields, scoped to its owner
    ///
    /// Ownership is part of the WHERE clause, so a non-owner's update
    /// matches zero rows and is indistinguishable from a missing task.
    pub async fn update_owned(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                due_date = COALESCE($6, due_date),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.due_date)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Updates any task's plain fields (administrator path)
    pub async fn update_any(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                due_date = COALESCE($5, due_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.due_date)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Sets the work-progress status, scoped to the owner
    ///
    /// The status axis is settable at any assignment state.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(owner_id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Applies the owner's response to an assigned task
    ///
    /// The single conditional UPDATE is the atomic form of
    /// [`AssignmentStatus::respond`]: the WHERE clause pins the `assigned`
    /// source state and the ownership requirement, so a task that is not
    /// respondable, already responded, or not owned by the caller matches
    /// zero rows and comes back as `None`. Callers cannot tell those cases
    /// apart, which keeps task existence unleaked.
    pub async fn respond(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        response: AssignmentResponse,
    ) -> Result<Option<Self>, sqlx::Error> {
        let next = match AssignmentStatus::Assigned.respond(response) {
            Ok(next) => next,
            // respond() is total for the Assigned source state; any other
            // state falls out of the WHERE clause below as no row
            Err(_) => return Ok(None),
        };

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET assignment_status = $4, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND assignment_status = $3
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(owner_id)
        .bind(AssignmentStatus::Assigned)
        .bind(next)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task, scoped to its owner
    pub async fn delete_owned(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes any task (administrator path)
    pub async fn delete_any(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a user's tasks, newest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists a user's tasks that entered the assignment workflow
    ///
    /// Self-created tasks are excluded; each row is annotated with the
    /// assigner's public summary. Newest first.
    pub async fn list_assigned(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Vec<AssignedTask>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AssignedTaskRow>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.owner_id, t.assigned_by,
                   t.assignment_status, t.due_date, t.created_at, t.updated_at,
                   a.username AS assigner_username,
                   a.email AS assigner_email,
                   a.role AS assigner_role
            FROM tasks t
            LEFT JOIN users a ON a.id = t.assigned_by
            WHERE t.owner_id = $1
              AND t.assignment_status = ANY($2)
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(vec![
            AssignmentStatus::Assigned,
            AssignmentStatus::Accepted,
            AssignmentStatus::Rejected,
        ])
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(AssignedTask::from).collect())
    }

    /// Lists every task with owner and assigner summaries (administrator
    /// projection)
    ///
    /// The inner join on the owner drops any task whose owner record is
    /// gone, so the projection never surfaces a broken reference.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<TaskOverview>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskOverviewRow>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.owner_id, t.assigned_by,
                   t.assignment_status, t.due_date, t.created_at, t.updated_at,
                   o.username AS owner_username,
                   o.email AS owner_email,
                   o.role AS owner_role,
                   a.username AS assigner_username,
                   a.email AS assigner_email,
                   a.role AS assigner_role
            FROM tasks t
            INNER JOIN users o ON o.id = t.owner_id
            LEFT JOIN users a ON a.id = t.assigned_by
            ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(TaskOverview::from).collect())
    }

    /// Finds a single task with owner and assigner summaries
    pub async fn find_overview(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskOverview>, sqlx::Error> {
        let row = sqlx::query_as::<_, TaskOverviewRow>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.owner_id, t.assigned_by,
                   t.assignment_status, t.due_date, t.created_at, t.updated_at,
                   o.username AS owner_username,
                   o.email AS owner_email,
                   o.role AS owner_role,
                   a.username AS assigner_username,
                   a.email AS assigner_email,
                   a.role AS assigner_role
            FROM tasks t
            INNER JOIN users o ON o.id = t.owner_id
            LEFT JOIN users a ON a.id = t.assigned_by
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(TaskOverview::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(TaskStatus::parse("pending"), Some(TaskStatus::Pending));
        assert_eq!(TaskStatus::parse("started"), Some(TaskStatus::Started));
        assert_eq!(TaskStatus::parse("completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse("done"), None);
        assert_eq!(TaskStatus::parse(""), None);
        assert_eq!(TaskStatus::parse("Pending"), None);
    }

    #[test]
    fn test_response_parse() {
        assert_eq!(
            AssignmentResponse::parse("accepted"),
            Some(AssignmentResponse::Accepted)
        );
        assert_eq!(
            AssignmentResponse::parse("rejected"),
            Some(AssignmentResponse::Rejected)
        );
        assert_eq!(AssignmentResponse::parse("maybe"), None);
        assert_eq!(AssignmentResponse::parse("ACCEPTED"), None);
        assert_eq!(AssignmentResponse::parse(""), None);
    }

    #[test]
    fn test_respond_from_assigned() {
        assert_eq!(
            AssignmentStatus::Assigned
                .respond(AssignmentResponse::Accepted)
                .unwrap(),
            AssignmentStatus::Accepted
        );
        assert_eq!(
            AssignmentStatus::Assigned
                .respond(AssignmentResponse::Rejected)
                .unwrap(),
            AssignmentStatus::Rejected
        );
    }

    #[test]
    fn test_respond_terminal_states() {
        for state in [
            AssignmentStatus::SelfCreated,
            AssignmentStatus::Accepted,
            AssignmentStatus::Rejected,
        ] {
            for response in [AssignmentResponse::Accepted, AssignmentResponse::Rejected] {
                let err = state.respond(response).unwrap_err();
                assert!(matches!(err, TransitionError::NotRespondable(s) if s == state));
            }
        }
    }

    #[test]
    fn test_respondable() {
        assert!(AssignmentStatus::Assigned.is_respondable());
        assert!(!AssignmentStatus::SelfCreated.is_respondable());
        assert!(!AssignmentStatus::Accepted.is_respondable());
        assert!(!AssignmentStatus::Rejected.is_respondable());
    }

    #[test]
    fn test_assignment_status_serde_names() {
        assert_eq!(
            serde_json::to_value(AssignmentStatus::SelfCreated).unwrap(),
            "self-created"
        );
        assert_eq!(
            serde_json::to_value(AssignmentStatus::Assigned).unwrap(),
            "assigned"
        );
    }

    #[test]
    fn test_orthogonal_axes_serialize_independently() {
        let task = Task {
            id: Uuid::new_v4(),
            title: "Write report".to_string(),
            description: "Quarterly summary".to_string(),
            status: TaskStatus::Started,
            owner_id: Uuid::new_v4(),
            assigned_by: Some(Uuid::new_v4()),
            assignment_status: AssignmentStatus::Assigned,
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "started");
        assert_eq!(json["assignment_status"], "assigned");
    }
}
