/// Database models for Taskboard
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts with roles
/// - `task`: Tasks with the work-progress and assignment-workflow axes

pub mod task;
pub mod user;
