/// API route handlers
///
/// - `health`: health check endpoint
/// - `auth`: session lifecycle (register, login, refresh, logout)
/// - `users`: user management and profile endpoints
/// - `tasks`: task CRUD and the assignment workflow

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
