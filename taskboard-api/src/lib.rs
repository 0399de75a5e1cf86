//! # Taskboard API Server Library
//!
//! Role-gated user and task management over HTTP: dual-token JWT sessions,
//! Argon2id credentials, and an admin-to-user task assignment workflow.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Response-header middleware
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
