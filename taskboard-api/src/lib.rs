//! # Taskboard API Server Library
//!
//! HTTP surface of the task board: boards, tasks, users, login and the two
//! ordering endpoints, all under `/taskboard`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
