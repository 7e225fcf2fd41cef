//! # Taskboard Shared Library
//!
//! This crate contains the persistence layer and business logic of the
//! taskboard server: boards holding ordered tasks, and the users they are
//! assigned to.
//!
//! ## Module Organization
//!
//! - `id`: Opaque identifier generation
//! - `db`: SQLite connection pool and migrations
//! - `store`: Generic record store with optimistic locking
//! - `models`: Boards, tasks and users, including the position managers
//! - `auth`: Password hashing
//! - `services`: Domain services orchestrating the above

pub mod auth;
pub mod db;
pub mod id;
pub mod models;
pub mod services;
pub mod store;
