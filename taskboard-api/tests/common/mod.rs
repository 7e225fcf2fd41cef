//! Common test utilities for the API integration tests
//!
//! Each `TestContext` owns a private in-memory database with migrations
//! applied and the system boards created, plus a router bound to it.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sqlx::SqlitePool;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::db::migrations::run_migrations;
use taskboard_shared::db::pool::{begin_write, create_pool, DatabaseConfig};
use taskboard_shared::services::board::BoardService;
use tower::Service as _;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: SqlitePool,
    pub app: axum::Router,
    pub config: Config,
}

impl TestContext {
    /// Creates a context with a fresh database
    pub async fn new() -> anyhow::Result<Self> {
        let mut config = Config::default();
        config.database.url = "sqlite::memory:".to_string();
        config.api.static_dir = std::env::temp_dir();

        let db = create_pool(DatabaseConfig::in_memory()).await?;
        run_migrations(&db).await?;

        let mut tx = begin_write(&db).await?;
        BoardService::new(&mut tx).create_system_boards().await?;
        tx.commit().await?;

        let app = build_router(AppState::new(db.clone(), config.clone()));

        Ok(TestContext { db, app, config })
    }

    /// Sends a request and returns the status and the JSON body
    ///
    /// An empty body is returned as `Value::Null`.
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.app.clone().call(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None).await
    }

    /// Creates a task through the API and returns its JSON
    pub async fn create_task(&self, name: &str, board_id: &str) -> Value {
        let (status, task) = self
            .post(
                "/taskboard/tasks",
                serde_json::json!({ "name": name, "boardId": board_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", task);
        task
    }

    /// Names of a board's tasks in position order
    pub async fn board_task_names(&self, board_id: &str) -> Vec<String> {
        let (status, tasks) = self.get(&format!("/taskboard/boards/{}/tasks", board_id)).await;
        assert_eq!(status, StatusCode::OK);
        tasks
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect()
    }
}
