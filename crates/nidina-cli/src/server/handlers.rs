//! HTTP handlers for the task store.
//!
//! Each handler does one store call. Keys in the path are parsed here so a
//! malformed key is a 400 before the store is touched.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use nidina_core::domain::{NewTask, Task, TaskKey, TaskReplacement};

use super::AppState;
use super::error::ApiErrorResponse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `GET /tasks`
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiErrorResponse> {
    let tasks = state.store.list().await?;
    Ok(Json(tasks))
}

/// `POST /tasks`
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<Json<Task>, ApiErrorResponse> {
    let Json(new_task) = payload?;
    let task = state.store.append(new_task).await?;
    tracing::info!(id = %task.id, "task created");
    Ok(Json(task))
}

/// `PUT /tasks/{key}`
pub async fn replace_task(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: Result<Json<TaskReplacement>, JsonRejection>,
) -> Result<Json<Task>, ApiErrorResponse> {
    let key: TaskKey = key.parse()?;
    let Json(replacement) = payload?;
    let task = state.store.replace(key, replacement).await?;
    tracing::info!(id = %task.id, status = %task.status, version = task.version, "task replaced");
    Ok(Json(task))
}

/// `DELETE /tasks/{key}`
pub async fn delete_task(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiErrorResponse> {
    let key: TaskKey = key.parse()?;
    state.store.remove(key).await?;
    tracing::info!(%key, "task removed");
    Ok(StatusCode::NO_CONTENT)
}
