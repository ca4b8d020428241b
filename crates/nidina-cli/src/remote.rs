//! HttpTaskStore - HTTP 越しに Task Store サーバーを使う TaskStore 実装
//!
//! クライアント側の `TaskClient` はこの実装を通してサーバーと同期します。
//! サーバーのエラー応答（`{"code", "message"}`）は `StoreError::Remote` に、
//! 接続できない場合は `StoreError::Transport` に変換します。

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use nidina_core::domain::{NewTask, StoreError, Task, TaskKey, TaskReplacement};
use nidina_core::ports::TaskStore;

use crate::server::ApiError;

#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: Client,
    base_url: String,
}

impl HttpTaskStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, key: TaskKey) -> String {
        format!("{}/tasks/{}", self.base_url, key)
    }
}

fn transport(error: reqwest::Error) -> StoreError {
    StoreError::Transport(error.to_string())
}

/// 2xx 以外をサーバーのエラー本文つきで `Remote` にする。
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.map_err(transport)?;
    let error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| {
        ApiError::new(
            status.canonical_reason().unwrap_or("UNKNOWN"),
            body.clone(),
        )
    });
    Err(StoreError::Remote {
        status: status.as_u16(),
        code: error.code,
        message: error.message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    check(response).await?.json::<T>().await.map_err(transport)
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let response = self
            .client
            .get(self.tasks_url())
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn append(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let response = self
            .client
            .post(self.tasks_url())
            .json(&new_task)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn replace(
        &self,
        key: TaskKey,
        replacement: TaskReplacement,
    ) -> Result<Task, StoreError> {
        let response = self
            .client
            .put(self.task_url(key))
            .json(&replacement)
            .send()
            .await
            .map_err(transport)?;
        decode(response).await
    }

    async fn remove(&self, key: TaskKey) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.task_url(key))
            .send()
            .await
            .map_err(transport)?;
        check(response).await.map(|_| ())
    }
}
