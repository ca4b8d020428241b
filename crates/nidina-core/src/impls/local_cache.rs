//! LocalCacheStore - ネットワークを使わないローカルキャッシュモード
//!
//! # ライフサイクル
//! 1. open 時に一度だけキャッシュファイルから復元（hydrate）
//!    - ファイルがない、または壊れている場合は空の一覧から始める
//! 2. 以後はメモリ上の一覧が正本
//! 3. 変更のたびに一覧全体をファイルへ書き出す（persist）
//!
//! サーバー側のファイルとは独立しており、突き合わせ（reconcile）はしません。

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::TaskFactory;
use super::fs::{parse_tasks, write_tasks};
use crate::domain::{NewTask, StoreError, Task, TaskKey, TaskReplacement};
use crate::ports::TaskStore;
use crate::ports::task_store::{remove_in, replace_in};

pub struct LocalCacheStore {
    path: PathBuf,
    factory: TaskFactory,
    tasks: Mutex<Vec<Task>>,
}

impl LocalCacheStore {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with(path, TaskFactory::default()).await
    }

    /// キャッシュから復元する。失敗しても空の一覧で開く（エラーにしない）。
    pub async fn open_with(path: impl Into<PathBuf>, factory: TaskFactory) -> Self {
        let path = path.into();
        let tasks = hydrate(&path, &factory).await;
        tracing::debug!(path = %path.display(), count = tasks.len(), "hydrated local cache");
        Self {
            path,
            factory,
            tasks: Mutex::new(tasks),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `mutate` をコピーに適用し、書き出しに成功したときだけ反映する。
    async fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut Vec<Task>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut tasks = self.tasks.lock().await;
        let mut next = tasks.clone();
        let out = mutate(&mut next)?;
        write_tasks(&self.path, &next).await?;
        *tasks = next;
        Ok(out)
    }
}

async fn hydrate(path: &Path, factory: &TaskFactory) -> Vec<Task> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "local cache unreadable, starting empty");
            return Vec::new();
        }
    };
    match parse_tasks(path, &bytes, factory) {
        Ok(loaded) => loaded.tasks,
        Err(e) => {
            tracing::warn!(error = %e, "local cache unparsable, starting empty");
            Vec::new()
        }
    }
}

#[async_trait]
impl TaskStore for LocalCacheStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.lock().await.clone())
    }

    async fn append(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let task = self.factory.create(new_task);
        self.commit(|tasks| {
            tasks.push(task.clone());
            Ok(task)
        })
        .await
    }

    async fn replace(
        &self,
        key: TaskKey,
        replacement: TaskReplacement,
    ) -> Result<Task, StoreError> {
        self.commit(|tasks| replace_in(tasks, key, replacement)).await
    }

    async fn remove(&self, key: TaskKey) -> Result<(), StoreError> {
        self.commit(|tasks| remove_in(tasks, key).map(|_| ())).await
    }
}
