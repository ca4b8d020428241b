//! JsonFileTaskStore - JSON ファイル 1 本を正本とするストア
//!
//! # 実装詳細
//! - ファイルは tasks の JSON 配列。存在しなければ `[]` で作成する
//! - 各操作はファイル全体の read → mutate → write
//! - tokio の Mutex で read-modify-write 全体を直列化する（single writer）
//!   → 並行した 2 つの replace のどちらかが失われることはない
//! - 書き込みは一時ファイル + rename で原子的に行う
//!
//! 複数プロセスが同じファイルに書くことは想定していません。
//! プロセス内の直列化だけを保証します。

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::TaskFactory;
use super::fs::{parse_tasks, write_tasks};
use crate::domain::{NewTask, StoreError, Task, TaskKey, TaskReplacement};
use crate::ports::TaskStore;
use crate::ports::task_store::{remove_in, replace_in};

pub struct JsonFileTaskStore {
    path: PathBuf,
    factory: TaskFactory,
    /// read-modify-write 全体を守るロック
    lock: Mutex<()>,
}

impl JsonFileTaskStore {
    /// ストアを開き、ファイルがなければ `[]` で作成する。
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with(path, TaskFactory::default()).await
    }

    pub async fn open_with(
        path: impl Into<PathBuf>,
        factory: TaskFactory,
    ) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            factory,
            lock: Mutex::new(()),
        };
        store.ensure_exists().await?;
        tracing::info!(path = %store.path.display(), "task file ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_exists(&self) -> Result<(), StoreError> {
        match tokio::fs::try_exists(&self.path).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::debug!(path = %self.path.display(), "creating empty task file");
                write_tasks(&self.path, &[]).await
            }
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// ファイルを読み、古い形式のレコードに ID を振ったらすぐに書き戻す。
    ///
    /// 呼び出し側がロックを持っていること。
    async fn read_all(&self) -> Result<Vec<Task>, StoreError> {
        self.ensure_exists().await?;
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| self.read_error(source))?;
        let loaded = parse_tasks(&self.path, &bytes, &self.factory)?;
        if loaded.dirty {
            tracing::info!(
                path = %self.path.display(),
                count = loaded.tasks.len(),
                "assigned ids to legacy task records"
            );
            write_tasks(&self.path, &loaded.tasks).await?;
        }
        Ok(loaded.tasks)
    }

    fn read_error(&self, source: io::Error) -> StoreError {
        StoreError::Read {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl TaskStore for JsonFileTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let _guard = self.lock.lock().await;
        let tasks = self.read_all().await?;
        tracing::debug!(count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    async fn append(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let _guard = self.lock.lock().await;
        let mut tasks = self.read_all().await?;
        let task = self.factory.create(new_task);
        tasks.push(task.clone());
        write_tasks(&self.path, &tasks).await?;
        tracing::debug!(id = %task.id, count = tasks.len(), "appended task");
        Ok(task)
    }

    async fn replace(
        &self,
        key: TaskKey,
        replacement: TaskReplacement,
    ) -> Result<Task, StoreError> {
        let _guard = self.lock.lock().await;
        let mut tasks = self.read_all().await?;
        let task = replace_in(&mut tasks, key, replacement)?;
        write_tasks(&self.path, &tasks).await?;
        tracing::debug!(id = %task.id, version = task.version, "replaced task");
        Ok(task)
    }

    async fn remove(&self, key: TaskKey) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut tasks = self.read_all().await?;
        let removed = remove_in(&mut tasks, key)?;
        write_tasks(&self.path, &tasks).await?;
        tracing::debug!(id = %removed.id, count = tasks.len(), "removed task");
        Ok(())
    }
}
