//! In-memory task store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::TaskFactory;
use crate::domain::{NewTask, StoreError, Task, TaskKey, TaskReplacement};
use crate::ports::TaskStore;
use crate::ports::task_store::{remove_in, replace_in};

/// In-memory task store.
///
/// Same semantics as the file store, minus persistence. Never fails with a
/// storage error.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
    factory: TaskFactory,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory(factory: TaskFactory) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            factory,
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.lock().await.clone())
    }

    async fn append(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let task = self.factory.create(new_task);
        self.tasks.lock().await.push(task.clone());
        Ok(task)
    }

    async fn replace(
        &self,
        key: TaskKey,
        replacement: TaskReplacement,
    ) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().await;
        replace_in(&mut tasks, key, replacement)
    }

    async fn remove(&self, key: TaskKey) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().await;
        remove_in(&mut tasks, key).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn end_to_end_lifecycle() {
        let store = InMemoryTaskStore::new();
        let tomorrow = Utc::now() + Duration::days(1);

        let stored = store.append(NewTask::new("Buy milk", tomorrow)).await.unwrap();
        let listed = store.list().await.unwrap();
        assert_eq!(listed, vec![stored.clone()]);
        assert_eq!(listed[0].status, crate::domain::TaskStatus::Pending);

        let mut done = stored.to_replacement();
        done.status = crate::domain::TaskStatus::Done;
        store.replace(TaskKey::Index(0), done).await.unwrap();
        assert_eq!(
            store.list().await.unwrap()[0].status,
            crate::domain::TaskStatus::Done
        );

        store.remove(TaskKey::Index(0)).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemoryTaskStore::new();
        let task = store.append(NewTask::new("a", Utc::now())).await.unwrap();
        store.remove(TaskKey::Id(task.id)).await.unwrap();

        assert!(matches!(
            store.remove(TaskKey::Id(task.id)).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
