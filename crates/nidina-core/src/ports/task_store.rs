//! TaskStore port - タスク一覧の正本（source of truth）
//!
//! 実装:
//! - `JsonFileTaskStore`: JSON ファイル 1 本に配列として保存（サーバー用）
//! - `InMemoryTaskStore`: テスト・組み込み用
//! - `LocalCacheStore`: ネットワークを使わないローカルキャッシュモード
//! - `HttpTaskStore`（nidina-cli）: HTTP 越しのリモートストア

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{NewTask, StoreError, Task, TaskKey, TaskReplacement};

/// TaskStore はタスク一覧を保持し、4 つの操作を提供する
///
/// # 設計原則
/// - 並び順は保存順。list はフィルタもページングもしない
/// - タスクは安定 ID で指す。`TaskKey::Index` は操作の中で ID に解決される
/// - 変更操作はストア内で直列化され、同時に来た書き込みが失われない
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// 全タスクを保存順で返す。読めなければエラー（空配列で代用しない）。
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    /// 末尾に追加し、保存された形（ID・version 付き）を返す。
    async fn append(&self, new_task: NewTask) -> Result<Task, StoreError>;

    /// `key` のスロットを置き換え、保存された形を返す。他の要素は変わらない。
    async fn replace(&self, key: TaskKey, replacement: TaskReplacement)
        -> Result<Task, StoreError>;

    /// `key` の要素を 1 つ取り除く。後続の要素は 1 つ前に詰まる。
    async fn remove(&self, key: TaskKey) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: TaskStore + ?Sized> TaskStore for Arc<T> {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        (**self).list().await
    }

    async fn append(&self, new_task: NewTask) -> Result<Task, StoreError> {
        (**self).append(new_task).await
    }

    async fn replace(
        &self,
        key: TaskKey,
        replacement: TaskReplacement,
    ) -> Result<Task, StoreError> {
        (**self).replace(key, replacement).await
    }

    async fn remove(&self, key: TaskKey) -> Result<(), StoreError> {
        (**self).remove(key).await
    }
}

/// replace の共通ロジック
///
/// version と状態遷移を検査してからスロットを書き換える。
/// 各実装はロックを持った状態でこれを呼ぶ。
pub(crate) fn replace_in(
    tasks: &mut [Task],
    key: TaskKey,
    replacement: TaskReplacement,
) -> Result<Task, StoreError> {
    let position = key.position(tasks)?;
    let slot = &mut tasks[position];

    if let Some(expected) = replacement.version
        && expected != slot.version
    {
        return Err(StoreError::VersionConflict {
            expected,
            found: slot.version,
        });
    }
    if !slot.status.can_transition_to(replacement.status) {
        return Err(StoreError::InvalidTransition {
            from: slot.status,
            to: replacement.status,
        });
    }

    slot.apply(replacement);
    Ok(slot.clone())
}

/// remove の共通ロジック
pub(crate) fn remove_in(tasks: &mut Vec<Task>, key: TaskKey) -> Result<Task, StoreError> {
    let position = key.position(tasks)?;
    Ok(tasks.remove(position))
}
