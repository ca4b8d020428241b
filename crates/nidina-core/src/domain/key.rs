//! TaskKey - リクエストがタスクを指す方法
//!
//! 安定 ID が正式なアドレスです。数値インデックスは旧クライアントとの
//! 互換のためだけに受け付け、ストアのロック内で ID に解決されます。
//! 範囲外のインデックスは拒否され、配列の拡張や黙った no-op にはなりません。

use std::fmt;
use std::str::FromStr;

use super::{Task, TaskId};
use super::errors::StoreError;

/// TaskKey はタスクの指定方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    /// 安定 ID（推奨）
    Id(TaskId),
    /// 配列上の位置（互換用）
    Index(usize),
}

impl TaskKey {
    /// `tasks` の中で指しているスロットの位置を返す。
    pub fn position(&self, tasks: &[Task]) -> Result<usize, StoreError> {
        match *self {
            TaskKey::Id(id) => tasks
                .iter()
                .position(|task| task.id == id)
                .ok_or(StoreError::NotFound(*self)),
            TaskKey::Index(index) if index < tasks.len() => Ok(index),
            TaskKey::Index(index) => Err(StoreError::IndexOutOfRange {
                index,
                len: tasks.len(),
            }),
        }
    }
}

impl From<TaskId> for TaskKey {
    fn from(id: TaskId) -> Self {
        TaskKey::Id(id)
    }
}

impl From<usize> for TaskKey {
    fn from(index: usize) -> Self {
        TaskKey::Index(index)
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKey::Id(id) => id.fmt(f),
            TaskKey::Index(index) => index.fmt(f),
        }
    }
}

impl FromStr for TaskKey {
    type Err = StoreError;

    /// 数字のみ → Index、`task-…` → Id、それ以外はエラー。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse::<usize>()
                .map(TaskKey::Index)
                .map_err(|_| StoreError::InvalidKey(s.to_string()));
        }
        s.parse::<TaskId>()
            .map(TaskKey::Id)
            .map_err(|_| StoreError::InvalidKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTask, Task};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use ulid::Ulid;

    fn tasks(n: usize) -> Vec<Task> {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                Task::from_new(
                    TaskId::from_ulid(Ulid::new()),
                    NewTask::new(format!("t{i}"), now),
                    now,
                )
            })
            .collect()
    }

    #[rstest]
    #[case("0", TaskKey::Index(0))]
    #[case("42", TaskKey::Index(42))]
    fn parses_indices(#[case] input: &str, #[case] expected: TaskKey) {
        assert_eq!(input.parse::<TaskKey>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("-1")]
    #[case("1.5")]
    #[case("abc")]
    #[case("99999999999999999999999999")]
    fn rejects_malformed_keys(#[case] input: &str) {
        assert!(matches!(
            input.parse::<TaskKey>(),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn parses_ids() {
        let id = TaskId::from_ulid(Ulid::new());
        assert_eq!(id.to_string().parse::<TaskKey>().unwrap(), TaskKey::Id(id));
    }

    #[test]
    fn position_resolves_ids_and_bounds_indices() {
        let tasks = tasks(3);

        assert_eq!(TaskKey::Id(tasks[2].id).position(&tasks).unwrap(), 2);
        assert_eq!(TaskKey::Index(1).position(&tasks).unwrap(), 1);
        assert!(matches!(
            TaskKey::Index(3).position(&tasks),
            Err(StoreError::IndexOutOfRange { index: 3, len: 3 })
        ));

        let missing = TaskKey::Id(TaskId::from_ulid(Ulid::new()));
        assert!(matches!(missing.position(&tasks), Err(StoreError::NotFound(_))));
    }
}
