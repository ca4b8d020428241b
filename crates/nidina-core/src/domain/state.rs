//! State - タスクの状態
//!
//! # 状態遷移
//! - Pending -> Done（ユーザー操作、一方向）
//! - Overdue -> Done（ユーザー操作、一方向）
//! - Pending <-> Overdue（作成・編集時の再分類、または表示時の判定のみ）
//!
//! Done から戻る遷移はありません。Done だけが永続的な事実で、
//! Pending / Overdue は期日と現在時刻から導かれる分類です。

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// TaskStatus はタスクの状態を表現
///
/// ワイヤ上の表現は `"Pending"` / `"Done"` / `"Overdue"`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Done,
    Overdue,
}

impl TaskStatus {
    /// 期日と現在時刻から Pending / Overdue を判定する。
    ///
    /// 期日が `now` より厳密に後なら Pending、それ以外（同時刻を含む）は Overdue。
    pub fn classify(date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if date > now {
            TaskStatus::Pending
        } else {
            TaskStatus::Overdue
        }
    }

    /// 日単位の判定（リスト表示のチップ用）。
    ///
    /// 期日の日付が今日より前なら Overdue。時刻は見ない。
    pub fn classify_by_day(due_day: NaiveDate, today: NaiveDate) -> Self {
        if due_day < today {
            TaskStatus::Overdue
        } else {
            TaskStatus::Pending
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// `self` から `next` への遷移が許されるか。
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match (self, next) {
            (TaskStatus::Done, TaskStatus::Done) => true,
            (TaskStatus::Done, _) => false,
            _ => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Done => "Done",
            TaskStatus::Overdue => "Overdue",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
