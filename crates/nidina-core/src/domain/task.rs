//! Task record and the request bodies that create or replace one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{TaskId, TaskStatus};

/// A stored task.
///
/// Design:
/// - `id` is assigned by the store on append and never changes.
/// - `status` is the value recorded at create/edit time; only `Done` is a
///   durable fact. Use [`Task::effective_status`] for presentation.
/// - `version` is bumped by every replace and doubles as an optimistic
///   concurrency token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub date: DateTime<Utc>,
    pub status: TaskStatus,
    pub version: u64,
}

impl Task {
    /// Build the stored form of a freshly appended task.
    pub fn from_new(id: TaskId, new_task: NewTask, now: DateTime<Utc>) -> Self {
        let status = new_task
            .status
            .unwrap_or_else(|| TaskStatus::classify(new_task.date, now));
        Self {
            id,
            text: new_task.text,
            date: new_task.date,
            status,
            version: 1,
        }
    }

    /// Status as it should be shown at `now`.
    ///
    /// `Done` stays `Done` regardless of the date; anything else is derived
    /// from the due date so a stored `Pending` never goes stale.
    pub fn effective_status(&self, now: DateTime<Utc>) -> TaskStatus {
        if self.status.is_done() {
            TaskStatus::Done
        } else {
            TaskStatus::classify(self.date, now)
        }
    }

    /// Replacement body carrying this task's current fields and version.
    pub fn to_replacement(&self) -> TaskReplacement {
        TaskReplacement {
            text: self.text.clone(),
            date: self.date,
            status: self.status,
            version: Some(self.version),
        }
    }

    /// Overwrite the mutable fields with `replacement` and bump the version.
    /// The id is kept.
    pub fn apply(&mut self, replacement: TaskReplacement) {
        self.text = replacement.text;
        self.date = replacement.date;
        self.status = replacement.status;
        self.version += 1;
    }
}

/// Body of an append request.
///
/// No field is validated beyond its type; `status` is derived from `date`
/// by the store when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub text: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl NewTask {
    pub fn new(text: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            date,
            status: None,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Body of a replace request.
///
/// When `version` is present it must match the stored version, otherwise the
/// replace is rejected as a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReplacement {
    pub text: String,
    pub date: DateTime<Utc>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}
