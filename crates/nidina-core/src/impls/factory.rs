//! Builds stored tasks from append requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{NewTask, Task, TaskId};
use crate::ports::{Clock, IdGenerator, SystemClock, UlidGenerator};

/// Clock + IdGenerator shared by every store implementation.
#[derive(Clone)]
pub struct TaskFactory {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl TaskFactory {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// IDs are stamped with the same clock that classifies status.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let ids = Arc::new(UlidGenerator::new(Arc::clone(&clock)));
        Self::new(clock, ids)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn create_id(&self) -> TaskId {
        self.ids.generate_task_id()
    }

    pub fn create(&self, new_task: NewTask) -> Task {
        Task::from_new(self.ids.generate_task_id(), new_task, self.clock.now())
    }
}

impl Default for TaskFactory {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}
