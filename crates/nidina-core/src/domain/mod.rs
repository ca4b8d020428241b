//! Domain model (IDs, tasks, status, keys, errors).

pub mod errors;
pub mod ids;
pub mod key;
pub mod state;
pub mod task;

pub use self::errors::{ErrorKind, StoreError};
pub use self::ids::TaskId;
pub use self::key::TaskKey;
pub use self::state::TaskStatus;
pub use self::task::{NewTask, Task, TaskReplacement};
