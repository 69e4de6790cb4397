//! Task tracking: lifecycle state, progress and statistics for submitted jobs.

mod memory_store;
mod store;
mod types;

pub use memory_store::MemoryTaskStore;
pub use store::{TaskError, TaskFilter, TaskStore};
pub use types::{ErrorKind, Task, TaskFailure, TaskStatistics, TaskStatus};
