//! In-memory task store with FIFO eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::recognizer::OcrResult;

use super::store::{TaskError, TaskFilter, TaskStore};
use super::types::{Task, TaskFailure, TaskStatistics, TaskStatus};

/// Map plus creation order. `order` holds every key of `tasks` exactly once,
/// oldest first.
#[derive(Default)]
struct Inner {
    tasks: HashMap<String, Task>,
    order: VecDeque<String>,
}

impl Inner {
    fn task_mut(&mut self, id: &str) -> Result<&mut Task, TaskError> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }
}

/// Task store bounded to `capacity` records.
///
/// When full, creating a task evicts the oldest-created record regardless of
/// its status: the store keeps recent history, it is not a cache.
pub struct MemoryTaskStore {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl MemoryTaskStore {
    /// Creates an empty store holding at most `capacity` tasks (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        info!("Task store initialized, history capacity {}", capacity);
        Self {
            inner: Mutex::new(Inner::default()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every critical section leaves the map consistent, so a poisoned
        // lock is still safe to reuse.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invalid(task: &Task, operation: &str) -> TaskError {
        warn!(
            "Rejected {} on task {} in status {}",
            operation, task.id, task.status
        );
        TaskError::InvalidTransition {
            task_id: task.id.clone(),
            current: task.status,
            operation: operation.to_string(),
        }
    }
}

impl TaskStore for MemoryTaskStore {
    fn create(&self, total_units: u32) -> Result<Task, TaskError> {
        let task = Task::new(uuid::Uuid::new_v4().to_string(), total_units);

        let mut inner = self.lock();
        while inner.order.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(evicted) => {
                    inner.tasks.remove(&evicted);
                    debug!("Evicted task {} from history", evicted);
                }
                None => break,
            }
        }
        inner.order.push_back(task.id.clone());
        inner.tasks.insert(task.id.clone(), task.clone());
        drop(inner);

        debug!("Created task {} with {} units", task.id, total_units);
        Ok(task)
    }

    fn mark_processing(&self, id: &str) -> Result<Task, TaskError> {
        let mut inner = self.lock();
        let task = inner.task_mut(id)?;
        if task.status != TaskStatus::Pending {
            return Err(Self::invalid(task, "start"));
        }
        task.status = TaskStatus::Processing;
        task.started_at = Some(Utc::now());
        Ok(task.clone())
    }

    fn update_progress(&self, id: &str, processed_units: u32) -> Result<Task, TaskError> {
        let mut inner = self.lock();
        let task = inner.task_mut(id)?;
        if task.status != TaskStatus::Processing {
            return Err(Self::invalid(task, "update progress of"));
        }

        let processed = processed_units.min(task.total_units);
        if processed < task.processed_units {
            return Err(TaskError::ProgressRegression {
                task_id: task.id.clone(),
                previous: task.processed_units,
                requested: processed,
            });
        }

        task.processed_units = processed;
        if task.total_units > 0 {
            let pct = processed as f64 / task.total_units as f64 * 100.0;
            task.progress = pct.clamp(0.0, 100.0).max(task.progress);
        }
        Ok(task.clone())
    }

    fn complete(&self, id: &str, result: OcrResult) -> Result<Task, TaskError> {
        let mut inner = self.lock();
        let task = inner.task_mut(id)?;
        if task.status != TaskStatus::Processing {
            return Err(Self::invalid(task, "complete"));
        }
        task.status = TaskStatus::Completed;
        task.ended_at = Some(Utc::now());
        task.processed_units = task.total_units;
        task.progress = 100.0;
        task.result = Some(result);
        Ok(task.clone())
    }

    fn fail(&self, id: &str, failure: TaskFailure) -> Result<Task, TaskError> {
        let mut inner = self.lock();
        let task = inner.task_mut(id)?;
        if task.status.is_terminal() {
            return Err(Self::invalid(task, "fail"));
        }
        task.status = TaskStatus::Failed;
        task.ended_at = Some(Utc::now());
        task.error = Some(failure);
        Ok(task.clone())
    }

    fn get(&self, id: &str) -> Result<Option<Task>, TaskError> {
        Ok(self.lock().tasks.get(id).cloned())
    }

    fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskError> {
        let inner = self.lock();
        let tasks = inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.tasks.get(id))
            .filter(|task| filter.status.is_none_or(|status| task.status == status))
            .take(filter.limit)
            .cloned()
            .collect();
        Ok(tasks)
    }

    fn statistics(&self) -> Result<TaskStatistics, TaskError> {
        let inner = self.lock();
        let mut stats = TaskStatistics {
            total_tasks: inner.tasks.len(),
            ..Default::default()
        };
        for task in inner.tasks.values() {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Processing => stats.processing += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
            }
        }
        drop(inner);

        let finished = stats.completed + stats.failed;
        if finished > 0 {
            stats.success_rate = stats.completed as f64 / finished as f64 * 100.0;
        }
        Ok(stats)
    }

    fn len(&self) -> usize {
        self.lock().tasks.len()
    }
}
