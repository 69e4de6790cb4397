//! OCR orchestrator implementation.
//!
//! Drives each submitted job through the task lifecycle:
//! - Load: the job is resolved into ordered units (bounded by the deadline)
//! - Admit: one permit per task, bounded wait
//! - Run: units in page order, one device slot per unit, on the blocking pool
//! - Finalize: complete with the aggregated result, or fail with a kind

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::admission::{AdmissionController, AdmissionPermit};
use crate::config::Config;
use crate::device::DevicePool;
use crate::metrics::{TASKS_FINISHED, TASKS_SUBMITTED, TASK_DURATION};
use crate::recognizer::{JobDescriptor, LoadError, OcrResult, Recognizer, Unit, UnitLoader};
use crate::task::{
    ErrorKind, MemoryTaskStore, Task, TaskError, TaskFailure, TaskFilter, TaskStatistics,
    TaskStore,
};

use super::config::OrchestratorConfig;
use super::executor::{DeadlineElapsed, Recognition, RecognitionExecutor};
use super::types::{OrchestratorError, OrchestratorStatus};

/// Where a submission stands once `dispatch` returns.
enum Outcome {
    /// The task already reached a terminal state (load or admission failure).
    Finished(Task),
    /// The task was admitted and its run is on the runtime.
    Running(JoinHandle<Result<Task, OrchestratorError>>),
}

struct Dispatched {
    task_id: String,
    outcome: Outcome,
}

impl Dispatched {
    fn finished(task: Task) -> Self {
        Self {
            task_id: task.id.clone(),
            outcome: Outcome::Finished(task),
        }
    }
}

/// The OCR orchestrator: admission, device dispatch and task lifecycle.
pub struct OcrOrchestrator {
    config: OrchestratorConfig,
    admission: Arc<AdmissionController>,
    devices: Arc<DevicePool>,
    executor: Arc<RecognitionExecutor>,
    task_store: Arc<dyn TaskStore>,
    loader: Arc<dyn UnitLoader>,
    recognizer: Arc<dyn Recognizer>,
    running: Arc<AtomicBool>,
}

impl OcrOrchestrator {
    /// Create a new orchestrator. It accepts submissions immediately.
    pub fn new(
        config: OrchestratorConfig,
        admission: Arc<AdmissionController>,
        devices: Arc<DevicePool>,
        task_store: Arc<dyn TaskStore>,
        loader: Arc<dyn UnitLoader>,
        recognizer: Arc<dyn Recognizer>,
    ) -> Self {
        let workers = devices.len() * config.workers_per_device.max(1);
        let executor = Arc::new(RecognitionExecutor::new(workers));

        info!(
            "OCR orchestrator ready: {} device(s), {} recognition worker(s), recognizer '{}'",
            devices.len(),
            executor.size(),
            recognizer.name()
        );

        Self {
            config,
            admission,
            devices,
            executor,
            task_store,
            loader,
            recognizer,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Build the orchestrator and its components from the application config.
    pub fn from_config(
        config: &Config,
        loader: Arc<dyn UnitLoader>,
        recognizer: Arc<dyn Recognizer>,
    ) -> Result<Self, OrchestratorError> {
        let devices = Arc::new(DevicePool::new(&config.devices.device_ids)?);
        let admission = Arc::new(AdmissionController::new(&config.admission));
        let task_store: Arc<dyn TaskStore> =
            Arc::new(MemoryTaskStore::new(config.tracker.history_capacity));

        Ok(Self::new(
            config.orchestrator.clone(),
            admission,
            devices,
            task_store,
            loader,
            recognizer,
        ))
    }

    /// Submit a job and return its task id.
    ///
    /// Returns once the task is admitted or has failed; never waits longer
    /// than the admission wait (or the remaining deadline, if shorter).
    /// Dropping the returned future does not abandon the task: admission
    /// continues in the background and the record still reaches a terminal
    /// state.
    ///
    /// If the record is evicted from history before its run starts, returns
    /// [`OrchestratorError::TaskEvicted`] with the task id.
    pub async fn submit(&self, job: JobDescriptor) -> Result<String, OrchestratorError> {
        Ok(self.dispatch(job).await?.task_id)
    }

    /// Submit a job and wait for its terminal snapshot.
    pub async fn submit_and_wait(&self, job: JobDescriptor) -> Result<Task, OrchestratorError> {
        let dispatched = self.dispatch(job).await?;
        match dispatched.outcome {
            Outcome::Finished(task) => Ok(task),
            Outcome::Running(handle) => handle
                .await
                .map_err(|e| OrchestratorError::RunAborted(e.to_string()))?,
        }
    }

    /// Get a task snapshot by ID.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>, OrchestratorError> {
        Ok(self.task_store.get(id)?)
    }

    /// List task snapshots, most recently created first.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, OrchestratorError> {
        Ok(self.task_store.list(filter)?)
    }

    pub fn get_statistics(&self) -> Result<TaskStatistics, OrchestratorError> {
        Ok(self.task_store.statistics()?)
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.is_running(),
            admission: self.admission.status(),
            devices: self.devices.status(),
            recognition_workers: self.executor.size(),
            busy_workers: self.executor.busy(),
            tracked_tasks: self.task_store.len(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop accepting submissions and reject everyone waiting for a permit.
    ///
    /// Runs that already hold a permit finish normally.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator already shut down");
            return;
        }
        self.admission.close();
        info!(
            "OCR orchestrator shut down ({} task(s) still in flight)",
            self.admission.status().in_flight
        );
    }

    async fn dispatch(&self, job: JobDescriptor) -> Result<Dispatched, OrchestratorError> {
        if !self.is_running() {
            return Err(OrchestratorError::NotRunning);
        }
        TASKS_SUBMITTED.inc();

        let submitted = Instant::now();
        let deadline = submitted + self.config.request_deadline();

        let units = match self.load_units(job.normalized(), deadline).await {
            Ok(units) => units,
            Err(failure) => {
                let task = self.task_store.create(0)?;
                let task = fail_task(self.task_store.as_ref(), &task.id, failure, submitted)?;
                return Ok(Dispatched::finished(task));
            }
        };

        let task = self.task_store.create(units.len() as u32)?;
        let task_id = task.id;
        debug!("Created task {} with {} unit(s)", task_id, units.len());

        let wait = self
            .admission
            .max_queue_wait()
            .min(deadline.saturating_duration_since(Instant::now()));
        let run = TaskRun {
            task_id,
            units,
            submitted,
            deadline,
            devices: Arc::clone(&self.devices),
            executor: Arc::clone(&self.executor),
            task_store: Arc::clone(&self.task_store),
            recognizer: Arc::clone(&self.recognizer),
        };

        // Detached from the caller: a dropped submission still ends failed or admitted.
        tokio::spawn(admit_and_start(run, Arc::clone(&self.admission), wait))
            .await
            .map_err(|e| OrchestratorError::RunAborted(e.to_string()))?
    }

    async fn load_units(
        &self,
        job: JobDescriptor,
        deadline: Instant,
    ) -> Result<Vec<Unit>, TaskFailure> {
        job.validate()
            .map_err(|e| TaskFailure::new(ErrorKind::LoadError, e.to_string()))?;

        let units = tokio::time::timeout_at(deadline, self.loader.load(&job))
            .await
            .map_err(|_| {
                TaskFailure::new(
                    ErrorKind::DeadlineExceeded,
                    format!(
                        "loading pages exceeded the {} ms request deadline",
                        self.config.request_deadline_ms
                    ),
                )
            })?
            .map_err(|e| TaskFailure::new(ErrorKind::LoadError, e.to_string()))?;

        if units.is_empty() {
            return Err(TaskFailure::new(
                ErrorKind::LoadError,
                LoadError::Empty.to_string(),
            ));
        }
        Ok(units)
    }
}

/// Everything a spawned run needs, detached from the orchestrator.
struct TaskRun {
    task_id: String,
    units: Vec<Unit>,
    submitted: Instant,
    deadline: Instant,
    devices: Arc<DevicePool>,
    executor: Arc<RecognitionExecutor>,
    task_store: Arc<dyn TaskStore>,
    recognizer: Arc<dyn Recognizer>,
}

impl TaskRun {
    async fn execute(self) -> Result<Task, OrchestratorError> {
        let TaskRun {
            task_id,
            units,
            submitted,
            deadline,
            devices,
            executor,
            task_store,
            recognizer,
        } = self;

        let page_count = units.len();
        let mut results = Vec::new();
        let mut processing_time = Duration::ZERO;

        for (done, unit) in units.into_iter().enumerate() {
            let label = unit_label(&unit);
            let page = unit.page;

            if Instant::now() >= deadline {
                let failure = deadline_failure(&label, submitted);
                return fail_task(task_store.as_ref(), &task_id, failure, submitted);
            }

            let device = devices.pick();
            debug!(
                "Task {}: {} -> device {} (slot {})",
                task_id,
                label,
                device.device_id(),
                device.index()
            );

            let recognition = executor
                .run(Arc::clone(&recognizer), unit, device, deadline, &task_id)
                .await;

            match recognition {
                Err(DeadlineElapsed) => {
                    let failure = deadline_failure(&label, submitted);
                    return fail_task(task_store.as_ref(), &task_id, failure, submitted);
                }
                Ok(Recognition {
                    regions: Err(e), ..
                }) => {
                    let failure =
                        TaskFailure::new(ErrorKind::RecognitionError, format!("{}: {}", label, e));
                    return fail_task(task_store.as_ref(), &task_id, failure, submitted);
                }
                Ok(Recognition {
                    regions: Ok(regions),
                    elapsed,
                }) => {
                    processing_time += elapsed;
                    results.extend(regions.into_iter().map(|mut region| {
                        region.page = page;
                        region
                    }));
                    task_store
                        .update_progress(&task_id, done as u32 + 1)
                        .map_err(|e| store_error(&task_id, e))?;
                }
            }
        }

        let result = OcrResult {
            text_count: results.len(),
            results,
            processing_time_secs: processing_time.as_secs_f64(),
            duration_ms: submitted.elapsed().as_secs_f64() * 1000.0,
            page_count,
        };

        let task = task_store
            .complete(&task_id, result)
            .map_err(|e| store_error(&task_id, e))?;
        record_finished("completed", submitted);
        info!(
            "Task {} completed: {} page(s), {} region(s) in {:.0} ms",
            task_id,
            page_count,
            task.result.as_ref().map_or(0, |r| r.text_count),
            submitted.elapsed().as_secs_f64() * 1000.0
        );
        Ok(task)
    }
}

/// Waits for a permit, then starts the run.
///
/// An admission failure fails the task. Eviction of the record before
/// `mark_processing` surfaces as `TaskEvicted` carrying the task id.
async fn admit_and_start(
    run: TaskRun,
    admission: Arc<AdmissionController>,
    wait: Duration,
) -> Result<Dispatched, OrchestratorError> {
    let permit = match admission.acquire(wait).await {
        Ok(permit) => permit,
        Err(e) => {
            let failure = TaskFailure::new(ErrorKind::AdmissionTimeout, e.to_string());
            let task = fail_task(run.task_store.as_ref(), &run.task_id, failure, run.submitted)?;
            return Ok(Dispatched::finished(task));
        }
    };

    run.task_store
        .mark_processing(&run.task_id)
        .map_err(|e| store_error(&run.task_id, e))?;

    Ok(Dispatched {
        task_id: run.task_id.clone(),
        outcome: Outcome::Running(spawn_supervised(run, permit)),
    })
}

/// Spawns the run and a supervisor that turns a crashed run into a failed
/// task instead of leaving it `processing` forever.
///
/// The permit lives inside the run future, so it is released when the run
/// finishes, fails or unwinds.
fn spawn_supervised(
    run: TaskRun,
    permit: AdmissionPermit,
) -> JoinHandle<Result<Task, OrchestratorError>> {
    let task_id = run.task_id.clone();
    let submitted = run.submitted;
    let task_store = Arc::clone(&run.task_store);

    let inner = tokio::spawn(async move {
        let _permit = permit;
        run.execute().await
    });

    tokio::spawn(async move {
        match inner.await {
            Ok(result) => result,
            Err(e) => {
                error!("Run for task {} aborted: {}", task_id, e);
                let failure = TaskFailure::new(
                    ErrorKind::RecognitionError,
                    format!("task run aborted: {}", e),
                );
                if let Err(fail_err) = fail_task(task_store.as_ref(), &task_id, failure, submitted)
                {
                    warn!("Could not record failure for task {}: {}", task_id, fail_err);
                }
                Err(OrchestratorError::RunAborted(e.to_string()))
            }
        }
    })
}

fn fail_task(
    store: &dyn TaskStore,
    task_id: &str,
    failure: TaskFailure,
    submitted: Instant,
) -> Result<Task, OrchestratorError> {
    warn!("Task {} failed: {}", task_id, failure);
    let outcome = failure.kind.as_str();
    let task = store
        .fail(task_id, failure)
        .map_err(|e| store_error(task_id, e))?;
    record_finished(outcome, submitted);
    Ok(task)
}

fn record_finished(outcome: &str, submitted: Instant) {
    TASKS_FINISHED.with_label_values(&[outcome]).inc();
    TASK_DURATION
        .with_label_values(&[outcome])
        .observe(submitted.elapsed().as_secs_f64());
}

fn store_error(task_id: &str, err: TaskError) -> OrchestratorError {
    match err {
        TaskError::NotFound(_) => {
            warn!("Task {} was evicted from history while running", task_id);
            OrchestratorError::TaskEvicted(task_id.to_string())
        }
        other => {
            error!("Inconsistent task state for {}: {}", task_id, other);
            OrchestratorError::TaskStore(other)
        }
    }
}

fn deadline_failure(label: &str, submitted: Instant) -> TaskFailure {
    TaskFailure::new(
        ErrorKind::DeadlineExceeded,
        format!(
            "request deadline exceeded at {} after {} ms",
            label,
            submitted.elapsed().as_millis()
        ),
    )
}

fn unit_label(unit: &Unit) -> String {
    match unit.page {
        Some(page) => format!("page {}", page),
        None => "image".to_string(),
    }
}
