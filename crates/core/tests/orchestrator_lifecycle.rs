//! Orchestrator lifecycle integration tests.
//!
//! These tests drive jobs through the public orchestrator API with mock
//! collaborators: pending -> processing -> completed | failed

use std::sync::Arc;
use std::time::Duration;

use smartocr_core::{
    metrics::DISCARDED_RECOGNITIONS,
    testing::{fixtures, MockRecognizer, MockUnitLoader},
    AdmissionConfig, AdmissionController, DevicePool, ErrorKind, LoadError, MemoryTaskStore,
    OcrOrchestrator, OrchestratorConfig, OrchestratorError, RecognitionError, TaskFilter,
    TaskStatus, TaskStore,
};

/// Test helper holding the mocks and the knobs for one orchestrator.
struct TestHarness {
    recognizer: Arc<MockRecognizer>,
    loader: Arc<MockUnitLoader>,
    devices: Vec<u32>,
    max_concurrent: usize,
    max_queue_wait: Duration,
    deadline: Duration,
    history_capacity: usize,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            recognizer: Arc::new(MockRecognizer::new()),
            loader: Arc::new(MockUnitLoader::new()),
            devices: vec![0, 1],
            max_concurrent: 16,
            max_queue_wait: Duration::from_secs(5),
            deadline: Duration::from_secs(10),
            history_capacity: 100,
        }
    }

    fn with_recognizer_delay(mut self, delay: Duration) -> Self {
        self.recognizer = Arc::new(MockRecognizer::new().with_delay(delay));
        self
    }

    fn create_orchestrator(&self) -> Arc<OcrOrchestrator> {
        let admission = AdmissionConfig::default()
            .with_max_concurrent(self.max_concurrent)
            .with_max_queue_wait(self.max_queue_wait);
        let config = OrchestratorConfig::default().with_request_deadline(self.deadline);

        Arc::new(OcrOrchestrator::new(
            config,
            Arc::new(AdmissionController::new(&admission)),
            Arc::new(DevicePool::new(&self.devices).expect("device pool")),
            Arc::new(MemoryTaskStore::new(self.history_capacity)) as Arc<dyn TaskStore>,
            Arc::clone(&self.loader) as Arc<dyn smartocr_core::UnitLoader>,
            Arc::clone(&self.recognizer) as Arc<dyn smartocr_core::Recognizer>,
        ))
    }
}

async fn wait_until_terminal(orchestrator: &OcrOrchestrator, task_id: &str) -> Vec<f64> {
    let mut progress = Vec::new();
    let start = std::time::Instant::now();
    loop {
        let task = orchestrator
            .get_task(task_id)
            .unwrap()
            .expect("task should exist");
        progress.push(task.progress);
        if task.is_terminal() {
            return progress;
        }
        assert!(
            start.elapsed() < Duration::from_secs(10),
            "task {} never finished",
            task_id
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_document_completes_with_pages_in_order() {
    let harness = TestHarness::new();
    let orchestrator = harness.create_orchestrator();

    let task = orchestrator
        .submit_and_wait(fixtures::document_job(3))
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.total_units, 3);
    assert_eq!(task.processed_units, 3);
    assert_eq!(task.progress, 100.0);
    assert!(task.started_at.is_some());
    assert!(task.ended_at.is_some());
    assert!(task.error.is_none());

    let result = task.result.unwrap();
    assert_eq!(result.page_count, 3);
    assert_eq!(result.text_count, 3);
    let texts: Vec<_> = result.results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["unit-0", "unit-1", "unit-2"]);
    assert!(result.duration_ms >= 0.0);
}

#[tokio::test]
async fn test_second_unit_failure_stops_job() {
    let harness = TestHarness::new();
    harness
        .recognizer
        .fail_on_unit(1, RecognitionError::failed("model returned garbage"));
    let orchestrator = harness.create_orchestrator();

    let task = orchestrator
        .submit_and_wait(fixtures::document_job(3))
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.processed_units, 1);
    assert!(task.result.is_none());
    let error = task.error.unwrap();
    assert_eq!(error.kind, ErrorKind::RecognitionError);
    assert!(error.detail.contains("model returned garbage"));

    // No call for the third unit, and the permit is back.
    let calls = harness.recognizer.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.unit_index < 2));
    assert_eq!(orchestrator.status().admission.in_flight, 0);
}

#[tokio::test]
async fn test_admission_timeout_when_pool_exhausted() {
    let mut harness = TestHarness::new().with_recognizer_delay(Duration::from_millis(300));
    harness.max_concurrent = 1;
    harness.max_queue_wait = Duration::from_millis(50);
    let orchestrator = harness.create_orchestrator();

    let first = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.submit_and_wait(fixtures::image_job()).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let second = orchestrator
        .submit_and_wait(fixtures::image_job())
        .await
        .unwrap();
    assert_eq!(second.status, TaskStatus::Failed);
    assert_eq!(second.error.unwrap().kind, ErrorKind::AdmissionTimeout);
    assert!(second.started_at.is_none());

    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status, TaskStatus::Completed);
    assert_eq!(harness.recognizer.call_count(), 1);
}

#[tokio::test]
async fn test_abandoned_submission_still_reaches_terminal_state() {
    let mut harness = TestHarness::new().with_recognizer_delay(Duration::from_millis(300));
    harness.max_concurrent = 1;
    harness.max_queue_wait = Duration::from_millis(100);
    let orchestrator = harness.create_orchestrator();

    let first_id = orchestrator.submit(fixtures::image_job()).await.unwrap();

    // The caller gives up while the second job is still waiting for a permit.
    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        orchestrator.submit(fixtures::image_job()),
    )
    .await;
    assert!(abandoned.is_err());

    let newest = orchestrator.list_tasks(&TaskFilter::new()).unwrap();
    let second_id = newest[0].id.clone();
    assert_ne!(second_id, first_id);

    wait_until_terminal(&orchestrator, &second_id).await;
    wait_until_terminal(&orchestrator, &first_id).await;

    let second = orchestrator.get_task(&second_id).unwrap().unwrap();
    assert_eq!(second.status, TaskStatus::Failed);
    assert_eq!(second.error.unwrap().kind, ErrorKind::AdmissionTimeout);

    let stats = orchestrator.get_statistics().unwrap();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.processing, 0);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);

    // The permit drops right after the record turns terminal.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(orchestrator.status().admission.in_flight, 0);
}

#[tokio::test]
async fn test_eviction_before_admission_reports_task_id() {
    let mut harness = TestHarness::new().with_recognizer_delay(Duration::from_millis(200));
    harness.max_concurrent = 1;
    harness.history_capacity = 1;
    let orchestrator = harness.create_orchestrator();

    orchestrator.submit(fixtures::image_job()).await.unwrap();

    let second = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.submit(fixtures::image_job()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let third = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.submit(fixtures::image_job()).await })
    };

    // The second record is evicted by the third while waiting for the permit.
    match second.await.unwrap() {
        Err(OrchestratorError::TaskEvicted(id)) => {
            assert!(!id.is_empty());
            assert!(orchestrator.get_task(&id).unwrap().is_none());
        }
        other => panic!("expected TaskEvicted, got {:?}", other),
    }

    let third_id = third.await.unwrap().unwrap();
    wait_until_terminal(&orchestrator, &third_id).await;
    let task = orchestrator.get_task(&third_id).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(orchestrator.status().admission.in_flight, 0);
}

#[tokio::test]
async fn test_deadline_exceeded_releases_permit() {
    let mut harness = TestHarness::new().with_recognizer_delay(Duration::from_millis(400));
    harness.deadline = Duration::from_millis(100);
    let orchestrator = harness.create_orchestrator();
    let discarded_before = DISCARDED_RECOGNITIONS.get();

    let task = orchestrator
        .submit_and_wait(fixtures::document_job(2))
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error.unwrap().kind, ErrorKind::DeadlineExceeded);
    assert_eq!(task.processed_units, 0);
    assert_eq!(orchestrator.status().admission.in_flight, 0);

    // The abandoned call keeps its worker until it returns, then is discarded.
    assert_eq!(orchestrator.status().busy_workers, 1);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(orchestrator.status().busy_workers, 0);
    assert!(DISCARDED_RECOGNITIONS.get() > discarded_before);
    assert_eq!(harness.recognizer.call_count(), 1);
}

#[tokio::test]
async fn test_slow_loader_hits_deadline() {
    let mut harness = TestHarness::new();
    harness.deadline = Duration::from_millis(50);
    harness.loader.set_delay(Duration::from_millis(300)).await;
    let orchestrator = harness.create_orchestrator();

    let task = orchestrator
        .submit_and_wait(fixtures::image_job())
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error.unwrap().kind, ErrorKind::DeadlineExceeded);
    assert_eq!(harness.recognizer.call_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_jobs_respect_max_concurrent() {
    let mut harness = TestHarness::new().with_recognizer_delay(Duration::from_millis(30));
    harness.devices = vec![0, 1, 2, 3];
    harness.max_concurrent = 2;
    let orchestrator = harness.create_orchestrator();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.submit_and_wait(fixtures::image_job()).await })
        })
        .collect();

    for handle in handles {
        let task = handle.await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
    }

    assert!(harness.recognizer.max_concurrent_calls() <= 2);
    let status = orchestrator.status();
    assert_eq!(status.admission.total_admitted, 8);
    assert_eq!(status.admission.in_flight, 0);
    let dispatched: u64 = status.devices.iter().map(|d| d.dispatched).sum();
    assert_eq!(dispatched, 8);
    assert!(status.devices.iter().all(|d| d.dispatched == 2));
}

#[tokio::test]
async fn test_progress_is_monotonic() {
    let harness = TestHarness::new().with_recognizer_delay(Duration::from_millis(20));
    let orchestrator = harness.create_orchestrator();

    let task_id = orchestrator
        .submit(fixtures::document_job(5))
        .await
        .unwrap();
    let progress = wait_until_terminal(&orchestrator, &task_id).await;

    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?}", progress);
    assert_eq!(progress.last(), Some(&100.0));
}

#[tokio::test]
async fn test_load_error_is_recorded() {
    let harness = TestHarness::new();
    harness
        .loader
        .set_next_error(LoadError::HttpStatus {
            url: "http://images.test/receipt.png".to_string(),
            status: 404,
        })
        .await;
    let orchestrator = harness.create_orchestrator();

    let task_id = orchestrator.submit(fixtures::image_job()).await.unwrap();
    let task = orchestrator.get_task(&task_id).unwrap().unwrap();

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.total_units, 0);
    let error = task.error.unwrap();
    assert_eq!(error.kind, ErrorKind::LoadError);
    assert!(error.detail.contains("HTTP 404"));
    assert_eq!(orchestrator.status().admission.total_admitted, 0);
}

#[tokio::test]
async fn test_statistics_empty() {
    let orchestrator = TestHarness::new().create_orchestrator();

    let stats = orchestrator.get_statistics().unwrap();
    assert_eq!(stats.total_tasks, 0);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.processing, 0);
    assert_eq!(stats.completed, 0);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.success_rate, 0.0);
}

#[tokio::test]
async fn test_statistics_and_listing() {
    let harness = TestHarness::new();
    let orchestrator = harness.create_orchestrator();

    let completed = orchestrator
        .submit_and_wait(fixtures::image_job())
        .await
        .unwrap();
    let failed = orchestrator
        .submit_and_wait(smartocr_core::JobDescriptor::default())
        .await
        .unwrap();

    let stats = orchestrator.get_statistics().unwrap();
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.success_rate, 50.0);

    let all = orchestrator.list_tasks(&TaskFilter::new()).unwrap();
    let ids: Vec<_> = all.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![failed.id.as_str(), completed.id.as_str()]);

    let only_completed = orchestrator
        .list_tasks(&TaskFilter::new().with_status(TaskStatus::Completed))
        .unwrap();
    assert_eq!(only_completed.len(), 1);
    assert_eq!(only_completed[0].id, completed.id);
}

#[tokio::test]
async fn test_history_capacity_evicts_oldest() {
    let mut harness = TestHarness::new();
    harness.history_capacity = 2;
    let orchestrator = harness.create_orchestrator();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let task = orchestrator
            .submit_and_wait(fixtures::image_job())
            .await
            .unwrap();
        ids.push(task.id);
    }

    assert!(orchestrator.get_task(&ids[0]).unwrap().is_none());
    assert!(orchestrator.get_task(&ids[2]).unwrap().is_some());
    assert_eq!(orchestrator.status().tracked_tasks, 2);
}

#[tokio::test]
async fn test_shutdown_lets_running_tasks_finish() {
    let harness = TestHarness::new().with_recognizer_delay(Duration::from_millis(100));
    let orchestrator = harness.create_orchestrator();

    let task_id = orchestrator.submit(fixtures::image_job()).await.unwrap();
    orchestrator.shutdown();

    let rejected = orchestrator.submit(fixtures::image_job()).await;
    assert!(matches!(rejected, Err(OrchestratorError::NotRunning)));

    wait_until_terminal(&orchestrator, &task_id).await;
    let task = orchestrator.get_task(&task_id).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(!orchestrator.status().running);
}
