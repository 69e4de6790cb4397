//! Mock unit loader for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::recognizer::{JobDescriptor, LoadError, Unit, UnitLoader};

/// Mock implementation of the UnitLoader trait.
///
/// By default an `image_url` or `image_base64` job yields one unit and a
/// `page_urls` job yields one page unit per URL, with the source string's
/// bytes as the unit data.
#[derive(Debug)]
pub struct MockUnitLoader {
    /// Jobs passed to `load`, in call order.
    jobs: Arc<RwLock<Vec<JobDescriptor>>>,
    /// If set, the next load will fail with this error.
    next_error: Arc<RwLock<Option<LoadError>>>,
    /// Simulated fetch duration.
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockUnitLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUnitLoader {
    /// Create a new mock loader.
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Configure the next load to fail with the given error.
    pub async fn set_next_error(&self, error: LoadError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated fetch duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get all jobs passed to the loader.
    pub async fn recorded_jobs(&self) -> Vec<JobDescriptor> {
        self.jobs.read().await.clone()
    }

    /// Get the number of loads performed.
    pub async fn load_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

#[async_trait]
impl UnitLoader for MockUnitLoader {
    async fn load(&self, job: &JobDescriptor) -> Result<Vec<Unit>, LoadError> {
        self.jobs.write().await.push(job.clone());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if let Some(url) = &job.image_url {
            return Ok(vec![Unit::image(url.as_bytes().to_vec())]);
        }
        if let Some(data) = &job.image_base64 {
            return Ok(vec![Unit::image(data.as_bytes().to_vec())]);
        }
        Ok(job
            .page_urls
            .iter()
            .enumerate()
            .map(|(index, url)| Unit::page(index, url.as_bytes().to_vec()))
            .collect())
    }
}
