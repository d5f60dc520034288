//! Mock sink for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::oai::sink::{Sink, SinkError, Submission};

/// A sink that accepts everything unless told to reject or stall specific records.
#[derive(Debug, Default)]
pub struct MockSink {
    delivered: Mutex<Vec<Submission>>,
    rejections: Mutex<HashMap<String, String>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject `identifier` with `message` as the repository's response text.
    pub fn reject(&self, identifier: impl Into<String>, message: impl Into<String>) {
        lock(&self.rejections).insert(identifier.into(), message.into());
    }

    /// Sleep before answering for `identifier`.
    pub fn delay(&self, identifier: impl Into<String>, delay: Duration) {
        lock(&self.delays).insert(identifier.into(), delay);
    }

    /// Every submission accepted so far, in delivery order.
    pub fn delivered(&self) -> Vec<Submission> {
        lock(&self.delivered).clone()
    }

    pub fn delivered_ids(&self) -> Vec<String> {
        lock(&self.delivered)
            .iter()
            .map(|s| s.identifier.clone())
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Sink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver(&self, submission: &Submission) -> Result<(), SinkError> {
        let delay = lock(&self.delays).get(&submission.identifier).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let rejection = lock(&self.rejections).get(&submission.identifier).cloned();
        if let Some(message) = rejection {
            return Err(SinkError::Rejected(message));
        }

        lock(&self.delivered).push(submission.clone());
        Ok(())
    }
}
