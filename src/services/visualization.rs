// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live visualization of the selected detection job.
//!
//! Selecting a job cancels the previous poller and starts a new one that
//! fetches the job's payload immediately and then on a fixed cadence. Each
//! selection gets a generation number; a response is published only if its
//! generation is still current, so a slow answer for an old job can never
//! overwrite the new one.

use crate::error::Result;
use crate::models::VisualizationPayload;
use crate::services::api::ApiClient;
use crate::services::poller::{spawn_poll, PollHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub struct VisualizationTracker {
    api: ApiClient,
    interval: Duration,
    generation: Arc<AtomicU64>,
    selected: Option<String>,
    tx: Arc<watch::Sender<Option<VisualizationPayload>>>,
    poll: Option<PollHandle>,
}

impl VisualizationTracker {
    pub fn new(api: ApiClient, interval: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            api,
            interval,
            generation: Arc::new(AtomicU64::new(0)),
            selected: None,
            poll: None,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Receiver of every payload that is applied; `None` when nothing is selected.
    pub fn subscribe(&self) -> watch::Receiver<Option<VisualizationPayload>> {
        self.tx.subscribe()
    }

    /// Payload currently displayed.
    pub fn current(&self) -> Option<VisualizationPayload> {
        self.tx.borrow().clone()
    }

    /// Switch to another job, or stop tracking with `None`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn select(&mut self, job_id: Option<String>) {
        if let Some(poll) = self.poll.take() {
            poll.stop();
        }
        // Bumped under the channel lock so an in-flight apply either lands
        // before this or sees the new generation.
        let counter = &self.generation;
        let deselect = job_id.is_none();
        let mut generation = 0;
        self.tx.send_if_modified(|current| {
            generation = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if deselect {
                *current = None;
            }
            deselect
        });
        self.selected = job_id.clone();

        let Some(job_id) = job_id else {
            return;
        };
        tracing::info!(job_id = %job_id, "Tracking job visualization");

        let api = self.api.clone();
        let fetch_id = job_id.clone();
        let fetch = move || {
            let api = api.clone();
            let job_id = fetch_id.clone();
            async move { api.get_visualization(&job_id).await }
        };

        let counter = Arc::clone(&self.generation);
        let tx = Arc::clone(&self.tx);
        let apply = move |result: Result<VisualizationPayload>| {
            publish(&tx, &counter, generation, &job_id, result);
        };

        self.poll = Some(spawn_poll(self.interval, fetch, apply));
    }

    /// Stop polling and clear the displayed payload.
    pub fn stop(&mut self) {
        self.select(None);
    }
}

/// Publish a fetch result if `generation` is still current. The check and
/// the write happen under the channel lock. Returns whether it was published.
fn publish(
    tx: &watch::Sender<Option<VisualizationPayload>>,
    counter: &AtomicU64,
    generation: u64,
    job_id: &str,
    result: Result<VisualizationPayload>,
) -> bool {
    tx.send_if_modified(|current| {
        if counter.load(Ordering::SeqCst) != generation {
            tracing::debug!(job_id, "Discarding stale visualization response");
            return false;
        }
        match result {
            Ok(payload) => {
                *current = Some(payload);
                true
            }
            Err(e) => {
                tracing::warn!(job_id, error = %e, "Visualization refresh failed");
                false
            }
        }
    })
}

impl Drop for VisualizationTracker {
    fn drop(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::JobStatus;

    fn payload(job_id: &str) -> VisualizationPayload {
        serde_json::from_value(serde_json::json!({"job_id": job_id, "status": "completed"}))
            .unwrap()
    }

    #[test]
    fn test_publish_only_for_current_generation() {
        let (tx, rx) = watch::channel(None);
        let counter = AtomicU64::new(1);

        assert!(publish(&tx, &counter, 1, "a", Ok(payload("a"))));
        assert_eq!(rx.borrow().as_ref().map(|p| p.job_id.as_str()), Some("a"));

        // deselected while the response for generation 1 was landing
        tx.send_if_modified(|current| {
            counter.fetch_add(1, Ordering::SeqCst);
            *current = None;
            true
        });
        assert!(!publish(&tx, &counter, 1, "a", Ok(payload("a"))));
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn test_failed_fetch_keeps_payload() {
        let (tx, rx) = watch::channel(Some(payload("a")));
        let counter = AtomicU64::new(3);

        let err = AppError::Http {
            status: 500,
            body: "down".to_string(),
        };
        assert!(!publish(&tx, &counter, 3, "a", Err(err)));
        assert_eq!(
            rx.borrow().as_ref().map(|p| p.status),
            Some(JobStatus::Completed)
        );
    }
}
