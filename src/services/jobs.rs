// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Detection job list refresh and default selection.

use crate::error::Result;
use crate::models::{DetectionJob, JobStatus};
use crate::services::api::ApiClient;
use crate::services::poller::{spawn_poll, PollHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Job to show when a view opens: the requested one if listed, else the
/// first completed job, else the first job.
pub fn preselect<'a>(
    jobs: &'a [DetectionJob],
    requested: Option<&str>,
) -> Option<&'a DetectionJob> {
    requested
        .and_then(|id| jobs.iter().find(|j| j.id == id))
        .or_else(|| jobs.iter().find(|j| j.status == JobStatus::Completed))
        .or_else(|| jobs.first())
}

/// Keeps the job list fresh on a timer.
pub struct JobListTracker {
    tx: Arc<watch::Sender<Vec<DetectionJob>>>,
    poll: PollHandle,
}

impl JobListTracker {
    /// Start polling the job list. Must be called inside a Tokio runtime.
    pub fn start(api: ApiClient, interval: Duration) -> Self {
        let tx = Arc::new(watch::channel(Vec::new()).0);
        let sink = Arc::clone(&tx);
        let poll = spawn_poll(
            interval,
            move || {
                let api = api.clone();
                async move { api.list_detection_jobs().await }
            },
            move |result: Result<Vec<DetectionJob>>| match result {
                Ok(jobs) => {
                    sink.send_replace(jobs);
                }
                Err(e) => tracing::warn!(error = %e, "Job list refresh failed"),
            },
        );
        Self { tx, poll }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<DetectionJob>> {
        self.tx.subscribe()
    }

    pub fn jobs(&self) -> Vec<DetectionJob> {
        self.tx.borrow().clone()
    }

    pub fn stop(&self) {
        self.poll.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, status: JobStatus) -> DetectionJob {
        DetectionJob {
            id: id.to_string(),
            status,
            created_at: None,
            area_illegal: None,
            volume_cubic_m: None,
        }
    }

    #[test]
    fn test_preselect_order() {
        let jobs = vec![
            job("a", JobStatus::Running),
            job("b", JobStatus::Completed),
            job("c", JobStatus::Completed),
        ];
        assert_eq!(preselect(&jobs, Some("c")).unwrap().id, "c");
        assert_eq!(preselect(&jobs, Some("missing")).unwrap().id, "b");
        assert_eq!(preselect(&jobs, None).unwrap().id, "b");

        let pending = vec![job("x", JobStatus::Queued), job("y", JobStatus::Failed)];
        assert_eq!(preselect(&pending, None).unwrap().id, "x");
        assert!(preselect(&[], Some("x")).is_none());
    }
}
