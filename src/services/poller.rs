// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cancellable fixed-interval polling.
//!
//! Every timed refresh in the client goes through [`spawn_poll`]: fetch
//! immediately, then once per interval, handing each result to `apply` only
//! while the handle is still active. Dropping the handle stops the task.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns a running poll task.
#[derive(Debug)]
pub struct PollHandle {
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    /// Stop polling. Results still in flight are discarded.
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Poll `fetch` every `interval`, starting now.
///
/// `apply` runs only while the handle is active; ticks that fall behind are
/// delayed rather than bursted. Must be called inside a Tokio runtime.
pub fn spawn_poll<T, F, Fut, A>(interval: Duration, mut fetch: F, mut apply: A) -> PollHandle
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    A: FnMut(T) + Send + 'static,
{
    let active = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&active);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !flag.load(Ordering::SeqCst) {
                break;
            }
            let result = fetch().await;
            if !flag.load(Ordering::SeqCst) {
                break;
            }
            apply(result);
        }
    });

    PollHandle { active, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate_then_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let handle = spawn_poll(
            Duration::from_secs(10),
            || async { 1usize },
            move |n| {
                seen.fetch_add(n, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        handle.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!handle.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_discards_in_flight_result() {
        let applied = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&applied);
        let handle = spawn_poll(
            Duration::from_secs(10),
            || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
            },
            move |()| {
                seen.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(applied.load(Ordering::SeqCst), 0);
    }
}
