// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Heatmap point feed: one-off fetches, live refresh and the renderer toggle.

use crate::error::Result;
use crate::models::{HeatMetric, HeatPoint};
use crate::render::{OverlayRenderer, RenderBackend};
use crate::services::api::ApiClient;
use crate::services::poller::{spawn_poll, PollHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub struct HeatmapFeed {
    api: ApiClient,
    limit: u32,
    metric: Option<HeatMetric>,
    tx: Arc<watch::Sender<Vec<HeatPoint>>>,
    live: Option<PollHandle>,
}

impl HeatmapFeed {
    pub fn new(api: ApiClient, limit: u32, metric: Option<HeatMetric>) -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self {
            api,
            limit,
            metric,
            tx: Arc::new(tx),
            live: None,
        }
    }

    pub async fn fetch(&self) -> Result<Vec<HeatPoint>> {
        self.api.get_heatmap_points(self.limit, self.metric).await
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<HeatPoint>> {
        self.tx.subscribe()
    }

    pub fn points(&self) -> Vec<HeatPoint> {
        self.tx.borrow().clone()
    }

    /// Refresh points every `interval` until [`HeatmapFeed::stop_live`].
    /// Failed refreshes keep the last points.
    pub fn start_live(&mut self, interval: Duration) {
        let api = self.api.clone();
        let (limit, metric) = (self.limit, self.metric);
        let sink = Arc::clone(&self.tx);
        self.live = Some(spawn_poll(
            interval,
            move || {
                let api = api.clone();
                async move { api.get_heatmap_points(limit, metric).await }
            },
            move |result: Result<Vec<HeatPoint>>| match result {
                Ok(points) => {
                    sink.send_replace(points);
                }
                Err(e) => tracing::debug!(error = %e, "Heatmap refresh failed"),
            },
        ));
    }

    pub fn stop_live(&mut self) {
        if let Some(live) = self.live.take() {
            live.stop();
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.as_ref().is_some_and(PollHandle::is_active)
    }

    /// Show or hide the heatmap on a renderer. Returns whether it is showing.
    ///
    /// A failed fetch is logged and leaves the heatmap off; the rest of the
    /// map is unaffected.
    pub async fn toggle<B: RenderBackend>(
        &self,
        renderer: &mut OverlayRenderer<B>,
        on: bool,
    ) -> bool {
        if !on {
            renderer.hide_heatmap();
            return false;
        }
        match self.fetch().await {
            Ok(points) => {
                let shown = renderer.show_heatmap(&points);
                tracing::debug!(fetched = points.len(), shown, "Heatmap shown");
                self.tx.send_replace(points);
                renderer.heat_visible()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Heatmap unavailable");
                renderer.hide_heatmap();
                false
            }
        }
    }
}

impl Drop for HeatmapFeed {
    fn drop(&mut self) {
        self.stop_live();
    }
}
