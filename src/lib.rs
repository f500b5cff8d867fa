// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Minewatch: boundary checks and job visualization for mining surveillance
//!
//! This crate is the client side of the surveillance backend. It captures
//! lease boundaries (drawn or uploaded), asks the backend which detections
//! breach them, and renders boundaries, detections, depth overlays and
//! heatmaps on a 2D tile map or a 3D globe.

pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod services;
pub mod time_utils;

use config::Config;
use render::{Globe, OverlayRenderer, TileMap};
use services::{ApiClient, BoundaryCheck, HeatmapFeed, Notifier, VisualizationTracker};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(config: Config, notifier: Arc<dyn Notifier>) -> Self {
        let api = ApiClient::from_config(&config);
        Self {
            config,
            api,
            notifier,
        }
    }

    pub fn boundary_check(&self) -> BoundaryCheck {
        BoundaryCheck::new(self.api.clone(), Arc::clone(&self.notifier))
    }

    pub fn visualization_tracker(&self) -> VisualizationTracker {
        VisualizationTracker::new(self.api.clone(), self.config.cadence.visualization)
    }

    /// Heatmap feed; `limit` overrides the configured page size.
    pub fn heatmap_feed(
        &self,
        limit: Option<u32>,
        metric: Option<models::HeatMetric>,
    ) -> HeatmapFeed {
        let limit = limit.unwrap_or(self.config.heatmap_limit);
        HeatmapFeed::new(self.api.clone(), limit, metric)
    }

    pub fn map_renderer(&self) -> OverlayRenderer<TileMap> {
        OverlayRenderer::new(TileMap::new()).with_heat_threshold(self.config.heat_threshold)
    }

    pub fn globe_renderer(&self) -> OverlayRenderer<Globe> {
        OverlayRenderer::new(Globe::with_terrain_token(self.config.terrain_token.clone()))
            .with_heat_threshold(self.config.heat_threshold)
    }
}
