// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - API access, workflows and polling.

pub mod api;
pub mod boundary;
pub mod heatmap;
pub mod jobs;
pub mod notify;
pub mod poller;
pub mod union;
pub mod visualization;

pub use api::ApiClient;
pub use boundary::{BoundaryCheck, BreachReport, UploadedBoundary};
pub use heatmap::HeatmapFeed;
pub use jobs::{preselect, JobListTracker};
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use poller::{spawn_poll, PollHandle};
pub use union::{union_boundary, UnionOutcome, UnionStatus};
pub use visualization::VisualizationTracker;
