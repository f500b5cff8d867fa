// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod aoi;
pub mod detection;
pub mod geometry;
pub mod visualization;

pub use aoi::{Aoi, ConvertedUpload, CreatedAoi, DeletedAoi, NewAoi};
pub use detection::{BreachFilters, DetectionFeature, DetectionPage, QueryMode};
pub use geometry::{Bbox, LngLat, PolygonRings, Ring};
pub use visualization::{
    DepthFeature, DetectionJob, HeatMetric, HeatPoint, JobDetail, JobStatus, Layers,
    VisualizationPayload,
};
