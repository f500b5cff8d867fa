// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Detection job visualization payloads, heatmap points and job listings.

use crate::models::geometry::Bbox;
use crate::time_utils;
use chrono::{DateTime, Utc};
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Detection job lifecycle as reported by the backend.
///
/// Informational only; polling does not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

fn unknown_status() -> JobStatus {
    JobStatus::Unknown
}

/// `GET /visualization/{job_id}` response. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationPayload {
    pub job_id: String,
    #[serde(default = "unknown_status", deserialize_with = "status_or_unknown")]
    pub status: JobStatus,
    #[serde(default)]
    pub layers: Layers,
    /// Metric values; the backend may send nulls or nested objects
    #[serde(default)]
    pub metrics: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub map_url: Option<String>,
    #[serde(default)]
    pub aoi_bbox: Option<Bbox>,
}

impl VisualizationPayload {
    /// Numeric metric value, if present and numeric.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).and_then(|v| v.as_f64())
    }
}

fn status_or_unknown<'de, D: serde::Deserializer<'de>>(d: D) -> Result<JobStatus, D::Error> {
    Ok(Option::<JobStatus>::deserialize(d)?.unwrap_or(JobStatus::Unknown))
}

/// Renderable layers of a visualization payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub illegal_polygons: Vec<Geometry>,
    /// Older backends only send this name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub illegal_zones: Vec<Geometry>,
    #[serde(default)]
    pub legal_boundary: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depth_polygons: Vec<DepthFeature>,
}

impl Layers {
    /// Illegal zones, preferring `illegal_polygons` over the legacy name.
    pub fn illegal(&self) -> &[Geometry] {
        if self.illegal_polygons.is_empty() {
            &self.illegal_zones
        } else {
            &self.illegal_polygons
        }
    }
}

/// Polygon annotated with an excavation depth in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthFeature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: DepthProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthProperties {
    #[serde(default)]
    pub depth: Option<f64>,
}

impl DepthFeature {
    pub fn depth(&self) -> f64 {
        self.properties.depth.unwrap_or(0.0)
    }
}

/// One heatmap sample. Intensity is on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub intensity: f64,
}

/// Which detection attribute drives heatmap intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatMetric {
    #[default]
    Density,
    Volume,
    Violations,
    Depth,
}

impl HeatMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeatMetric::Density => "density",
            HeatMetric::Volume => "volume",
            HeatMetric::Violations => "violations",
            HeatMetric::Depth => "depth",
        }
    }
}

impl std::str::FromStr for HeatMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "density" => Ok(HeatMetric::Density),
            "volume" => Ok(HeatMetric::Volume),
            "violations" => Ok(HeatMetric::Violations),
            "depth" => Ok(HeatMetric::Depth),
            other => Err(format!("unknown heatmap metric: {other}")),
        }
    }
}

/// Row of the detection job list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DetectionJob {
    pub id: String,
    #[serde(default = "unknown_status", deserialize_with = "status_or_unknown")]
    pub status: JobStatus,
    #[serde(default, with = "time_utils::lenient")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub area_illegal: Option<f64>,
    #[serde(default)]
    pub volume_cubic_m: Option<f64>,
}

/// `GET /ai/models/jobs/{id}` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    pub id: String,
    #[serde(default = "unknown_status", deserialize_with = "status_or_unknown")]
    pub status: JobStatus,
    #[serde(default, with = "time_utils::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "time_utils::lenient")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub area_legal: Option<f64>,
    #[serde(default)]
    pub area_illegal: Option<f64>,
    #[serde(default)]
    pub volume_cubic_m: Option<f64>,
    #[serde(default)]
    pub depth_stats: Option<serde_json::Value>,
    #[serde(default)]
    pub result_map_url: Option<String>,
}
