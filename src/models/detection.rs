// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Detection features returned by the boundary and browse endpoints.

use crate::models::geometry::{is_polygonal, type_name};
use geojson::{Geometry, Value};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A server-reported geometry flagged as mining activity. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFeature {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<Geometry>,
}

impl DetectionFeature {
    /// GeoJSON type name of the geometry, if any.
    pub fn geometry_type(&self) -> Option<&'static str> {
        self.geometry.as_ref().map(|g| type_name(&g.value))
    }

    pub fn is_point(&self) -> bool {
        matches!(
            self.geometry.as_ref().map(|g| &g.value),
            Some(Value::Point(_))
        )
    }

    pub fn is_polygonal(&self) -> bool {
        self.geometry
            .as_ref()
            .is_some_and(|g| is_polygonal(&g.value))
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<serde_json::Map<String, serde_json::Value>, D::Error> {
    Ok(Option::deserialize(d)?.unwrap_or_default())
}

/// How the backend classifies detections against a boundary.
///
/// The server always returns the complement: `Within` yields detections not
/// within the boundary, `Intersects` yields detections not touching it at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Within,
    Intersects,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Within => "within",
            QueryMode::Intersects => "intersects",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "within" => Ok(QueryMode::Within),
            "intersects" => Ok(QueryMode::Intersects),
            other => Err(format!("unknown query mode: {other}")),
        }
    }
}

/// Optional filters for a breach query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreachFilters {
    pub report_id: Option<String>,
    /// e.g. `["Point", "Polygon"]`; sent comma-joined
    pub geometry_types: Vec<String>,
    pub with_centroid: bool,
}

impl BreachFilters {
    /// Query-string pairs for the set filters only.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = self.report_id.as_deref().filter(|id| !id.is_empty()) {
            pairs.push(("report_id", id.to_string()));
        }
        if !self.geometry_types.is_empty() {
            pairs.push(("geometry_type", self.geometry_types.join(",")));
        }
        if self.with_centroid {
            pairs.push(("with_centroid", "true".to_string()));
        }
        pairs
    }
}

/// One page of the detection browse listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionPage {
    pub report_id: String,
    pub limit: u32,
    pub skip: u32,
    pub geometry_types: Vec<String>,
    pub with_centroid: bool,
}

impl DetectionPage {
    /// Page `page` (zero-based) of `page_size` detections.
    pub fn new(report_id: impl Into<String>, page: u32, page_size: u32) -> Self {
        Self {
            report_id: report_id.into(),
            limit: page_size,
            skip: page.saturating_mul(page_size),
            geometry_types: Vec::new(),
            with_centroid: false,
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("report_id", self.report_id.clone()),
            ("limit", self.limit.to_string()),
            ("skip", self.skip.to_string()),
        ];
        if !self.geometry_types.is_empty() {
            pairs.push(("geometry_type", self.geometry_types.join(",")));
        }
        if self.with_centroid {
            pairs.push(("with_centroid", "true".to_string()));
        }
        pairs
    }
}
