// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Saved areas of interest and converted boundary uploads.

use geojson::{GeoJson, Geometry};
use serde::{Deserialize, Serialize};

/// A boundary persisted for reuse across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aoi {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub geometry: Geometry,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Body of `POST /gis/aois`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAoi {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub geometry: Geometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedAoi {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeletedAoi {
    pub id: String,
    pub deleted: bool,
}

/// `POST /gis/upload/convert-geojson` response: the stored shapefile id
/// and its GeoJSON rendition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConvertedUpload {
    pub id: String,
    pub geojson: GeoJson,
}
