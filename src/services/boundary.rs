// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Boundary workflows: check a boundary for breaches, browse detections,
//! load a boundary from a shapefile or KML upload, and save it as an AOI.
//!
//! Each workflow reports its outcome to the user through a [`Notifier`] and
//! returns it to the caller.

use crate::error::{AppError, Result};
use crate::models::geometry::{parse_geojson, Bbox};
use crate::models::{
    BreachFilters, CreatedAoi, DetectionFeature, DetectionPage, NewAoi, QueryMode,
};
use crate::render::{OverlayInput, OverlayRenderer, RenderBackend};
use crate::services::api::ApiClient;
use crate::services::notify::{Notice, Notifier};
use crate::services::union::{union_boundary, UnionOutcome, UnionStatus};
use geojson::{GeoJson, Geometry, Value};
use std::path::Path;
use std::sync::Arc;

/// File extensions the converter accepts.
pub const UPLOAD_EXTENSIONS: [&str; 2] = ["zip", "kml"];

/// Result of a breach check.
#[derive(Debug, Clone)]
pub struct BreachReport {
    pub detections: Vec<DetectionFeature>,
    pub union: UnionStatus,
    /// Extent the view was fitted to, if any detection had a position
    pub bbox: Option<Bbox>,
}

/// A converted boundary upload, already unioned.
#[derive(Debug, Clone)]
pub struct UploadedBoundary {
    /// Id of the stored upload on the backend
    pub id: String,
    pub outcome: UnionOutcome,
}

pub struct BoundaryCheck {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl BoundaryCheck {
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn report_error(&self, err: &AppError) {
        if err.is_user_facing() {
            self.notifier.notify(Notice::error(err.to_string()));
        }
    }

    /// Check pasted or drawn boundary text for breaches and show the result.
    ///
    /// Malformed text is reported without contacting the server. With
    /// `only_polygons`, point and line detections are dropped before display.
    pub async fn run<B: RenderBackend>(
        &self,
        text: &str,
        mode: QueryMode,
        filters: &BreachFilters,
        only_polygons: bool,
        renderer: &mut OverlayRenderer<B>,
    ) -> Result<BreachReport> {
        let boundary = match parse_geojson(text) {
            Ok(gj) => gj,
            Err(e) => {
                self.report_error(&e);
                return Err(e);
            }
        };
        self.check(&boundary, mode, filters, only_polygons, renderer)
            .await
    }

    /// Same as [`BoundaryCheck::run`] for an already parsed boundary.
    pub async fn check<B: RenderBackend>(
        &self,
        boundary: &GeoJson,
        mode: QueryMode,
        filters: &BreachFilters,
        only_polygons: bool,
        renderer: &mut OverlayRenderer<B>,
    ) -> Result<BreachReport> {
        let outcome = union_boundary(boundary);

        let mut detections = match self
            .api
            .query_breaches(&outcome.boundary, mode, filters)
            .await
        {
            Ok(d) => d,
            Err(e) => {
                self.report_error(&e);
                return Err(e);
            }
        };
        if only_polygons {
            detections.retain(DetectionFeature::is_polygonal);
        }

        let input = OverlayInput::breaches(display_geometry(&outcome.boundary), &detections);
        if let Err(e) = renderer.update(&input) {
            tracing::warn!(error = %e, "Could not render breach results");
        }

        tracing::info!(
            %mode,
            breaches = detections.len(),
            unioned = outcome.unioned(),
            "Boundary check complete"
        );
        self.notifier.notify(Notice::success(format!(
            "{} detections outside boundary",
            detections.len()
        )));

        Ok(BreachReport {
            detections,
            union: outcome.status,
            bbox: input.bbox,
        })
    }

    /// Show one page of detections for a report, framed on the page.
    pub async fn browse<B: RenderBackend>(
        &self,
        page: &DetectionPage,
        renderer: &mut OverlayRenderer<B>,
    ) -> Result<Vec<DetectionFeature>> {
        let detections = match self.api.list_detections(page).await {
            Ok(d) => d,
            Err(e) => {
                self.report_error(&e);
                return Err(e);
            }
        };
        if let Err(e) = renderer.update(&OverlayInput::breaches(None, &detections)) {
            tracing::warn!(error = %e, "Could not render detections");
        }
        Ok(detections)
    }

    /// Convert a `.zip` shapefile or `.kml` file into a single boundary.
    pub async fn upload_boundary(&self, path: &Path) -> Result<UploadedBoundary> {
        match self.convert_upload(path).await {
            Ok(uploaded) => {
                tracing::info!(
                    id = %uploaded.id,
                    status = ?uploaded.outcome.status,
                    "Boundary uploaded"
                );
                self.notifier.notify(Notice::success(format!(
                    "Boundary loaded from {}",
                    path.display()
                )));
                Ok(uploaded)
            }
            Err(e) => {
                self.report_error(&e);
                Err(e)
            }
        }
    }

    async fn convert_upload(&self, path: &Path) -> Result<UploadedBoundary> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if !has_upload_extension(path) {
            return Err(AppError::UnsupportedUpload(file_name));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Io(format!("{}: {}", path.display(), e)))?;
        let converted = self.api.upload_convert_geojson(&file_name, bytes).await?;

        Ok(UploadedBoundary {
            id: converted.id,
            outcome: union_boundary(&converted.geojson),
        })
    }

    /// Persist a boundary as an area of interest.
    pub async fn save_aoi(&self, name: Option<String>, boundary: Geometry) -> Result<CreatedAoi> {
        let aoi = NewAoi {
            name,
            geometry: boundary,
            metadata: None,
        };
        match self.api.create_aoi(&aoi).await {
            Ok(created) => {
                self.notifier
                    .notify(Notice::success(format!("Saved area {}", created.id)));
                Ok(created)
            }
            Err(e) => {
                self.report_error(&e);
                Err(e)
            }
        }
    }
}

fn has_upload_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| UPLOAD_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// The boundary as one geometry for display.
pub fn display_geometry(boundary: &GeoJson) -> Option<Geometry> {
    match boundary {
        GeoJson::Geometry(g) => Some(g.clone()),
        GeoJson::Feature(f) => f.geometry.clone(),
        GeoJson::FeatureCollection(fc) => {
            let geometries: Vec<Geometry> = fc
                .features
                .iter()
                .filter_map(|f| f.geometry.clone())
                .collect();
            (!geometries.is_empty())
                .then(|| Geometry::new(Value::GeometryCollection(geometries)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_extension_check() {
        assert!(has_upload_extension(Path::new("/tmp/lease.zip")));
        assert!(has_upload_extension(Path::new("lease.KML")));
        assert!(!has_upload_extension(Path::new("lease.geojson")));
        assert!(!has_upload_extension(Path::new("lease")));
    }

    #[test]
    fn test_display_geometry_of_collection() {
        let gj = parse_geojson(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1,2]}},
                {"type":"Feature","properties":{},"geometry":null}
            ]}"#,
        )
        .unwrap();
        let Some(Geometry {
            value: Value::GeometryCollection(parts),
            ..
        }) = display_geometry(&gj)
        else {
            panic!("expected geometry collection");
        };
        assert_eq!(parts.len(), 1);

        let empty = parse_geojson(r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        assert!(display_geometry(&empty).is_none());
    }
}
