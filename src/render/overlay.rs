// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Overlay reconciliation shared by both renderers.
//!
//! Every update removes all previously rendered boundary, detection and depth
//! primitives and draws the new set from scratch. Heat primitives and the
//! draw preview are tracked separately so an update does not disturb them.

use super::color::normalize_intensity;
use super::draw::DrawSession;
use super::{
    DrawState, FitMode, HeatSample, LineStyle, MarkerStyle, PolygonStyle, RenderBackend,
    RenderError,
};
use crate::models::geometry::{polygon_parts, Bbox, LngLat};
use crate::models::{DepthFeature, DetectionFeature, HeatPoint, VisualizationPayload};
use geojson::{Geometry, Value};

/// Called with the finished polygon, or `None` when the drawing is cleared.
pub type BoundaryListener = Box<dyn FnMut(Option<Geometry>) + Send>;

/// Default heatmap threshold on the 0-100 intensity scale.
pub const DEFAULT_HEAT_THRESHOLD: f64 = 70.0;

/// Everything one overlay update draws.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayInput {
    pub boundary: Option<Geometry>,
    pub detections: Vec<Geometry>,
    pub depth: Vec<DepthFeature>,
    /// Explicit extent to fly to; when absent the view fits rendered bounds.
    pub bbox: Option<Bbox>,
}

impl OverlayInput {
    /// Breach results over the queried boundary, framed on the breaches.
    pub fn breaches(boundary: Option<Geometry>, detections: &[DetectionFeature]) -> Self {
        let geometries: Vec<Geometry> = detections
            .iter()
            .filter_map(|d| d.geometry.clone())
            .collect();
        let bbox = Bbox::of_geometries(&geometries);
        Self {
            boundary,
            detections: geometries,
            depth: Vec::new(),
            bbox,
        }
    }
}

impl From<&VisualizationPayload> for OverlayInput {
    fn from(payload: &VisualizationPayload) -> Self {
        Self {
            boundary: payload.layers.legal_boundary.clone(),
            detections: payload.layers.illegal().to_vec(),
            depth: payload.layers.depth_polygons.clone(),
            bbox: payload.aoi_bbox,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Layer {
    Boundary,
    Detection,
    Depth(f64),
}

impl Layer {
    fn polygon_style(self) -> PolygonStyle {
        match self {
            Layer::Boundary => PolygonStyle::boundary(),
            Layer::Detection => PolygonStyle::detection(),
            Layer::Depth(d) => PolygonStyle::depth(d),
        }
    }

    fn line_style(self) -> LineStyle {
        let style = self.polygon_style();
        LineStyle {
            color: style.outline,
            width: style.outline_width.max(2.0),
        }
    }
}

/// One rendering surface plus its overlay bookkeeping and draw session.
pub struct OverlayRenderer<B: RenderBackend> {
    backend: B,
    overlays: Vec<B::Handle>,
    heat: Vec<B::Handle>,
    heat_points: Vec<HeatPoint>,
    heat_visible: bool,
    heat_threshold: f64,
    preview: Option<B::Handle>,
    draw: DrawSession,
    listener: Option<BoundaryListener>,
    destroyed: bool,
}

impl<B: RenderBackend> OverlayRenderer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            overlays: Vec::new(),
            heat: Vec::new(),
            heat_points: Vec::new(),
            heat_visible: false,
            heat_threshold: DEFAULT_HEAT_THRESHOLD,
            preview: None,
            draw: DrawSession::new(),
            listener: None,
            destroyed: false,
        }
    }

    pub fn with_heat_threshold(mut self, threshold: f64) -> Self {
        self.heat_threshold = threshold;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Register the receiver of finished and cleared boundaries.
    pub fn on_boundary(&mut self, listener: BoundaryListener) {
        self.listener = Some(listener);
    }

    /// Number of boundary, detection and depth primitives currently shown.
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Replace all overlays with `input` and frame the result.
    ///
    /// Returns the number of primitives rendered. Geometries the engine
    /// rejects are skipped.
    pub fn update(&mut self, input: &OverlayInput) -> Result<usize, RenderError> {
        if self.destroyed {
            return Err(RenderError::Destroyed);
        }
        self.clear_overlays();

        let mut bounds: Option<Bbox> = None;
        if let Some(boundary) = &input.boundary {
            self.render_geometry(boundary, Layer::Boundary, &mut bounds);
        }
        for detection in &input.detections {
            self.render_geometry(detection, Layer::Detection, &mut bounds);
        }
        for feature in &input.depth {
            self.render_geometry(&feature.geometry, Layer::Depth(feature.depth()), &mut bounds);
        }

        let target = match (input.bbox, bounds) {
            (Some(bbox), _) => Some((bbox, FitMode::FlyTo)),
            (None, Some(bbox)) => Some((bbox, FitMode::ZoomTo)),
            (None, None) => None,
        };
        if let Some((bbox, mode)) = target {
            self.backend.fit_view(bbox, mode)?;
        }

        tracing::debug!(primitives = self.overlays.len(), "Overlays updated");
        Ok(self.overlays.len())
    }

    /// Fly to an extent without touching overlays.
    pub fn fit_to(&mut self, bbox: Bbox) -> Result<(), RenderError> {
        if self.destroyed {
            return Err(RenderError::Destroyed);
        }
        self.backend.fit_view(bbox, FitMode::FlyTo)
    }

    fn clear_overlays(&mut self) {
        for handle in self.overlays.drain(..) {
            self.backend.remove(handle);
        }
    }

    fn render_geometry(&mut self, geometry: &Geometry, layer: Layer, bounds: &mut Option<Bbox>) {
        self.render_value(&geometry.value, layer, bounds);
    }

    fn render_value(&mut self, value: &Value, layer: Layer, bounds: &mut Option<Bbox>) {
        match value {
            Value::Polygon(_) | Value::MultiPolygon(_) => {
                let style = layer.polygon_style();
                for part in polygon_parts(value) {
                    let added = self.backend.add_polygon(&part, &style);
                    let extent = part.first().and_then(|ring| ring_bounds(ring));
                    self.track(added, extent, bounds);
                }
            }
            Value::Point(p) => self.render_point(p, bounds),
            Value::MultiPoint(points) => {
                for p in points {
                    self.render_point(p, bounds);
                }
            }
            Value::LineString(line) => self.render_line(line, layer, bounds),
            Value::MultiLineString(lines) => {
                for line in lines {
                    self.render_line(line, layer, bounds);
                }
            }
            Value::GeometryCollection(geometries) => {
                for g in geometries {
                    self.render_value(&g.value, layer, bounds);
                }
            }
        }
    }

    fn render_point(&mut self, position: &[f64], bounds: &mut Option<Bbox>) {
        match LngLat::from_position(position) {
            Some(at) => {
                let added = self.backend.add_marker(at, &MarkerStyle::detection());
                self.track(added, Some(Bbox::from_point(at)), bounds);
            }
            None => tracing::debug!("Skipping point with invalid position"),
        }
    }

    fn render_line(&mut self, line: &[Vec<f64>], layer: Layer, bounds: &mut Option<Bbox>) {
        let points: Vec<LngLat> = line.iter().filter_map(|p| LngLat::from_position(p)).collect();
        let added = self.backend.add_polyline(&points, &layer.line_style());
        self.track(added, ring_bounds(&points), bounds);
    }

    fn track(
        &mut self,
        added: Result<B::Handle, RenderError>,
        extent: Option<Bbox>,
        bounds: &mut Option<Bbox>,
    ) {
        match added {
            Ok(handle) => {
                self.overlays.push(handle);
                if let Some(extent) = extent {
                    *bounds = Some(match bounds.take() {
                        Some(b) => b.merge(extent),
                        None => extent,
                    });
                }
            }
            Err(e) => tracing::debug!(error = %e, "Skipping unrenderable geometry"),
        }
    }

    // Heatmap

    pub fn heat_threshold(&self) -> f64 {
        self.heat_threshold
    }

    pub fn heat_visible(&self) -> bool {
        self.heat_visible
    }

    /// Show heat points at or above the threshold, replacing any shown before.
    ///
    /// Returns the number of samples handed to the engine. Engine failures are
    /// logged and leave the heatmap hidden.
    pub fn show_heatmap(&mut self, points: &[HeatPoint]) -> usize {
        if self.destroyed {
            return 0;
        }
        self.heat_points = points.to_vec();
        self.heat_visible = true;
        self.render_heat()
    }

    pub fn hide_heatmap(&mut self) {
        self.heat_visible = false;
        self.clear_heat();
    }

    /// Change the threshold and re-filter the heatmap if it is showing.
    pub fn set_heat_threshold(&mut self, threshold: f64) -> usize {
        self.heat_threshold = threshold;
        if self.heat_visible {
            self.render_heat()
        } else {
            0
        }
    }

    fn clear_heat(&mut self) {
        for handle in self.heat.drain(..) {
            self.backend.remove(handle);
        }
    }

    fn render_heat(&mut self) -> usize {
        self.clear_heat();
        if self.destroyed {
            return 0;
        }
        let samples = heat_samples(&self.heat_points, self.heat_threshold);
        match self.backend.add_heat(&samples) {
            Ok(handles) => {
                self.heat = handles;
                samples.len()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Heatmap unavailable");
                self.heat_visible = false;
                0
            }
        }
    }

    /// Switch terrain on or off. Returns whether terrain is now on.
    pub fn toggle_terrain(&mut self, enabled: bool) -> bool {
        if self.destroyed {
            return false;
        }
        match self.backend.set_terrain(enabled) {
            Ok(()) => enabled,
            Err(e) => {
                tracing::debug!(error = %e, enabled, "Terrain toggle failed");
                false
            }
        }
    }

    // Drawing

    pub fn draw_state(&self) -> DrawState {
        self.draw.state()
    }

    pub fn draw_vertices(&self) -> &[LngLat] {
        self.draw.vertices()
    }

    /// Begin a new drawing, discarding any draft and its preview.
    pub fn start_drawing(&mut self) {
        self.remove_preview();
        self.draw.start();
    }

    /// Append the vertex under the pointer. Returns whether one was added.
    pub fn place_point(&mut self, pointer: &B::Pointer) -> bool {
        let at = self.backend.unproject(pointer);
        let placed = self.draw.place(at);
        if placed {
            self.sync_preview();
        }
        placed
    }

    /// Place the vertex under the pointer, then finish.
    pub fn place_and_finish(&mut self, pointer: &B::Pointer) -> Option<Geometry> {
        self.place_point(pointer);
        self.finish_drawing()
    }

    /// Close the ring and hand the polygon to the boundary listener.
    pub fn finish_drawing(&mut self) -> Option<Geometry> {
        let polygon = self.draw.finish()?;
        self.remove_preview();
        self.emit(Some(polygon.clone()));
        Some(polygon)
    }

    pub fn undo_point(&mut self) -> bool {
        let undone = self.draw.undo();
        if undone {
            self.sync_preview();
        }
        undone
    }

    /// Discard the draft and tell the listener the boundary is gone.
    pub fn clear_drawing(&mut self) {
        self.draw.clear();
        self.remove_preview();
        self.emit(None);
    }

    fn emit(&mut self, boundary: Option<Geometry>) {
        if let Some(listener) = self.listener.as_mut() {
            listener(boundary);
        }
    }

    fn remove_preview(&mut self) {
        if let Some(handle) = self.preview.take() {
            self.backend.remove(handle);
        }
    }

    fn sync_preview(&mut self) {
        self.remove_preview();
        let Some(open) = self.draw.preview() else {
            return;
        };
        let rings = vec![open.to_vec()];
        match self.backend.add_polygon(&rings, &PolygonStyle::preview()) {
            Ok(handle) => self.preview = Some(handle),
            Err(e) => tracing::debug!(error = %e, "Draw preview not rendered"),
        }
    }

    /// Detach listeners, remove every primitive and tear down the engine.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.listener = None;
        self.draw.clear();
        self.remove_preview();
        self.clear_overlays();
        self.clear_heat();
        self.heat_visible = false;
        self.backend.destroy();
        self.destroyed = true;
    }
}

impl<B: RenderBackend> Drop for OverlayRenderer<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Heat points at or above `threshold`, weights normalised to `0..=1`.
pub fn heat_samples(points: &[HeatPoint], threshold: f64) -> Vec<HeatSample> {
    points
        .iter()
        .filter(|p| p.intensity >= threshold)
        .filter(|p| p.lat.is_finite() && p.lng.is_finite())
        .map(|p| HeatSample {
            at: LngLat::new(p.lng, p.lat),
            weight: normalize_intensity(p.intensity),
        })
        .collect()
}

fn ring_bounds(points: &[LngLat]) -> Option<Bbox> {
    let (first, rest) = points.split_first()?;
    let mut bbox = Bbox::from_point(*first);
    for p in rest {
        bbox.extend(*p);
    }
    Some(bbox)
}
