// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! 2D tile map adapter.
//!
//! Models a slippy map: a Web Mercator viewport over 256px tiles with layers
//! stored in the engine's native `[lat, lng]` order. Pointer events arrive as
//! screen pixels and are unprojected through the current viewport.

use super::color::Hsla;
use super::{
    FitMode, HeatSample, LineStyle, MarkerStyle, PolygonStyle, RenderBackend, RenderError,
};
use crate::models::geometry::{Bbox, LngLat, PolygonRings};
use std::collections::BTreeMap;
use std::f64::consts::PI;

pub const TILE_SIZE: f64 = 256.0;
pub const MAX_ZOOM: f64 = 19.0;
/// Padding in pixels kept around a fitted extent.
pub const FIT_PADDING: f64 = 20.0;
/// Latitude limit of the Web Mercator projection.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Engine-native position, latitude first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<LngLat> for LatLng {
    fn from(p: LngLat) -> Self {
        Self::new(p.lat, p.lng)
    }
}

impl From<LatLng> for LngLat {
    fn from(p: LatLng) -> Self {
        LngLat::new(p.lng, p.lat)
    }
}

/// Pixel position inside the map container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// World pixel coordinates of a position at a zoom level.
fn project(p: LatLng, zoom: f64) -> (f64, f64) {
    let size = TILE_SIZE * zoom.exp2();
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

fn unproject_world(x: f64, y: f64, zoom: f64) -> LatLng {
    let size = TILE_SIZE * zoom.exp2();
    let lng = x / size * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / size)).sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Visible area of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    /// Central India at zoom 5.
    fn default() -> Self {
        Self {
            center: LatLng::new(22.97, 78.65),
            zoom: 5.0,
            width: 1024.0,
            height: 768.0,
        }
    }
}

impl Viewport {
    pub fn screen_to_latlng(&self, point: ScreenPoint) -> LatLng {
        let (cx, cy) = project(self.center, self.zoom);
        unproject_world(
            cx + point.x - self.width / 2.0,
            cy + point.y - self.height / 2.0,
            self.zoom,
        )
    }

    pub fn latlng_to_screen(&self, p: LatLng) -> ScreenPoint {
        let (cx, cy) = project(self.center, self.zoom);
        let (x, y) = project(p, self.zoom);
        ScreenPoint {
            x: x - cx + self.width / 2.0,
            y: y - cy + self.height / 2.0,
        }
    }

    /// Centre on `bbox` at the largest whole zoom that shows all of it
    /// inside the padded viewport, capped at [`MAX_ZOOM`].
    pub fn fit_bounds(&mut self, bbox: Bbox, padding: f64) {
        let sw = LatLng::new(bbox.min_lat, bbox.min_lng);
        let ne = LatLng::new(bbox.max_lat, bbox.max_lng);
        let (x0, y0) = project(sw, 0.0);
        let (x1, y1) = project(ne, 0.0);
        let (dx, dy) = ((x1 - x0).abs(), (y1 - y0).abs());

        let avail_w = (self.width - 2.0 * padding).max(1.0);
        let avail_h = (self.height - 2.0 * padding).max(1.0);
        let scale = match (dx > 0.0, dy > 0.0) {
            (false, false) => f64::INFINITY,
            (true, false) => avail_w / dx,
            (false, true) => avail_h / dy,
            (true, true) => (avail_w / dx).min(avail_h / dy),
        };
        let zoom = scale.log2().floor().clamp(0.0, MAX_ZOOM);

        let (mx, my) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
        self.center = unproject_world(mx, my, 0.0);
        self.zoom = zoom;
    }
}

/// Identifies one layer on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(u64);

/// A layer as the tile engine holds it.
#[derive(Debug, Clone, PartialEq)]
pub enum TilePrimitive {
    Polygon {
        rings: Vec<Vec<LatLng>>,
        style: PolygonStyle,
    },
    Polyline {
        points: Vec<LatLng>,
        style: LineStyle,
    },
    CircleMarker {
        at: LatLng,
        radius: f64,
        color: Hsla,
    },
    /// `[lat, lng, weight]` triples for the density layer.
    HeatLayer { points: Vec<[f64; 3]> },
}

/// Headless 2D map engine.
#[derive(Debug, Default)]
pub struct TileMap {
    viewport: Viewport,
    layers: BTreeMap<LayerId, TilePrimitive>,
    next_id: u64,
    destroyed: bool,
}

impl TileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn layer(&self, id: LayerId) -> Option<&TilePrimitive> {
        self.layers.get(&id)
    }

    pub fn layers(&self) -> impl Iterator<Item = &TilePrimitive> {
        self.layers.values()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn insert(&mut self, primitive: TilePrimitive) -> Result<LayerId, RenderError> {
        if self.destroyed {
            return Err(RenderError::Destroyed);
        }
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.insert(id, primitive);
        Ok(id)
    }
}

impl RenderBackend for TileMap {
    type Handle = LayerId;
    type Pointer = ScreenPoint;

    fn add_polygon(
        &mut self,
        rings: &PolygonRings,
        style: &PolygonStyle,
    ) -> Result<LayerId, RenderError> {
        let rings: Vec<Vec<LatLng>> = rings
            .iter()
            .map(|ring| ring.iter().copied().map(LatLng::from).collect::<Vec<_>>())
            .filter(|ring| ring.len() >= 3)
            .collect();
        if rings.is_empty() {
            return Err(RenderError::EmptyGeometry);
        }
        self.insert(TilePrimitive::Polygon {
            rings,
            style: *style,
        })
    }

    fn add_polyline(
        &mut self,
        points: &[LngLat],
        style: &LineStyle,
    ) -> Result<LayerId, RenderError> {
        if points.len() < 2 {
            return Err(RenderError::EmptyGeometry);
        }
        self.insert(TilePrimitive::Polyline {
            points: points.iter().copied().map(LatLng::from).collect(),
            style: *style,
        })
    }

    fn add_marker(&mut self, at: LngLat, style: &MarkerStyle) -> Result<LayerId, RenderError> {
        self.insert(TilePrimitive::CircleMarker {
            at: at.into(),
            radius: style.radius,
            color: style.color,
        })
    }

    fn add_heat(&mut self, samples: &[HeatSample]) -> Result<Vec<LayerId>, RenderError> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }
        let points = samples
            .iter()
            .map(|s| [s.at.lat, s.at.lng, s.weight])
            .collect();
        Ok(vec![self.insert(TilePrimitive::HeatLayer { points })?])
    }

    fn remove(&mut self, handle: LayerId) -> bool {
        self.layers.remove(&handle).is_some()
    }

    fn fit_view(&mut self, bbox: Bbox, mode: FitMode) -> Result<(), RenderError> {
        if self.destroyed {
            return Err(RenderError::Destroyed);
        }
        self.viewport.fit_bounds(bbox, FIT_PADDING);
        tracing::debug!(
            ?mode,
            zoom = self.viewport.zoom,
            lat = self.viewport.center.lat,
            lng = self.viewport.center.lng,
            "Map view fitted"
        );
        Ok(())
    }

    fn unproject(&self, pointer: &ScreenPoint) -> Option<LngLat> {
        if self.destroyed {
            return None;
        }
        let p = self.viewport.screen_to_latlng(*pointer);
        (p.lat.is_finite() && p.lng.is_finite()).then(|| p.into())
    }

    fn destroy(&mut self) {
        self.layers.clear();
        self.destroyed = true;
    }
}
