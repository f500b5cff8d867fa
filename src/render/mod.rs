// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rendering layer.
//!
//! Two engines display the same overlays: a 2D tile map that stores positions
//! as `[lat, lng]` and a 3D globe that stores Earth-centred Cartesian points.
//! Each engine is wrapped in a [`RenderBackend`] adapter that converts from
//! GeoJSON `[lng, lat]` exactly once. The shared overlay contract (clear and
//! redraw, polygon decomposition, colouring, view fitting, drawing) lives in
//! [`OverlayRenderer`] and is implemented once for both.

pub mod color;
pub mod draw;
pub mod globe;
pub mod overlay;
pub mod tile_map;

pub use color::Hsla;
pub use draw::{DrawSession, DrawState};
pub use globe::{Cartesian3, Globe};
pub use overlay::{BoundaryListener, OverlayInput, OverlayRenderer};
pub use tile_map::{LatLng, ScreenPoint, TileMap};

use crate::models::geometry::{Bbox, LngLat, PolygonRings};
use std::fmt;

/// Errors from a rendering engine adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("{0} is not supported by this renderer")]
    Unsupported(&'static str),

    #[error("renderer has been destroyed")]
    Destroyed,

    /// Tile, terrain or imagery provider failure.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("geometry has too few valid positions to render")]
    EmptyGeometry,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonStyle {
    pub fill: Hsla,
    pub outline: Hsla,
    pub outline_width: f64,
}

impl PolygonStyle {
    pub fn boundary() -> Self {
        Self {
            fill: color::BOUNDARY_GREEN,
            outline: color::BOUNDARY_OUTLINE,
            outline_width: 2.0,
        }
    }

    pub fn detection() -> Self {
        Self {
            fill: color::DETECTION_RED,
            outline: color::DETECTION_OUTLINE,
            outline_width: 1.0,
        }
    }

    pub fn depth(depth_m: f64) -> Self {
        let fill = color::depth_color(depth_m);
        Self {
            fill,
            outline: fill.with_alpha(0.8),
            outline_width: 1.0,
        }
    }

    pub fn preview() -> Self {
        Self {
            fill: color::PREVIEW_CYAN,
            outline: color::PREVIEW_OUTLINE,
            outline_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Hsla,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub color: Hsla,
    pub radius: f64,
}

impl MarkerStyle {
    pub fn detection() -> Self {
        Self {
            color: color::DETECTION_OUTLINE,
            radius: 6.0,
        }
    }
}

/// A heatmap sample with its weight already normalised to `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatSample {
    pub at: LngLat,
    pub weight: f64,
}

/// How the camera moves to a target extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Animated flight to an explicitly requested extent.
    FlyTo,
    /// Immediate zoom to the extent of rendered primitives.
    ZoomTo,
}

/// Minimal drawing surface an engine adapter exposes.
///
/// All positions cross this boundary in GeoJSON `[lng, lat]` order; the
/// adapter converts to its native representation.
pub trait RenderBackend {
    /// Identifies one rendered primitive.
    type Handle: Copy + Eq + fmt::Debug;
    /// Raw pointer event as the engine reports it.
    type Pointer;

    fn add_polygon(
        &mut self,
        rings: &PolygonRings,
        style: &PolygonStyle,
    ) -> Result<Self::Handle, RenderError>;

    fn add_polyline(
        &mut self,
        points: &[LngLat],
        style: &LineStyle,
    ) -> Result<Self::Handle, RenderError>;

    fn add_marker(&mut self, at: LngLat, style: &MarkerStyle)
        -> Result<Self::Handle, RenderError>;

    /// Render heat samples; an engine may use one primitive or one per sample.
    fn add_heat(&mut self, samples: &[HeatSample]) -> Result<Vec<Self::Handle>, RenderError>;

    /// Remove a primitive. Returns whether it existed.
    fn remove(&mut self, handle: Self::Handle) -> bool;

    fn fit_view(&mut self, bbox: Bbox, mode: FitMode) -> Result<(), RenderError>;

    /// Resolve a pointer event to a geographic position.
    fn unproject(&self, pointer: &Self::Pointer) -> Option<LngLat>;

    fn set_terrain(&mut self, _enabled: bool) -> Result<(), RenderError> {
        Err(RenderError::Unsupported("terrain"))
    }

    /// Tear down the engine. Further calls fail with [`RenderError::Destroyed`].
    fn destroy(&mut self);
}
