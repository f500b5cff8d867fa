// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! 3D globe adapter.
//!
//! Entities are stored as Earth-centred, Earth-fixed Cartesian positions on
//! the WGS84 ellipsoid. Pointer events arrive as globe pick results, which are
//! `None` when the click misses the globe.

use super::color::{heat_color, Hsla};
use super::{
    FitMode, HeatSample, LineStyle, MarkerStyle, PolygonStyle, RenderBackend, RenderError,
};
use crate::models::geometry::{Bbox, LngLat, PolygonRings};
use std::collections::BTreeMap;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);
const WGS84_EP2: f64 = (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);

/// Default camera rectangle over India, `[west, south, east, north]`.
pub const DEFAULT_CAMERA: Bbox = Bbox {
    min_lng: 68.0,
    min_lat: 7.0,
    max_lng: 97.5,
    max_lat: 37.0,
};

/// ECEF position in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cartesian3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cartesian3 {
    pub fn from_degrees(lng: f64, lat: f64, height: f64) -> Self {
        let (lat, lon) = (lat.to_radians(), lng.to_radians());
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        Self {
            x: (n + height) * cos_lat * cos_lon,
            y: (n + height) * cos_lat * sin_lon,
            z: (n * (1.0 - WGS84_E2) + height) * sin_lat,
        }
    }

    /// Geodetic position and height above the ellipsoid.
    pub fn to_degrees(self) -> (LngLat, f64) {
        let p = self.x.hypot(self.y);
        let lon = self.y.atan2(self.x);

        let theta = (self.z * WGS84_A).atan2(p * WGS84_B);
        let (sin_t, cos_t) = theta.sin_cos();
        let lat = (self.z + WGS84_EP2 * WGS84_B * sin_t.powi(3))
            .atan2(p - WGS84_E2 * WGS84_A * cos_t.powi(3));

        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let height = p / lat.cos() - n;

        (LngLat::new(lon.to_degrees(), lat.to_degrees()), height)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<LngLat> for Cartesian3 {
    fn from(p: LngLat) -> Self {
        Self::from_degrees(p.lng, p.lat, 0.0)
    }
}

/// Identifies one entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

/// An entity as the globe scene holds it.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobeEntity {
    Polygon {
        hierarchy: Vec<Cartesian3>,
        holes: Vec<Vec<Cartesian3>>,
        material: Hsla,
        outline: Hsla,
    },
    Polyline {
        positions: Vec<Cartesian3>,
        width: f64,
        material: Hsla,
    },
    Point {
        position: Cartesian3,
        pixel_size: f64,
        color: Hsla,
    },
    Billboard {
        position: Cartesian3,
        scale: f64,
        color: Hsla,
    },
}

/// Camera state. The destination is a degree rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub destination: Bbox,
    pub last_move: Option<FitMode>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            destination: DEFAULT_CAMERA,
            last_move: None,
        }
    }
}

/// Headless 3D globe engine.
#[derive(Debug, Default)]
pub struct Globe {
    entities: BTreeMap<EntityId, GlobeEntity>,
    camera: Camera,
    terrain_token: Option<String>,
    terrain: bool,
    next_id: u64,
    destroyed: bool,
}

impl Globe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Globe that can stream terrain with the given provider token.
    pub fn with_terrain_token(token: Option<String>) -> Self {
        Self {
            terrain_token: token,
            ..Self::default()
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn terrain_enabled(&self) -> bool {
        self.terrain
    }

    pub fn entity(&self, id: EntityId) -> Option<&GlobeEntity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &GlobeEntity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn add(&mut self, entity: GlobeEntity) -> Result<EntityId, RenderError> {
        if self.destroyed {
            return Err(RenderError::Destroyed);
        }
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.entities.insert(id, entity);
        Ok(id)
    }
}

fn to_cartesian(ring: &[LngLat]) -> Vec<Cartesian3> {
    ring.iter().copied().map(Cartesian3::from).collect()
}

/// Billboard scale for a normalised heat weight.
pub fn heat_scale(weight: f64) -> f64 {
    0.8 + weight.clamp(0.2, 1.0)
}

impl RenderBackend for Globe {
    type Handle = EntityId;
    type Pointer = Option<Cartesian3>;

    fn add_polygon(
        &mut self,
        rings: &PolygonRings,
        style: &PolygonStyle,
    ) -> Result<EntityId, RenderError> {
        let Some((exterior, holes)) = rings.split_first() else {
            return Err(RenderError::EmptyGeometry);
        };
        if exterior.len() < 3 {
            return Err(RenderError::EmptyGeometry);
        }
        self.add(GlobeEntity::Polygon {
            hierarchy: to_cartesian(exterior),
            holes: holes
                .iter()
                .filter(|h| h.len() >= 3)
                .map(|h| to_cartesian(h))
                .collect(),
            material: style.fill,
            outline: style.outline,
        })
    }

    fn add_polyline(
        &mut self,
        points: &[LngLat],
        style: &LineStyle,
    ) -> Result<EntityId, RenderError> {
        if points.len() < 2 {
            return Err(RenderError::EmptyGeometry);
        }
        self.add(GlobeEntity::Polyline {
            positions: to_cartesian(points),
            width: style.width,
            material: style.color,
        })
    }

    fn add_marker(&mut self, at: LngLat, style: &MarkerStyle) -> Result<EntityId, RenderError> {
        self.add(GlobeEntity::Point {
            position: at.into(),
            pixel_size: style.radius * 2.0,
            color: style.color,
        })
    }

    fn add_heat(&mut self, samples: &[HeatSample]) -> Result<Vec<EntityId>, RenderError> {
        samples
            .iter()
            .map(|s| {
                self.add(GlobeEntity::Billboard {
                    position: s.at.into(),
                    scale: heat_scale(s.weight),
                    color: heat_color(s.weight),
                })
            })
            .collect()
    }

    fn remove(&mut self, handle: EntityId) -> bool {
        self.entities.remove(&handle).is_some()
    }

    fn fit_view(&mut self, bbox: Bbox, mode: FitMode) -> Result<(), RenderError> {
        if self.destroyed {
            return Err(RenderError::Destroyed);
        }
        self.camera = Camera {
            destination: bbox,
            last_move: Some(mode),
        };
        tracing::debug!(?mode, ?bbox, "Globe camera moved");
        Ok(())
    }

    fn unproject(&self, pointer: &Option<Cartesian3>) -> Option<LngLat> {
        let picked = (*pointer)?;
        if self.destroyed || !picked.is_finite() {
            return None;
        }
        Some(picked.to_degrees().0)
    }

    fn set_terrain(&mut self, enabled: bool) -> Result<(), RenderError> {
        if self.destroyed {
            return Err(RenderError::Destroyed);
        }
        if enabled && self.terrain_token.is_none() {
            return Err(RenderError::Provider(
                "terrain provider requires an access token".to_string(),
            ));
        }
        self.terrain = enabled;
        Ok(())
    }

    fn destroy(&mut self) {
        self.entities.clear();
        self.terrain = false;
        self.destroyed = true;
    }
}
