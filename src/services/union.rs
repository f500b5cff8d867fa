// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-effort union of multi-feature boundaries.
//!
//! A boundary uploaded or pasted as a `FeatureCollection` may carry several
//! polygon features. The backend wants a single geometry, so polygonal
//! features are folded together with a pairwise polygon union. Union is an
//! optimization, never a requirement: on any failure the original input is
//! sent unchanged and the outcome says so.

use crate::models::geometry::is_polygonal;
use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use geojson::{GeoJson, Geometry, Value};
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

/// Boundary to send downstream plus how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionOutcome {
    pub boundary: GeoJson,
    pub status: UnionStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnionStatus {
    /// Several polygonal features were merged into one geometry.
    Merged { inputs: usize, parts: usize },
    /// Exactly one polygonal feature; its geometry is passed through as-is.
    Single,
    /// The collection has no polygonal feature; the input is passed through.
    NoPolygons,
    /// Input is a bare geometry or feature; nothing to merge.
    NotACollection,
    /// Union was attempted and failed; the input is passed through.
    Failed(String),
}

impl UnionOutcome {
    /// Whether a merge actually happened.
    pub fn unioned(&self) -> bool {
        matches!(self.status, UnionStatus::Merged { .. })
    }

    fn passthrough(input: &GeoJson, status: UnionStatus) -> Self {
        Self {
            boundary: input.clone(),
            status,
        }
    }
}

/// Errors from the union primitive. Never surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum UnionError {
    #[error("ring {ring} of feature {feature} has an invalid position")]
    InvalidPosition { feature: usize, ring: usize },

    #[error("ring {ring} of feature {feature} is not closed or has fewer than 4 positions")]
    OpenRing { feature: usize, ring: usize },

    #[error("polygon union panicked")]
    Primitive,

    #[error("union produced an empty geometry")]
    Empty,
}

/// Merge the polygonal features of a `FeatureCollection` into one geometry.
///
/// Non-polygon features are ignored. Features are folded left starting from
/// the first polygonal feature. A merged result is a bare `Polygon` when it
/// has one part and a `MultiPolygon` otherwise.
pub fn union_boundary(input: &GeoJson) -> UnionOutcome {
    let GeoJson::FeatureCollection(collection) = input else {
        return UnionOutcome::passthrough(input, UnionStatus::NotACollection);
    };

    let polygons: Vec<&Geometry> = collection
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .filter(|g| is_polygonal(&g.value))
        .collect();

    match polygons.as_slice() {
        [] => UnionOutcome::passthrough(input, UnionStatus::NoPolygons),
        [single] => UnionOutcome {
            boundary: GeoJson::Geometry((*single).clone()),
            status: UnionStatus::Single,
        },
        many => match union_all(many) {
            Ok(merged) => {
                let parts = merged.0.len();
                tracing::debug!(inputs = many.len(), parts, "Merged boundary polygons");
                UnionOutcome {
                    boundary: GeoJson::Geometry(to_geometry(&merged)),
                    status: UnionStatus::Merged {
                        inputs: many.len(),
                        parts,
                    },
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Boundary union skipped, sending input as-is");
                UnionOutcome::passthrough(input, UnionStatus::Failed(e.to_string()))
            }
        },
    }
}

fn union_all(geometries: &[&Geometry]) -> Result<MultiPolygon<f64>, UnionError> {
    let converted = geometries
        .iter()
        .enumerate()
        .map(|(i, g)| to_multi_polygon(i, &g.value))
        .collect::<Result<Vec<_>, _>>()?;

    let mut iter = converted.into_iter();
    let first = iter.next().ok_or(UnionError::Empty)?;

    let merged = catch_quietly(move || iter.fold(first, |acc, next| acc.union(&next)))
        .map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("unknown");
            tracing::debug!(panic = message, "Polygon union panicked");
            UnionError::Primitive
        })?;

    if merged.0.is_empty() {
        return Err(UnionError::Empty);
    }
    Ok(merged)
}

/// Run `f`, catching a panic without the default hook printing it to stderr.
/// Panics on other threads still reach the previously installed hook.
fn catch_quietly<T>(f: impl FnOnce() -> T) -> std::thread::Result<T> {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });

    QUIET_PANICS.with(|quiet| quiet.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    QUIET_PANICS.with(|quiet| quiet.set(false));
    result
}

/// Convert a polygonal GeoJSON value, validating every ring.
pub(crate) fn to_multi_polygon(
    feature: usize,
    value: &Value,
) -> Result<MultiPolygon<f64>, UnionError> {
    let polygon = |rings: &Vec<Vec<Vec<f64>>>| -> Result<Polygon<f64>, UnionError> {
        let mut rings = rings
            .iter()
            .enumerate()
            .map(|(ring, positions)| to_ring(feature, ring, positions));
        let exterior = rings.next().unwrap_or(Err(UnionError::OpenRing { feature, ring: 0 }))?;
        let holes = rings.collect::<Result<Vec<_>, _>>()?;
        Ok(Polygon::new(exterior, holes))
    };

    match value {
        Value::Polygon(rings) => Ok(MultiPolygon::new(vec![polygon(rings)?])),
        Value::MultiPolygon(polys) => polys
            .iter()
            .map(polygon)
            .collect::<Result<Vec<_>, _>>()
            .map(MultiPolygon::new),
        _ => Ok(MultiPolygon::new(Vec::new())),
    }
}

fn to_ring(
    feature: usize,
    ring: usize,
    positions: &[Vec<f64>],
) -> Result<LineString<f64>, UnionError> {
    let coords = positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            _ => Err(UnionError::InvalidPosition { feature, ring }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if coords.len() < 4 || coords.first() != coords.last() {
        return Err(UnionError::OpenRing { feature, ring });
    }
    Ok(LineString::new(coords))
}

fn to_geometry(merged: &MultiPolygon<f64>) -> Geometry {
    match merged.0.as_slice() {
        [single] => Geometry::new(Value::from(single)),
        _ => Geometry::new(Value::from(merged)),
    }
}
