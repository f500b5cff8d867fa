// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GeoJSON helpers: positions, bounding boxes and polygon decomposition.
//!
//! Everything here works in GeoJSON `[longitude, latitude]` order. Renderers
//! convert to their own native ordering at the adapter boundary.

use crate::error::{AppError, Result};
use geojson::{GeoJson, Geometry, Value};
use serde::{Deserialize, Serialize};

/// A `[lng, lat]` position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Read a GeoJSON position. Altitude is dropped; short or non-finite
    /// positions yield `None`.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Some(Self::new(*lng, *lat)),
            _ => None,
        }
    }

    pub fn to_position(self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self::new(lng, lat)
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

/// Linear ring of positions.
pub type Ring = Vec<LngLat>;

/// One simple polygon: exterior ring followed by holes.
pub type PolygonRings = Vec<Ring>;

/// `[minLng, minLat, maxLng, maxLat]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bbox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl From<[f64; 4]> for Bbox {
    fn from([min_lng, min_lat, max_lng, max_lat]: [f64; 4]) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }
}

impl From<Bbox> for [f64; 4] {
    fn from(b: Bbox) -> Self {
        [b.min_lng, b.min_lat, b.max_lng, b.max_lat]
    }
}

impl Bbox {
    pub fn from_point(p: LngLat) -> Self {
        Self {
            min_lng: p.lng,
            min_lat: p.lat,
            max_lng: p.lng,
            max_lat: p.lat,
        }
    }

    pub fn extend(&mut self, p: LngLat) {
        self.min_lng = self.min_lng.min(p.lng);
        self.min_lat = self.min_lat.min(p.lat);
        self.max_lng = self.max_lng.max(p.lng);
        self.max_lat = self.max_lat.max(p.lat);
    }

    pub fn merge(mut self, other: Bbox) -> Bbox {
        self.extend(LngLat::new(other.min_lng, other.min_lat));
        self.extend(LngLat::new(other.max_lng, other.max_lat));
        self
    }

    pub fn contains(&self, p: LngLat) -> bool {
        p.lng >= self.min_lng
            && p.lng <= self.max_lng
            && p.lat >= self.min_lat
            && p.lat <= self.max_lat
    }

    /// Bounds of every position in a GeoJSON object.
    pub fn of_geojson(gj: &GeoJson) -> Option<Bbox> {
        let mut acc = None;
        match gj {
            GeoJson::Geometry(g) => visit_value(&g.value, &mut |p| grow(&mut acc, p)),
            GeoJson::Feature(f) => {
                if let Some(g) = &f.geometry {
                    visit_value(&g.value, &mut |p| grow(&mut acc, p));
                }
            }
            GeoJson::FeatureCollection(fc) => {
                for g in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                    visit_value(&g.value, &mut |p| grow(&mut acc, p));
                }
            }
        }
        acc
    }

    /// Combined bounds of several geometries; `None` when none has a position.
    pub fn of_geometries<'a>(geometries: impl IntoIterator<Item = &'a Geometry>) -> Option<Bbox> {
        let mut acc = None;
        for g in geometries {
            visit_value(&g.value, &mut |p| grow(&mut acc, p));
        }
        acc
    }
}

fn grow(acc: &mut Option<Bbox>, p: LngLat) {
    match acc {
        Some(b) => b.extend(p),
        None => *acc = Some(Bbox::from_point(p)),
    }
}

/// Call `f` for every valid position in a geometry value.
pub fn visit_value(value: &Value, f: &mut impl FnMut(LngLat)) {
    if let Value::GeometryCollection(geoms) = value {
        for g in geoms {
            visit_value(&g.value, f);
        }
        return;
    }
    let mut emit = |pos: &[f64]| {
        if let Some(p) = LngLat::from_position(pos) {
            f(p);
        }
    };
    match value {
        Value::Point(p) => emit(p.as_slice()),
        Value::MultiPoint(ps) | Value::LineString(ps) => {
            ps.iter().for_each(|p| emit(p.as_slice()))
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter().flatten().for_each(|p| emit(p.as_slice()))
        }
        Value::MultiPolygon(polys) => polys
            .iter()
            .flatten()
            .flatten()
            .for_each(|p| emit(p.as_slice())),
        Value::GeometryCollection(_) => {}
    }
}

/// GeoJSON `type` member for a geometry value.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

pub fn is_polygonal(value: &Value) -> bool {
    matches!(value, Value::Polygon(_) | Value::MultiPolygon(_))
}

/// Split a `Polygon`/`MultiPolygon` into simple polygons (exterior + holes).
///
/// Other geometry types yield nothing. Invalid positions are skipped.
pub fn polygon_parts(value: &Value) -> Vec<PolygonRings> {
    let convert = |rings: &Vec<Vec<Vec<f64>>>| -> PolygonRings {
        rings
            .iter()
            .map(|ring| ring.iter().filter_map(|p| LngLat::from_position(p)).collect())
            .collect()
    };
    match value {
        Value::Polygon(rings) => vec![convert(rings)],
        Value::MultiPolygon(polys) => polys.iter().map(convert).collect(),
        _ => Vec::new(),
    }
}

/// Parse user-supplied boundary text.
pub fn parse_geojson(text: &str) -> Result<GeoJson> {
    text.trim()
        .parse::<GeoJson>()
        .map_err(|e| AppError::MalformedInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lnglat_serializes_lng_first() {
        let p = LngLat::new(77.2, 28.6);
        assert_eq!(serde_json::to_string(&p).unwrap(), "[77.2,28.6]");
        let back: LngLat = serde_json::from_str("[10.5,-3.0]").unwrap();
        assert_eq!(back, LngLat::new(10.5, -3.0));
    }

    #[test]
    fn test_from_position_rejects_short_and_nan() {
        assert_eq!(LngLat::from_position(&[1.0]), None);
        assert_eq!(LngLat::from_position(&[f64::NAN, 2.0]), None);
        assert_eq!(
            LngLat::from_position(&[1.0, 2.0, 300.0]),
            Some(LngLat::new(1.0, 2.0))
        );
    }

    #[test]
    fn test_bbox_of_feature_collection() {
        let gj = parse_geojson(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[5,-1]}},
                {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[0,0],[0,2],[3,2],[0,0]]]}},
                {"type":"Feature","properties":{},"geometry":null}
            ]}"#,
        )
        .unwrap();
        let bbox = Bbox::of_geojson(&gj).unwrap();
        assert_eq!(<[f64; 4]>::from(bbox), [0.0, -1.0, 5.0, 2.0]);
    }

    #[test]
    fn test_bbox_empty_is_none() {
        let gj = parse_geojson(r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        assert!(Bbox::of_geojson(&gj).is_none());
    }

    #[test]
    fn test_multipolygon_parts() {
        let value = Value::MultiPolygon(vec![
            vec![vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![1.0, 1.0],
                vec![0.0, 0.0],
            ]],
            vec![
                vec![
                    vec![5.0, 5.0],
                    vec![9.0, 5.0],
                    vec![9.0, 9.0],
                    vec![5.0, 5.0],
                ],
                vec![
                    vec![6.0, 6.0],
                    vec![7.0, 6.0],
                    vec![7.0, 7.0],
                    vec![6.0, 6.0],
                ],
            ],
        ]);
        let parts = polygon_parts(&value);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 1);
        assert_eq!(parts[1].len(), 2, "hole stays with its polygon");
        assert_eq!(parts[1][0][1], LngLat::new(9.0, 5.0));
    }

    #[test]
    fn test_parse_geojson_malformed() {
        let err = parse_geojson("{ not json").unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(_)));
    }
}
