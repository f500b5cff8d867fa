// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hand-drawn boundary session.
//!
//! `Idle -> Drawing -> Idle`. Clicks append vertices while drawing; from
//! three vertices on an open-ring preview is available; finishing closes the
//! ring and yields a GeoJSON `Polygon`. The session is owned by exactly one
//! renderer, which resolves pointer events to positions before calling in.

use crate::models::geometry::{LngLat, Ring};
use geojson::{Geometry, Value};

/// Minimum vertices for a preview and for finishing.
pub const MIN_POLYGON_VERTICES: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing,
}

#[derive(Debug, Clone, Default)]
pub struct DrawSession {
    state: DrawState,
    vertices: Vec<LngLat>,
}

impl DrawSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        self.state == DrawState::Drawing
    }

    pub fn vertices(&self) -> &[LngLat] {
        &self.vertices
    }

    /// Open a new session, discarding any previous draft.
    pub fn start(&mut self) {
        self.vertices.clear();
        self.state = DrawState::Drawing;
    }

    /// Append a vertex. Unresolved pointers and clicks outside a session are
    /// ignored. Returns whether a vertex was appended.
    pub fn place(&mut self, at: Option<LngLat>) -> bool {
        match (self.state, at) {
            (DrawState::Drawing, Some(p)) => {
                self.vertices.push(p);
                true
            }
            _ => false,
        }
    }

    /// Drop the last vertex. Returns whether one was removed.
    pub fn undo(&mut self) -> bool {
        self.is_drawing() && self.vertices.pop().is_some()
    }

    /// Open ring for the live preview, once there are enough vertices.
    pub fn preview(&self) -> Option<&[LngLat]> {
        (self.is_drawing() && self.vertices.len() >= MIN_POLYGON_VERTICES)
            .then_some(self.vertices.as_slice())
    }

    /// Close the ring and return the polygon, resetting to `Idle`.
    ///
    /// With fewer than three vertices nothing happens and the session keeps
    /// drawing.
    pub fn finish(&mut self) -> Option<Geometry> {
        if !self.is_drawing() || self.vertices.len() < MIN_POLYGON_VERTICES {
            return None;
        }
        let ring = closed_ring(&self.vertices);
        self.vertices.clear();
        self.state = DrawState::Idle;
        Some(polygon_geometry(ring))
    }

    /// Discard everything and return to `Idle`.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.state = DrawState::Idle;
    }
}

/// `[v0, .., vn, v0]`
pub fn closed_ring(vertices: &[LngLat]) -> Ring {
    let mut ring = vertices.to_vec();
    if let Some(first) = vertices.first() {
        ring.push(*first);
    }
    ring
}

/// Single-ring GeoJSON polygon in `[lng, lat]` order.
pub fn polygon_geometry(ring: Ring) -> Geometry {
    Geometry::new(Value::Polygon(vec![ring
        .into_iter()
        .map(LngLat::to_position)
        .collect()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawing_with(points: &[[f64; 2]]) -> DrawSession {
        let mut session = DrawSession::new();
        session.start();
        for p in points {
            assert!(session.place(Some(LngLat::from(*p))));
        }
        session
    }

    #[test]
    fn test_square_emits_closed_polygon() {
        let mut session = drawing_with(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
        let polygon = session.finish().expect("should finish");

        assert_eq!(
            serde_json::to_value(&polygon).unwrap(),
            serde_json::json!({
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]]
            })
        );
        assert_eq!(session.state(), DrawState::Idle);
        assert!(session.vertices().is_empty());
    }

    #[test]
    fn test_ring_closure_length() {
        for n in 3..8 {
            let points: Vec<[f64; 2]> = (0..n).map(|i| [i as f64, (i * i) as f64]).collect();
            let mut session = drawing_with(&points);
            let Some(Geometry {
                value: Value::Polygon(rings),
                ..
            }) = session.finish()
            else {
                panic!("expected polygon");
            };
            let ring = &rings[0];
            assert_eq!(ring.len(), n + 1);
            assert_eq!(ring.first(), ring.last());
        }
    }

    #[test]
    fn test_finish_needs_three_vertices() {
        let mut session = drawing_with(&[[0.0, 0.0], [1.0, 1.0]]);
        assert!(session.finish().is_none());
        assert_eq!(session.state(), DrawState::Drawing);
        assert_eq!(session.vertices().len(), 2);
    }

    #[test]
    fn test_preview_after_three_vertices() {
        let mut session = drawing_with(&[[0.0, 0.0], [1.0, 0.0]]);
        assert!(session.preview().is_none());
        session.place(Some(LngLat::new(1.0, 1.0)));
        let preview = session.preview().unwrap();
        assert_eq!(preview.len(), 3, "preview ring stays open");
        assert_ne!(preview.first(), preview.last());
    }

    #[test]
    fn test_unresolved_and_idle_clicks_ignored() {
        let mut session = DrawSession::new();
        assert!(!session.place(Some(LngLat::new(1.0, 1.0))));
        session.start();
        assert!(!session.place(None));
        assert!(session.vertices().is_empty());
    }

    #[test]
    fn test_clear_then_start_begins_empty() {
        let mut session =
            drawing_with(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.5, 0.5]]);
        session.clear();
        assert_eq!(session.state(), DrawState::Idle);
        session.start();
        assert!(session.vertices().is_empty());
    }

    #[test]
    fn test_undo_drops_preview() {
        let mut session = drawing_with(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        assert!(session.undo());
        assert!(session.preview().is_none());
        assert_eq!(session.vertices().len(), 2);
    }
}
