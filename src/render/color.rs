// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Overlay colours shared by both renderers.
//!
//! Depth and heat intensity use the same ramp: blue when shallow or weak,
//! through purple, to red at full scale.

/// Depth (meters) at which the depth ramp saturates.
pub const DEPTH_FULL_SCALE_M: f64 = 30.0;

/// Hue of the shallow end of the ramp (blue).
const RAMP_START_HUE: f64 = 0.66;

/// Colour as hue/saturation/lightness/alpha, every channel in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsla {
    pub h: f64,
    pub s: f64,
    pub l: f64,
    pub a: f64,
}

pub const BOUNDARY_GREEN: Hsla = Hsla::new(0.39, 0.67, 0.45, 0.15);
pub const BOUNDARY_OUTLINE: Hsla = Hsla::new(0.39, 0.67, 0.45, 1.0);
pub const DETECTION_RED: Hsla = Hsla::new(0.0, 0.84, 0.6, 0.4);
pub const DETECTION_OUTLINE: Hsla = Hsla::new(0.0, 0.74, 0.42, 1.0);
pub const PREVIEW_CYAN: Hsla = Hsla::new(0.5, 1.0, 0.5, 0.25);
pub const PREVIEW_OUTLINE: Hsla = Hsla::new(0.5, 1.0, 0.5, 1.0);

impl Hsla {
    pub const fn new(h: f64, s: f64, l: f64, a: f64) -> Self {
        Self { h, s, l, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// 8-bit RGBA.
    pub fn to_rgba(&self) -> [u8; 4] {
        let h = self.h.rem_euclid(1.0);
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);

        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                hue_channel(p, q, h + 1.0 / 3.0),
                hue_channel(p, q, h),
                hue_channel(p, q, h - 1.0 / 3.0),
            )
        };
        [to_byte(r), to_byte(g), to_byte(b), to_byte(self.a)]
    }
}

fn hue_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Position on the ramp for a depth: `clamp(depth / 30, 0, 1)`.
pub fn depth_ratio(depth_m: f64) -> f64 {
    unit(depth_m / DEPTH_FULL_SCALE_M)
}

/// Heat intensity (0-100) normalised to `0..=1`.
pub fn normalize_intensity(intensity: f64) -> f64 {
    unit(intensity / 100.0)
}

fn unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Hue for a ramp position: blue at 0, purple midway, red at 1.
pub fn ramp_hue(t: f64) -> f64 {
    (RAMP_START_HUE + (1.0 - RAMP_START_HUE) * unit(t)).rem_euclid(1.0)
}

/// Translucent fill for a depth polygon.
pub fn depth_color(depth_m: f64) -> Hsla {
    Hsla::new(ramp_hue(depth_ratio(depth_m)), 0.8, 0.5, 0.35)
}

/// Marker colour for a heat sample with normalised weight `t`.
pub fn heat_color(t: f64) -> Hsla {
    Hsla::new(ramp_hue(t), 0.9, 0.5, 0.8)
}
