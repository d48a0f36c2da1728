//! Resolution-independent coordinates.
//!
//! Peers run at different frame sizes, so positions cross the wire as
//! fractions of the local frame. A freshly created slot carries (0, 0) until
//! its owner reports for the first time; receivers must treat anything that
//! close to the origin as "not yet reported" and keep their previous target.

use serde::{Deserialize, Serialize};

/// Both coordinates at or below this are considered the unreported sentinel.
const UNREPORTED_EPSILON: f32 = 0.01;

/// A position in device space (pixels of the local frame).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A position expressed as fractions of frame width/height, in [0,1]x[0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitPoint {
    pub x: f32,
    pub y: f32,
}

impl UnitPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero-origin value a slot holds before its owner's first update.
    pub fn unreported() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Whether this value carries a usable position: inside the unit square
    /// and not the unreported sentinel. Anything else, including values a
    /// corrupted record might carry, must never overwrite a live
    /// interpolation target.
    pub fn is_reported(&self) -> bool {
        if self.x < 0.0 || self.y < 0.0 || self.x > 1.0 || self.y > 1.0 {
            return false;
        }
        self.x > UNREPORTED_EPSILON || self.y > UNREPORTED_EPSILON
    }
}

/// Converts a device position to the unit square. The input is clamped to
/// the frame bounds first so out-of-bounds gestures stay inside [0,1].
pub fn normalize(p: Point, frame_w: f32, frame_h: f32) -> UnitPoint {
    UnitPoint {
        x: p.x.clamp(0.0, frame_w) / frame_w,
        y: p.y.clamp(0.0, frame_h) / frame_h,
    }
}

/// Converts a unit-square position back to device space.
pub fn denormalize(u: UnitPoint, frame_w: f32, frame_h: f32) -> Point {
    Point {
        x: u.x * frame_w,
        y: u.y * frame_h,
    }
}
