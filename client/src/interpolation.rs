//! Exponential smoothing of remote-controlled positions.
//!
//! Network updates arrive far less often than the simulation ticks, so the
//! displayed position of a peer-controlled entity glides toward the latest
//! received target instead of snapping. A plain lerp filter is enough here;
//! no dead reckoning.

use shared::{Point, REMOTE_LERP_FACTOR};

pub struct RemoteInterpolator {
    displayed: Point,
    target: Point,
    lerp_factor: f32,
}

impl RemoteInterpolator {
    pub fn new(initial: Point) -> Self {
        Self::with_factor(initial, REMOTE_LERP_FACTOR)
    }

    pub fn with_factor(initial: Point, lerp_factor: f32) -> Self {
        Self {
            displayed: initial,
            target: initial,
            lerp_factor,
        }
    }

    /// Adopts a newly received position as the target. Callers are expected
    /// to have filtered out unreported sentinel values already.
    pub fn retarget(&mut self, target: Point) {
        self.target = target;
    }

    /// Snaps both displayed and target, used on game start/restart.
    pub fn reset(&mut self, position: Point) {
        self.displayed = position;
        self.target = position;
    }

    /// One simulation tick of smoothing.
    pub fn step(&mut self) {
        self.displayed.x += (self.target.x - self.displayed.x) * self.lerp_factor;
        self.displayed.y += (self.target.y - self.displayed.y) * self.lerp_factor;
    }

    pub fn displayed(&self) -> Point {
        self.displayed
    }

    pub fn target(&self) -> Point {
        self.target
    }
}
