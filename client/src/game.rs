//! Local chase simulation, in device coordinates.
//!
//! The movement and scoring rules are the same ones the single-player mode
//! uses; here each peer drives only its own avatar and the host additionally
//! drives the chaser, the score clock and the collision verdict. Time is
//! passed in on every step so tests can drive the clock.

use shared::room::ChaserState;
use shared::{
    denormalize, normalize, MapType, Point, CHASER_APPEAR_INTERVAL_SECS, CHASER_CATCH_RADIUS,
    CHASER_FREEZE_SECS, CHASER_SPEED, PET_FOLLOW_FACTOR, SCORE_PER_SECOND,
};
use std::time::{Duration, Instant};

const PET_OFFSET: f32 = 30.0;

pub struct Simulation {
    map: MapType,
    frame_w: f32,
    frame_h: f32,

    pub player_pos: Point,
    pub monkey_pos: Point,
    pub pet_pos: Point,

    chaser_visible: bool,
    chaser_pos: Point,
    monkey_frozen: bool,
    freeze_until: Option<Instant>,
    next_chaser_appearance: Instant,

    started_at: Instant,
    score: u64,
}

impl Simulation {
    pub fn new(map: MapType, frame_w: f32, frame_h: f32, now: Instant) -> Self {
        let player_pos = Point::new(frame_w * 0.75, frame_h * 0.5);
        let monkey_pos = Point::new(frame_w * 0.25, frame_h * 0.5);
        Self {
            map,
            frame_w,
            frame_h,
            player_pos,
            monkey_pos,
            pet_pos: Point::new(player_pos.x + 40.0, player_pos.y + 40.0),
            chaser_visible: false,
            chaser_pos: Point::new(0.0, 0.0),
            monkey_frozen: false,
            freeze_until: None,
            next_chaser_appearance: now + Duration::from_secs(CHASER_APPEAR_INTERVAL_SECS),
            started_at: now,
            score: 0,
        }
    }

    /// Back to starting positions for a fresh game.
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(self.map, self.frame_w, self.frame_h, now);
    }

    pub fn map(&self) -> MapType {
        self.map
    }

    pub fn frame(&self) -> (f32, f32) {
        (self.frame_w, self.frame_h)
    }

    fn clamp_to_frame(&self, p: Point) -> Point {
        Point::new(p.x.clamp(0.0, self.frame_w), p.y.clamp(0.0, self.frame_h))
    }

    pub fn set_player_position(&mut self, p: Point) {
        self.player_pos = self.clamp_to_frame(p);
    }

    /// Ignored while the chaser has the monkey frozen.
    pub fn set_monkey_position(&mut self, p: Point) {
        if !self.monkey_frozen {
            self.monkey_pos = self.clamp_to_frame(p);
        }
    }

    /// The cosmetic pet trails the runner avatar with its own lerp.
    pub fn pet_follow_step(&mut self) {
        let target_x = self.player_pos.x + PET_OFFSET;
        let target_y = self.player_pos.y + PET_OFFSET;
        self.pet_pos.x += (target_x - self.pet_pos.x) * PET_FOLLOW_FACTOR;
        self.pet_pos.y += (target_y - self.pet_pos.y) * PET_FOLLOW_FACTOR;
    }

    /// One tick of the host-driven chaser: appear on schedule, glide toward
    /// the monkey, freeze it on contact, hide when the freeze expires.
    pub fn chaser_step(&mut self, now: Instant) {
        if let Some(until) = self.freeze_until {
            if now >= until {
                self.freeze_until = None;
                self.monkey_frozen = false;
                self.chaser_visible = false;
                self.next_chaser_appearance =
                    now + Duration::from_secs(CHASER_APPEAR_INTERVAL_SECS);
            }
            return;
        }

        if !self.chaser_visible {
            if now >= self.next_chaser_appearance {
                self.chaser_visible = true;
                self.chaser_pos = Point::new(self.frame_w * 0.5, self.frame_h * 0.25);
            }
            return;
        }

        let dx = self.monkey_pos.x - self.chaser_pos.x;
        let dy = self.monkey_pos.y - self.chaser_pos.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < CHASER_CATCH_RADIUS {
            self.monkey_frozen = true;
            self.freeze_until = Some(now + Duration::from_secs(CHASER_FREEZE_SECS));
        } else {
            self.chaser_pos.x += dx / distance * CHASER_SPEED;
            self.chaser_pos.y += dy / distance * CHASER_SPEED;
        }
    }

    /// Catch check between player and monkey. Suspended while frozen, since
    /// a frozen monkey cannot be tagged out.
    pub fn collision_detected(&self) -> bool {
        if self.monkey_frozen {
            return false;
        }
        let threshold = self.map.collision_threshold(self.frame_w, self.frame_h);
        self.player_pos.distance_to(&self.monkey_pos) < threshold
    }

    /// Host score clock: whole seconds survived times the score rate.
    pub fn update_score(&mut self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_secs();
        self.score = elapsed * SCORE_PER_SECOND;
        self.score
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Mirror of the host's score on the non-host peer.
    pub fn adopt_score(&mut self, score: u64) {
        self.score = score;
    }

    pub fn chaser_visible(&self) -> bool {
        self.chaser_visible
    }

    pub fn chaser_pos(&self) -> Point {
        self.chaser_pos
    }

    pub fn monkey_frozen(&self) -> bool {
        self.monkey_frozen
    }

    /// Host-side wire form of the chaser.
    pub fn chaser_wire_state(&self) -> ChaserState {
        let unit = normalize(self.chaser_pos, self.frame_w, self.frame_h);
        ChaserState {
            visible: self.chaser_visible,
            x: unit.x,
            y: unit.y,
            frozen: self.monkey_frozen,
        }
    }

    /// Non-host peers snap the chaser straight to the host's values; the
    /// chaser is discrete shared state, never interpolated.
    pub fn adopt_chaser(&mut self, state: &ChaserState) {
        self.chaser_visible = state.visible;
        self.chaser_pos = denormalize(state.position(), self.frame_w, self.frame_h);
        self.monkey_frozen = state.frozen;
    }
}
