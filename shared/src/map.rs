//! Map catalog and the entity sizing each map implies.

use serde::{Deserialize, Serialize};

const REFERENCE_WIDTH: f32 = 1024.0;
const REFERENCE_HEIGHT: f32 = 768.0;
const BASE_AVATAR_SIZE: f32 = 90.0;
const BASE_CHASER_SIZE: f32 = 120.0;
const COLLISION_SCALE: f32 = 0.7;

/// Map selected by the host at room creation, immutable for the room's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapType {
    #[default]
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "mountain")]
    Mountain,
    #[serde(rename = "sea")]
    Sea,
    #[serde(rename = "hotdogLand")]
    HotdogLand,
}

impl MapType {
    /// Scale factor from the reference layout to the local frame.
    pub fn frame_scale(frame_w: f32, frame_h: f32) -> f32 {
        (frame_w / REFERENCE_WIDTH).min(frame_h / REFERENCE_HEIGHT)
    }

    /// On-screen size of the player and monkey avatars. The mountain map
    /// draws both at double size, which widens the catch radius with it.
    pub fn avatar_size(&self, frame_w: f32, frame_h: f32) -> f32 {
        let base = BASE_AVATAR_SIZE * Self::frame_scale(frame_w, frame_h);
        match self {
            MapType::Mountain => base * 2.0,
            MapType::Original | MapType::Sea | MapType::HotdogLand => base,
        }
    }

    pub fn chaser_size(&self, frame_w: f32, frame_h: f32) -> f32 {
        BASE_CHASER_SIZE * Self::frame_scale(frame_w, frame_h)
    }

    /// Player-monkey distance below which the catch ends the game.
    pub fn collision_threshold(&self, frame_w: f32, frame_h: f32) -> f32 {
        let avatar = self.avatar_size(frame_w, frame_h);
        (avatar + avatar) / 2.0 * COLLISION_SCALE
    }
}
