//! Types and pure logic shared between the room store and the game client:
//! the room record and its wire representation, normalized coordinates, the
//! map catalog and the per-field write authority model.

pub mod authority;
pub mod coords;
pub mod map;
pub mod room;

pub use authority::{Authority, WriteSet};
pub use coords::{denormalize, normalize, Point, UnitPoint};
pub use map::MapType;
pub use room::{
    ChaserState, GamePhase, MonkeyState, PlayerSlot, RoomRecord, HOST_PLAYER_ID, JOINER_PLAYER_ID,
};

/// Cadence of the write/read sync loop while a game is in progress.
pub const NETWORK_TICK_MS: u64 = 50;
/// Cadence of the read-only poll while waiting in the lobby or for a restart.
pub const LOBBY_POLL_MS: u64 = 1000;
/// Cadence of the local simulation (chase AI, interpolation, collision).
pub const SIM_TICK_MS: u64 = 10;

/// Exponential smoothing factor applied to remote-controlled positions.
pub const REMOTE_LERP_FACTOR: f32 = 0.25;
/// Follow factor for the cosmetic pet trailing the runner avatar.
pub const PET_FOLLOW_FACTOR: f32 = 0.08;

pub const CHASER_APPEAR_INTERVAL_SECS: u64 = 10;
pub const CHASER_FREEZE_SECS: u64 = 3;
/// Device units the chaser covers per simulation tick.
pub const CHASER_SPEED: f32 = 5.0;
/// Distance at which the chaser catches the monkey and freezes it.
pub const CHASER_CATCH_RADIUS: f32 = 10.0;

pub const SCORE_PER_SECOND: u64 = 100;

pub const ROOM_CODE_LEN: usize = 4;
/// Abandoned rooms are garbage-collected after this long.
pub const ROOM_TTL_SECS: u64 = 3600;
