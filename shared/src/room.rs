//! The shared room record and its flat-JSON wire forms.
//!
//! Field names on the wire are camelCase to match the store contract. The
//! same request body type serves both sides: the client builds it, the store
//! dispatches on its `action` field the way the original service does.

use crate::coords::UnitPoint;
use crate::map::MapType;
use serde::{Deserialize, Serialize};

/// The room creator. Fixed id, never reassigned.
pub const HOST_PLAYER_ID: &str = "player1";
/// The peer that joins through a room code.
pub const JOINER_PLAYER_ID: &str = "player2";

/// Coarse phase of a match. Written only by the host; the joiner mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    #[serde(rename = "waiting")]
    Waiting,
    #[serde(rename = "playing")]
    Playing,
    #[serde(rename = "ended")]
    Ended,
}

/// One player's slot: display name plus last reported normalized position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub connected: bool,
}

impl PlayerSlot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            x: 0.0,
            y: 0.0,
            connected: true,
        }
    }

    pub fn position(&self) -> UnitPoint {
        UnitPoint::new(self.x, self.y)
    }
}

/// Normalized monkey position, written only by the monkey-role peer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonkeyState {
    pub x: f32,
    pub y: f32,
}

impl MonkeyState {
    pub fn position(&self) -> UnitPoint {
        UnitPoint::new(self.x, self.y)
    }
}

/// The periodic chaser ("larry") and the freeze it inflicts. Host-owned.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChaserState {
    pub visible: bool,
    pub x: f32,
    pub y: f32,
    pub frozen: bool,
}

impl ChaserState {
    pub fn position(&self) -> UnitPoint {
        UnitPoint::new(self.x, self.y)
    }
}

/// The full room record as stored and returned by the room store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub room_code: String,
    pub map_type: MapType,
    pub host_player_id: String,
    pub monkey_player_id: Option<String>,
    pub player1: Option<PlayerSlot>,
    pub player2: Option<PlayerSlot>,
    pub monkey: Option<MonkeyState>,
    pub larry: Option<ChaserState>,
    pub game_state: GamePhase,
    pub score: u64,
}

impl RoomRecord {
    /// Fresh record for a newly created room.
    pub fn new(room_code: String, map_type: MapType, host_name: &str) -> Self {
        Self {
            room_code,
            map_type,
            host_player_id: HOST_PLAYER_ID.to_string(),
            monkey_player_id: None,
            player1: Some(PlayerSlot::new(host_name)),
            player2: None,
            monkey: Some(MonkeyState::default()),
            larry: Some(ChaserState::default()),
            game_state: GamePhase::Waiting,
            score: 0,
        }
    }

    pub fn slot(&self, player_id: &str) -> Option<&PlayerSlot> {
        match player_id {
            HOST_PLAYER_ID => self.player1.as_ref(),
            JOINER_PLAYER_ID => self.player2.as_ref(),
            _ => None,
        }
    }

    /// The slot of the peer other than `local_id`.
    pub fn remote_slot(&self, local_id: &str) -> Option<&PlayerSlot> {
        if local_id == HOST_PLAYER_ID {
            self.player2.as_ref()
        } else {
            self.player1.as_ref()
        }
    }
}

/// Body of `POST /rooms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub player_name: String,
    pub map_type: MapType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_code: String,
    pub player_id: String,
}

/// Body of `PUT /rooms/{code}`. The store dispatches on `action`
/// ("join" / "start" / "restart"); a body without an action is a partial
/// state update carrying only the caller's authoritative fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPutBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_position: Option<UnitPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monkey: Option<MonkeyState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub larry: Option<ChaserState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_state: Option<GamePhase>,
}

impl RoomPutBody {
    pub fn join(player_name: &str) -> Self {
        Self {
            action: Some("join".to_string()),
            player_name: Some(player_name.to_string()),
            ..Self::default()
        }
    }

    pub fn start() -> Self {
        Self {
            action: Some("start".to_string()),
            ..Self::default()
        }
    }

    pub fn restart() -> Self {
        Self {
            action: Some("restart".to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomResponse {
    pub room_code: String,
    pub player_id: String,
    pub map_type: MapType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameResponse {
    pub status: String,
    pub monkey_player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
