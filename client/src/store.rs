//! Request/response client for the room store.
//!
//! Pure I/O boundary: every method is one HTTP round trip, no policy. Input
//! validation happens here so an empty name or malformed code never reaches
//! the network.

use log::debug;
use reqwest::StatusCode;
use shared::room::{
    CreateRoomRequest, CreateRoomResponse, ErrorResponse, JoinRoomResponse, RoomPutBody,
    RoomRecord, StartGameResponse,
};
use shared::{MapType, ROOM_CODE_LEN};
use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// Rejected before any network call.
    InvalidInput(String),
    NotFound,
    RoomFull,
    Upstream {
        status: StatusCode,
        message: Option<String>,
    },
    Transport(reqwest::Error),
    Decode(reqwest::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidInput(reason) => write!(f, "invalid input: {reason}"),
            StoreError::NotFound => write!(f, "room not found"),
            StoreError::RoomFull => write!(f, "room is full"),
            StoreError::Upstream { status, message } => {
                if let Some(message) = message {
                    write!(f, "store error {status}: {message}")
                } else {
                    write!(f, "store error {status}")
                }
            }
            StoreError::Transport(err) => write!(f, "transport error: {err}"),
            StoreError::Decode(err) => write!(f, "response decode error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Normalizes and validates a user-entered room code.
pub fn parse_room_code(input: &str) -> Result<String, StoreError> {
    let code = input.trim().to_ascii_uppercase();
    if code.len() != ROOM_CODE_LEN
        || !code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(StoreError::InvalidInput(format!(
            "room code must be {ROOM_CODE_LEN} letters or digits"
        )));
    }
    Ok(code)
}

fn validate_player_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "player name must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct RoomStoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl RoomStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn room_url(&self, code: &str) -> String {
        format!("{}/rooms/{}", self.base_url, code)
    }

    async fn decode_or_upstream<T: serde::de::DeserializeOwned>(
        res: reqwest::Response,
    ) -> Result<T, StoreError> {
        let status = res.status();
        if !status.is_success() {
            let message = res
                .json::<ErrorResponse>()
                .await
                .ok()
                .map(|payload| payload.error);
            return Err(match (status, message.as_deref()) {
                (StatusCode::NOT_FOUND, _) => StoreError::NotFound,
                (StatusCode::BAD_REQUEST, Some("Room is full")) => StoreError::RoomFull,
                _ => StoreError::Upstream { status, message },
            });
        }
        res.json::<T>().await.map_err(StoreError::Decode)
    }

    pub async fn create_room(
        &self,
        player_name: &str,
        map_type: MapType,
    ) -> Result<CreateRoomResponse, StoreError> {
        validate_player_name(player_name)?;
        let req = CreateRoomRequest {
            player_name: player_name.trim().to_string(),
            map_type,
        };
        let res = self
            .http
            .post(format!("{}/rooms", self.base_url))
            .json(&req)
            .send()
            .await
            .map_err(StoreError::Transport)?;
        let created: CreateRoomResponse = Self::decode_or_upstream(res).await?;
        debug!("Created room {}", created.room_code);
        Ok(created)
    }

    pub async fn join_room(
        &self,
        room_code: &str,
        player_name: &str,
    ) -> Result<JoinRoomResponse, StoreError> {
        validate_player_name(player_name)?;
        let code = parse_room_code(room_code)?;
        let res = self
            .http
            .put(self.room_url(&code))
            .json(&RoomPutBody::join(player_name.trim()))
            .send()
            .await
            .map_err(StoreError::Transport)?;
        Self::decode_or_upstream(res).await
    }

    pub async fn get_room(&self, room_code: &str) -> Result<RoomRecord, StoreError> {
        let res = self
            .http
            .get(self.room_url(room_code))
            .send()
            .await
            .map_err(StoreError::Transport)?;
        Self::decode_or_upstream(res).await
    }

    /// Partial merge-write; the response is the full post-merge record, so
    /// one round trip serves as both the push and the pull.
    pub async fn update_room(
        &self,
        room_code: &str,
        body: &RoomPutBody,
    ) -> Result<RoomRecord, StoreError> {
        let res = self
            .http
            .put(self.room_url(room_code))
            .json(body)
            .send()
            .await
            .map_err(StoreError::Transport)?;
        Self::decode_or_upstream(res).await
    }

    pub async fn start_game(&self, room_code: &str) -> Result<StartGameResponse, StoreError> {
        let res = self
            .http
            .put(self.room_url(room_code))
            .json(&RoomPutBody::start())
            .send()
            .await
            .map_err(StoreError::Transport)?;
        Self::decode_or_upstream(res).await
    }

    pub async fn restart_game(&self, room_code: &str) -> Result<StartGameResponse, StoreError> {
        let res = self
            .http
            .put(self.room_url(room_code))
            .json(&RoomPutBody::restart())
            .send()
            .await
            .map_err(StoreError::Transport)?;
        Self::decode_or_upstream(res).await
    }

    pub async fn delete_room(&self, room_code: &str) -> Result<(), StoreError> {
        self.http
            .delete(self.room_url(room_code))
            .send()
            .await
            .map_err(StoreError::Transport)?;
        Ok(())
    }
}
