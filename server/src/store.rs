//! In-memory room table with merge-write semantics.
//!
//! Every mutation takes the table lock, merges field-by-field and returns
//! the resulting record, so two peers updating disjoint fields in the same
//! window never clobber each other. The store applies the same per-role
//! field filtering as the hosted service: position writes land only in the
//! caller's slot, the monkey position is accepted only from the monkey-role
//! caller, and chaser/score/phase only from the host. Unauthorized fields
//! are dropped silently rather than rejected.

use log::{debug, info};
use rand::Rng;
use shared::room::{
    ChaserState, GamePhase, MonkeyState, PlayerSlot, RoomPutBody, RoomRecord, HOST_PLAYER_ID,
    JOINER_PLAYER_ID,
};
use shared::{MapType, ROOM_CODE_LEN, ROOM_TTL_SECS};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, PartialEq, Eq)]
pub enum StoreOpError {
    RoomNotFound,
    RoomFull,
    /// Update carried no field the caller is allowed to write.
    NoUpdates,
    /// Start issued before the second player joined.
    NotEnoughPlayers,
}

impl fmt::Display for StoreOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOpError::RoomNotFound => write!(f, "Room not found"),
            StoreOpError::RoomFull => write!(f, "Room is full"),
            StoreOpError::NoUpdates => write!(f, "No updates provided"),
            StoreOpError::NotEnoughPlayers => write!(f, "Room needs two players to start"),
        }
    }
}

impl std::error::Error for StoreOpError {}

struct StoredRoom {
    record: RoomRecord,
    expires_at: Instant,
}

/// The room table. Cheap to share behind an `Arc`.
pub struct RoomStore {
    rooms: Mutex<HashMap<String, StoredRoom>>,
    ttl: Duration,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(ROOM_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn generate_room_code() -> String {
        let mut rng = rand::thread_rng();
        (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect()
    }

    /// Creates a room and seats the caller as player1/host.
    pub fn create(&self, player_name: &str, map_type: MapType) -> RoomRecord {
        let mut rooms = self.rooms.lock().unwrap();

        let mut code = Self::generate_room_code();
        while rooms.contains_key(&code) {
            code = Self::generate_room_code();
        }

        let record = RoomRecord::new(code.clone(), map_type, player_name);
        rooms.insert(
            code.clone(),
            StoredRoom {
                record: record.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        info!("Room {} created by '{}'", code, player_name);
        record
    }

    /// Seats the caller as player2. Fails if the room is missing or full.
    pub fn join(&self, code: &str, player_name: &str) -> Result<RoomRecord, StoreOpError> {
        let mut rooms = self.rooms.lock().unwrap();
        let room = rooms.get_mut(code).ok_or(StoreOpError::RoomNotFound)?;

        if room.record.player2.is_some() {
            return Err(StoreOpError::RoomFull);
        }

        room.record.player2 = Some(PlayerSlot::new(player_name));
        info!("Room {}: '{}' joined", code, player_name);
        Ok(room.record.clone())
    }

    pub fn get(&self, code: &str) -> Result<RoomRecord, StoreOpError> {
        let rooms = self.rooms.lock().unwrap();
        rooms
            .get(code)
            .map(|r| r.record.clone())
            .ok_or(StoreOpError::RoomNotFound)
    }

    /// Partial merge-write. Returns the full record after the merge so the
    /// caller's sync loop gets its pull for free.
    pub fn apply_update(&self, code: &str, body: &RoomPutBody) -> Result<RoomRecord, StoreOpError> {
        let mut rooms = self.rooms.lock().unwrap();
        let room = rooms.get_mut(code).ok_or(StoreOpError::RoomNotFound)?;
        let record = &mut room.record;

        let player_id = body.player_id.as_deref().unwrap_or_default();
        let is_host = player_id == record.host_player_id;
        let is_monkey = record.monkey_player_id.as_deref() == Some(player_id);
        let mut applied = false;

        if let Some(pos) = body.my_position {
            let slot = match player_id {
                HOST_PLAYER_ID => record.player1.as_mut(),
                JOINER_PLAYER_ID => record.player2.as_mut(),
                _ => None,
            };
            if let Some(slot) = slot {
                slot.x = pos.x;
                slot.y = pos.y;
                applied = true;
            }
        }

        if let Some(monkey) = body.monkey {
            if is_monkey {
                record.monkey = Some(monkey);
                applied = true;
            }
        }

        if is_host {
            if let Some(larry) = body.larry {
                record.larry = Some(larry);
                applied = true;
            }
            if let Some(score) = body.score {
                record.score = score;
                applied = true;
            }
            if let Some(phase) = body.game_state {
                record.game_state = phase;
                applied = true;
            }
        }

        if !applied {
            return Err(StoreOpError::NoUpdates);
        }

        debug!("Room {}: update from {}", code, player_id);
        Ok(record.clone())
    }

    /// Starts the game, assigning the monkey role uniformly at random.
    /// Requires both seats filled.
    pub fn start(&self, code: &str) -> Result<String, StoreOpError> {
        let mut rooms = self.rooms.lock().unwrap();
        let room = rooms.get_mut(code).ok_or(StoreOpError::RoomNotFound)?;

        if room.record.player2.is_none() {
            return Err(StoreOpError::NotEnoughPlayers);
        }

        let monkey_id = Self::pick_monkey_id();
        room.record.monkey_player_id = Some(monkey_id.clone());
        room.record.game_state = GamePhase::Playing;
        info!("Room {}: started, monkey = {}", code, monkey_id);
        Ok(monkey_id)
    }

    /// Re-picks the monkey role and resets the shared fields for a new game.
    pub fn restart(&self, code: &str) -> Result<String, StoreOpError> {
        let mut rooms = self.rooms.lock().unwrap();
        let room = rooms.get_mut(code).ok_or(StoreOpError::RoomNotFound)?;
        let record = &mut room.record;

        let monkey_id = Self::pick_monkey_id();
        record.monkey_player_id = Some(monkey_id.clone());
        record.game_state = GamePhase::Playing;
        record.score = 0;
        record.monkey = Some(MonkeyState::default());
        record.larry = Some(ChaserState::default());
        info!("Room {}: restarted, monkey = {}", code, monkey_id);
        Ok(monkey_id)
    }

    /// Idempotent: deleting an unknown room succeeds.
    pub fn delete(&self, code: &str) {
        let mut rooms = self.rooms.lock().unwrap();
        if rooms.remove(code).is_some() {
            info!("Room {} deleted", code);
        }
    }

    /// Drops rooms past their TTL. Returns how many were collected.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut rooms = self.rooms.lock().unwrap();
        let before = rooms.len();
        rooms.retain(|code, room| {
            let keep = room.expires_at > now;
            if !keep {
                info!("Room {} expired", code);
            }
            keep
        });
        before - rooms.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().unwrap().len()
    }

    fn pick_monkey_id() -> String {
        let ids = [HOST_PLAYER_ID, JOINER_PLAYER_ID];
        ids[rand::thread_rng().gen_range(0..ids.len())].to_string()
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}
