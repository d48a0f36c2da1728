//! Per-field write authority.
//!
//! Conflicting writes are avoided without any locking protocol: every shared
//! field has exactly one writer. The host owns the chaser, the score and the
//! game phase; the monkey-role peer owns the monkey position; each peer owns
//! its own player slot. All update payloads go through [`Authority`], which
//! strips fields the local role is not allowed to write, so a payload
//! carrying another role's fields cannot be constructed.

use crate::coords::UnitPoint;
use crate::room::{ChaserState, GamePhase, MonkeyState, RoomPutBody};

/// Role assignment for one peer inside one game instance. `monkey_id` is
/// set at game start and may change on restart, so sessions rebuild their
/// `Authority` from each start/restart response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    local_id: String,
    host_id: String,
    monkey_id: Option<String>,
}

/// Which shared fields the local peer may write on a sync push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSet {
    pub own_slot: bool,
    pub monkey: bool,
    pub chaser: bool,
    pub score: bool,
    pub phase: bool,
}

impl Authority {
    pub fn new(
        local_id: impl Into<String>,
        host_id: impl Into<String>,
        monkey_id: Option<String>,
    ) -> Self {
        Self {
            local_id: local_id.into(),
            host_id: host_id.into(),
            monkey_id,
        }
    }

    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    pub fn is_host(&self) -> bool {
        self.local_id == self.host_id
    }

    pub fn is_monkey_role(&self) -> bool {
        self.monkey_id.as_deref() == Some(self.local_id.as_str())
    }

    /// Reassigns the monkey role, as happens on every start and restart.
    pub fn set_monkey_id(&mut self, monkey_id: Option<String>) {
        self.monkey_id = monkey_id;
    }

    pub fn write_set(&self) -> WriteSet {
        WriteSet {
            own_slot: true,
            monkey: self.is_monkey_role(),
            chaser: self.is_host(),
            score: self.is_host(),
            phase: self.is_host(),
        }
    }

    /// Builds the sync-push body for this peer. Fields outside the local
    /// write set are dropped even if the caller supplies them, keeping the
    /// single-writer invariant independent of call sites.
    pub fn build_update(
        &self,
        my_position: UnitPoint,
        monkey: Option<MonkeyState>,
        chaser: Option<ChaserState>,
        score: Option<u64>,
        phase: Option<GamePhase>,
    ) -> RoomPutBody {
        let writes = self.write_set();
        RoomPutBody {
            action: None,
            player_name: None,
            player_id: Some(self.local_id.clone()),
            my_position: Some(my_position),
            monkey: if writes.monkey { monkey } else { None },
            larry: if writes.chaser { chaser } else { None },
            score: if writes.score { score } else { None },
            game_state: if writes.phase { phase } else { None },
        }
    }
}
