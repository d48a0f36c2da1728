//! Session state: lifecycle machine plus the reconciliation rules applied
//! to fetched room records.
//!
//! Everything here is synchronous and side-effect free apart from mutating
//! the session itself; the async driver in [`crate::sync`] owns the timers
//! and the store round trips. Mutations are reported back as
//! [`SessionEvent`]s so an embedding UI or bot can react without polling.

use crate::game::Simulation;
use crate::interpolation::RemoteInterpolator;
use shared::room::{GamePhase, RoomRecord};
use shared::{denormalize, normalize, Authority, MapType, MonkeyState, Point, UnitPoint};
use std::time::Instant;

/// Coarse local phase. `Waiting`/`Playing`/`Ended` mirror the shared
/// `gameState` tag; `Abandoned` is local-only and terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Waiting,
    Playing,
    Ended,
    Abandoned,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged(Lifecycle),
    /// Host-side: the second seat filled, start is now possible.
    PeerJoined,
    /// Fired on every game start and restart.
    RoleAssigned { monkey_role: bool },
    ScoreChanged(u64),
}

pub struct Session {
    room_code: String,
    authority: Authority,
    lifecycle: Lifecycle,
    sim: Simulation,
    remote: RemoteInterpolator,
    peer_joined: bool,
    last_emitted_score: u64,
}

impl Session {
    pub fn new(
        room_code: String,
        authority: Authority,
        map: MapType,
        frame_w: f32,
        frame_h: f32,
        now: Instant,
    ) -> Self {
        let sim = Simulation::new(map, frame_w, frame_h, now);
        let remote = RemoteInterpolator::new(sim.monkey_pos);
        Self {
            room_code,
            authority,
            lifecycle: Lifecycle::Waiting,
            sim,
            remote,
            peer_joined: false,
            last_emitted_score: 0,
        }
    }

    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_host(&self) -> bool {
        self.authority.is_host()
    }

    pub fn is_monkey_role(&self) -> bool {
        self.authority.is_monkey_role()
    }

    pub fn peer_joined(&self) -> bool {
        self.peer_joined
    }

    pub fn score(&self) -> u64 {
        self.sim.score()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Moves the locally controlled avatar (monkey or player, per role).
    pub fn set_local_position(&mut self, p: Point) {
        if self.lifecycle != Lifecycle::Playing {
            return;
        }
        if self.authority.is_monkey_role() {
            self.sim.set_monkey_position(p);
        } else {
            self.sim.set_player_position(p);
        }
    }

    /// Transitions into `Playing` with a (re)assigned monkey role and a
    /// reset simulation. Used by the host on start/restart responses and by
    /// the joiner on observing the `playing` tag.
    pub fn enter_playing(&mut self, monkey_player_id: Option<String>, now: Instant) -> Vec<SessionEvent> {
        self.authority.set_monkey_id(monkey_player_id);
        self.sim.reset(now);
        let remote_start = if self.authority.is_monkey_role() {
            self.sim.player_pos
        } else {
            self.sim.monkey_pos
        };
        self.remote.reset(remote_start);
        self.lifecycle = Lifecycle::Playing;
        self.last_emitted_score = 0;
        vec![
            SessionEvent::PhaseChanged(Lifecycle::Playing),
            SessionEvent::RoleAssigned {
                monkey_role: self.authority.is_monkey_role(),
            },
        ]
    }

    /// Terminal local exit; the driver stops all tasks after this.
    pub fn abandon(&mut self) -> Vec<SessionEvent> {
        self.lifecycle = Lifecycle::Abandoned;
        vec![SessionEvent::PhaseChanged(Lifecycle::Abandoned)]
    }

    /// One local simulation tick: pet follow, chaser AI and the collision
    /// verdict (host only), smoothing of the remote entity, score clock.
    pub fn sim_tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        if self.lifecycle != Lifecycle::Playing {
            return Vec::new();
        }
        let mut events = Vec::new();

        if !self.authority.is_monkey_role() {
            self.sim.pet_follow_step();
        }

        self.remote.step();
        let displayed = self.remote.displayed();
        if self.authority.is_monkey_role() {
            self.sim.player_pos = displayed;
        } else {
            self.sim.monkey_pos = displayed;
        }

        if self.authority.is_host() {
            self.sim.chaser_step(now);

            if self.sim.collision_detected() {
                self.lifecycle = Lifecycle::Ended;
                events.push(SessionEvent::PhaseChanged(Lifecycle::Ended));
                return events;
            }

            let score = self.sim.update_score(now);
            if score != self.last_emitted_score {
                self.last_emitted_score = score;
                events.push(SessionEvent::ScoreChanged(score));
            }
        }

        events
    }

    /// Builds this peer's sync push. The authority object filters the
    /// fields, so a non-host body physically cannot carry the chaser, the
    /// score or the phase tag.
    pub fn build_sync_body(&self) -> shared::room::RoomPutBody {
        let (frame_w, frame_h) = self.sim.frame();
        let local_pos = if self.authority.is_monkey_role() {
            self.sim.monkey_pos
        } else {
            self.sim.player_pos
        };
        let my_position = normalize(local_pos, frame_w, frame_h);

        let monkey = {
            let unit = normalize(self.sim.monkey_pos, frame_w, frame_h);
            Some(MonkeyState {
                x: unit.x,
                y: unit.y,
            })
        };
        let phase = match self.lifecycle {
            Lifecycle::Ended => GamePhase::Ended,
            _ => GamePhase::Playing,
        };

        self.authority.build_update(
            my_position,
            monkey,
            Some(self.sim.chaser_wire_state()),
            Some(self.sim.score()),
            Some(phase),
        )
    }

    /// Merges a record fetched by the steady-state sync loop. Remote
    /// positions become interpolation targets (sentinel values ignored);
    /// the non-host peer snaps chaser, score and phase directly.
    pub fn apply_sync_record(&mut self, record: &RoomRecord) -> Vec<SessionEvent> {
        if self.lifecycle != Lifecycle::Playing {
            return Vec::new();
        }
        let mut events = Vec::new();
        let (frame_w, frame_h) = self.sim.frame();

        if self.authority.is_monkey_role() {
            if let Some(slot) = record.remote_slot(self.authority.local_id()) {
                self.retarget_if_reported(slot.position(), frame_w, frame_h);
            }
        } else if let Some(monkey) = &record.monkey {
            self.retarget_if_reported(monkey.position(), frame_w, frame_h);
        }

        if !self.authority.is_host() {
            if let Some(larry) = &record.larry {
                self.sim.adopt_chaser(larry);
            }
            if record.score != self.last_emitted_score {
                self.last_emitted_score = record.score;
                events.push(SessionEvent::ScoreChanged(record.score));
            }
            self.sim.adopt_score(record.score);

            if record.game_state == GamePhase::Ended {
                self.lifecycle = Lifecycle::Ended;
                events.push(SessionEvent::PhaseChanged(Lifecycle::Ended));
            }
        }

        events
    }

    fn retarget_if_reported(&mut self, unit: UnitPoint, frame_w: f32, frame_h: f32) {
        if unit.is_reported() {
            self.remote.retarget(denormalize(unit, frame_w, frame_h));
        }
    }

    /// Handles a record fetched by the slow lobby/restart poll.
    pub fn observe_lobby_record(&mut self, record: &RoomRecord, now: Instant) -> Vec<SessionEvent> {
        match self.lifecycle {
            Lifecycle::Waiting => {
                let mut events = Vec::new();
                if self.authority.is_host() {
                    if record.player2.is_some() && !self.peer_joined {
                        self.peer_joined = true;
                        events.push(SessionEvent::PeerJoined);
                    }
                } else if record.game_state == GamePhase::Playing {
                    events.extend(self.enter_playing(record.monkey_player_id.clone(), now));
                }
                events
            }
            // Joiner waiting for the host to restart.
            Lifecycle::Ended if record.game_state == GamePhase::Playing => {
                self.enter_playing(record.monkey_player_id.clone(), now)
            }
            _ => Vec::new(),
        }
    }

    /// Whether the fast write/read loop should be running. The host keeps
    /// pushing in `Ended` so the final phase tag reliably reaches the peer.
    pub fn sync_loop_active(&self) -> bool {
        match self.lifecycle {
            Lifecycle::Playing => true,
            Lifecycle::Ended => self.authority.is_host(),
            Lifecycle::Waiting | Lifecycle::Abandoned => false,
        }
    }

    /// Whether the slow read-only poll should be running. Mutually
    /// exclusive with the sync loop.
    pub fn lobby_poll_active(&self) -> bool {
        match self.lifecycle {
            Lifecycle::Waiting => true,
            Lifecycle::Ended => !self.authority.is_host(),
            Lifecycle::Playing | Lifecycle::Abandoned => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::room::{ChaserState, PlayerSlot, HOST_PLAYER_ID, JOINER_PLAYER_ID};

    const W: f32 = 1024.0;
    const H: f32 = 768.0;

    fn host_session() -> Session {
        Session::new(
            "AB12".to_string(),
            Authority::new(HOST_PLAYER_ID, HOST_PLAYER_ID, None),
            MapType::Original,
            W,
            H,
            Instant::now(),
        )
    }

    fn joiner_session() -> Session {
        Session::new(
            "AB12".to_string(),
            Authority::new(JOINER_PLAYER_ID, HOST_PLAYER_ID, None),
            MapType::Original,
            W,
            H,
            Instant::now(),
        )
    }

    fn playing_record(monkey_id: &str) -> RoomRecord {
        let mut record = RoomRecord::new("AB12".to_string(), MapType::Original, "host");
        record.player2 = Some(PlayerSlot::new("guest"));
        record.monkey_player_id = Some(monkey_id.to_string());
        record.game_state = GamePhase::Playing;
        record
    }

    #[test]
    fn test_host_sees_peer_join_but_stays_waiting() {
        let mut session = host_session();
        let record = playing_record(JOINER_PLAYER_ID);

        let events = session.observe_lobby_record(&record, Instant::now());
        assert_eq!(events, vec![SessionEvent::PeerJoined]);
        // Host never transitions from a poll, only from an explicit start.
        assert_eq!(session.lifecycle(), Lifecycle::Waiting);

        // Repeat polls do not re-announce the peer.
        let events = session.observe_lobby_record(&record, Instant::now());
        assert!(events.is_empty());
    }

    #[test]
    fn test_joiner_transitions_on_playing_tag() {
        let mut session = joiner_session();
        let mut record = playing_record(JOINER_PLAYER_ID);

        record.game_state = GamePhase::Waiting;
        assert!(session
            .observe_lobby_record(&record, Instant::now())
            .is_empty());
        assert_eq!(session.lifecycle(), Lifecycle::Waiting);

        record.game_state = GamePhase::Playing;
        let events = session.observe_lobby_record(&record, Instant::now());
        assert_eq!(session.lifecycle(), Lifecycle::Playing);
        assert!(events.contains(&SessionEvent::PhaseChanged(Lifecycle::Playing)));
        assert!(events.contains(&SessionEvent::RoleAssigned { monkey_role: true }));
    }

    #[test]
    fn test_host_start_assigns_role() {
        let mut session = host_session();
        let events = session.enter_playing(Some(HOST_PLAYER_ID.to_string()), Instant::now());

        assert_eq!(session.lifecycle(), Lifecycle::Playing);
        assert!(session.is_monkey_role());
        assert!(events.contains(&SessionEvent::RoleAssigned { monkey_role: true }));
    }

    #[test]
    fn test_sentinel_never_overwrites_live_target() {
        let mut session = joiner_session();
        session.enter_playing(Some(HOST_PLAYER_ID.to_string()), Instant::now());
        assert!(!session.is_monkey_role());

        // A real monkey position arrives and becomes the target.
        let mut record = playing_record(HOST_PLAYER_ID);
        record.monkey = Some(MonkeyState { x: 0.5, y: 0.5 });
        session.apply_sync_record(&record);
        let live_target = session.remote.target();
        assert_eq!(live_target, Point::new(0.5 * W, 0.5 * H));

        // The peer's unreported sentinel must not reset it.
        record.monkey = Some(MonkeyState { x: 0.0, y: 0.0 });
        session.apply_sync_record(&record);
        assert_eq!(session.remote.target(), live_target);
    }

    #[test]
    fn test_out_of_range_remote_value_keeps_previous_target() {
        let mut session = joiner_session();
        session.enter_playing(Some(HOST_PLAYER_ID.to_string()), Instant::now());

        let mut record = playing_record(HOST_PLAYER_ID);
        record.monkey = Some(MonkeyState { x: 0.5, y: 0.5 });
        session.apply_sync_record(&record);
        let live_target = session.remote.target();

        // A corrupted record pointing outside the unit square must never
        // drag the interpolation target off the frame.
        record.monkey = Some(MonkeyState { x: 1.5, y: 0.5 });
        session.apply_sync_record(&record);
        assert_eq!(session.remote.target(), live_target);

        record.monkey = Some(MonkeyState { x: 0.5, y: -0.5 });
        session.apply_sync_record(&record);
        assert_eq!(session.remote.target(), live_target);
    }

    #[test]
    fn test_non_host_adopts_chaser_score_and_ended_tag() {
        let mut session = joiner_session();
        session.enter_playing(Some(JOINER_PLAYER_ID.to_string()), Instant::now());

        let mut record = playing_record(JOINER_PLAYER_ID);
        record.larry = Some(ChaserState {
            visible: true,
            x: 0.5,
            y: 0.25,
            frozen: true,
        });
        record.score = 900;
        let events = session.apply_sync_record(&record);

        assert!(session.simulation().chaser_visible());
        assert!(session.simulation().monkey_frozen());
        assert_eq!(session.score(), 900);
        assert!(events.contains(&SessionEvent::ScoreChanged(900)));

        record.game_state = GamePhase::Ended;
        let events = session.apply_sync_record(&record);
        assert_eq!(session.lifecycle(), Lifecycle::Ended);
        assert!(events.contains(&SessionEvent::PhaseChanged(Lifecycle::Ended)));
    }

    #[test]
    fn test_host_ignores_mirrored_authoritative_fields() {
        let mut session = host_session();
        session.enter_playing(Some(JOINER_PLAYER_ID.to_string()), Instant::now());

        let mut record = playing_record(JOINER_PLAYER_ID);
        record.score = 12345;
        record.game_state = GamePhase::Ended;
        session.apply_sync_record(&record);

        assert_eq!(session.score(), 0);
        assert_eq!(session.lifecycle(), Lifecycle::Playing);
    }

    #[test]
    fn test_sync_body_reflects_role() {
        let mut host = host_session();
        host.enter_playing(Some(JOINER_PLAYER_ID.to_string()), Instant::now());
        let body = host.build_sync_body();
        assert!(body.larry.is_some());
        assert!(body.score.is_some());
        assert_eq!(body.game_state, Some(GamePhase::Playing));
        assert!(body.monkey.is_none());

        let mut joiner = joiner_session();
        joiner.enter_playing(Some(JOINER_PLAYER_ID.to_string()), Instant::now());
        let body = joiner.build_sync_body();
        assert!(body.monkey.is_some());
        assert!(body.larry.is_none());
        assert!(body.score.is_none());
        assert!(body.game_state.is_none());
    }

    #[test]
    fn test_host_collision_ends_game_and_keeps_pushing() {
        let mut session = host_session();
        session.enter_playing(Some(JOINER_PLAYER_ID.to_string()), Instant::now());

        // Drive the remote monkey onto the player.
        let mut record = playing_record(JOINER_PLAYER_ID);
        record.monkey = Some(MonkeyState { x: 0.75, y: 0.5 });
        session.apply_sync_record(&record);
        let mut ended = false;
        for _ in 0..100 {
            let events = session.sim_tick(Instant::now());
            if events.contains(&SessionEvent::PhaseChanged(Lifecycle::Ended)) {
                ended = true;
                break;
            }
        }

        assert!(ended);
        assert_eq!(session.lifecycle(), Lifecycle::Ended);
        // The final push must carry the ended tag to the peer.
        assert!(session.sync_loop_active());
        assert_eq!(session.build_sync_body().game_state, Some(GamePhase::Ended));
    }

    #[test]
    fn test_loop_activation_is_mutually_exclusive() {
        let mut host = host_session();
        let mut joiner = joiner_session();

        for session in [&mut host, &mut joiner] {
            assert!(session.lobby_poll_active());
            assert!(!session.sync_loop_active());

            session.enter_playing(Some(JOINER_PLAYER_ID.to_string()), Instant::now());
            assert!(session.sync_loop_active());
            assert!(!session.lobby_poll_active());
        }

        host.lifecycle = Lifecycle::Ended;
        assert!(host.sync_loop_active());
        assert!(!host.lobby_poll_active());

        joiner.lifecycle = Lifecycle::Ended;
        assert!(joiner.lobby_poll_active());
        assert!(!joiner.sync_loop_active());

        joiner.abandon();
        assert!(!joiner.lobby_poll_active());
        assert!(!joiner.sync_loop_active());
    }

    #[test]
    fn test_joiner_restart_via_ended_poll() {
        let mut session = joiner_session();
        session.enter_playing(Some(HOST_PLAYER_ID.to_string()), Instant::now());
        session.lifecycle = Lifecycle::Ended;

        let record = playing_record(JOINER_PLAYER_ID);
        let events = session.observe_lobby_record(&record, Instant::now());
        assert_eq!(session.lifecycle(), Lifecycle::Playing);
        assert!(events.contains(&SessionEvent::RoleAssigned { monkey_role: true }));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_local_position_ignored_outside_playing() {
        let mut session = host_session();
        let before = session.simulation().player_pos;
        session.set_local_position(Point::new(1.0, 1.0));
        assert_eq!(session.simulation().player_pos, before);
    }
}
