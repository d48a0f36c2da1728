//! The async driver: timers, store round trips and teardown.
//!
//! Three recurring tasks share one `select!` loop per session: the fast
//! local simulation tick, the 50ms write/read sync tick and the 1s
//! read-only lobby poll. Which network tick is live follows the lifecycle
//! state; the two are never active together. Store calls are spawned so no
//! tick ever waits on the network; completions come back over a channel
//! tagged with a generation counter, and anything tagged with a stale
//! generation is dropped. Bumping the generation on teardown therefore
//! makes every in-flight callback a guaranteed no-op.

use crate::session::{Lifecycle, Session, SessionEvent};
use crate::store::{RoomStoreClient, StoreError};
use log::{debug, info, warn};
use shared::room::{RoomRecord, StartGameResponse};
use shared::{Authority, MapType, Point, HOST_PLAYER_ID, LOBBY_POLL_MS, NETWORK_TICK_MS, SIM_TICK_MS};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

#[derive(Debug)]
pub enum SessionCommand {
    /// Drag/touch input: where the locally controlled avatar should be.
    SetLocalPosition(Point),
    /// Host-only; valid once the peer has joined.
    StartGame,
    /// Host-only; valid once the game has ended.
    RestartGame,
    /// Deletes the room and tears the session down.
    Leave,
}

enum NetResponse {
    Record(Result<RoomRecord, StoreError>),
    Started(Result<StartGameResponse, StoreError>),
    Polled(Result<RoomRecord, StoreError>),
}

/// A running session: command/event channels plus identity, handed to the
/// embedding UI or bot. Dropping the command sender tears the session down.
pub struct SessionHandle {
    pub commands: mpsc::Sender<SessionCommand>,
    pub events: mpsc::Receiver<SessionEvent>,
    pub room_code: String,
    pub player_id: String,
    pub map_type: MapType,
}

/// Creates a room and runs a session as its host.
pub async fn create_session(
    store: RoomStoreClient,
    player_name: &str,
    map_type: MapType,
    frame_w: f32,
    frame_h: f32,
) -> Result<SessionHandle, StoreError> {
    let created = store.create_room(player_name, map_type).await?;
    info!(
        "Created room {} as {}",
        created.room_code, created.player_id
    );
    let authority = Authority::new(created.player_id.clone(), HOST_PLAYER_ID, None);
    Ok(spawn_runner(
        store,
        created.room_code,
        created.player_id,
        authority,
        map_type,
        frame_w,
        frame_h,
    ))
}

/// Joins an existing room and runs a session as its second player. The map
/// is whatever the host picked at creation.
pub async fn join_session(
    store: RoomStoreClient,
    room_code: &str,
    player_name: &str,
    frame_w: f32,
    frame_h: f32,
) -> Result<SessionHandle, StoreError> {
    let joined = store.join_room(room_code, player_name).await?;
    info!("Joined room {} as {}", joined.room_code, joined.player_id);
    let authority = Authority::new(joined.player_id.clone(), HOST_PLAYER_ID, None);
    Ok(spawn_runner(
        store,
        joined.room_code,
        joined.player_id,
        authority,
        joined.map_type,
        frame_w,
        frame_h,
    ))
}

fn spawn_runner(
    store: RoomStoreClient,
    room_code: String,
    player_id: String,
    authority: Authority,
    map_type: MapType,
    frame_w: f32,
    frame_h: f32,
) -> SessionHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (event_tx, event_rx) = mpsc::channel(64);

    let session = Session::new(
        room_code.clone(),
        authority,
        map_type,
        frame_w,
        frame_h,
        Instant::now(),
    );
    let runner = SessionRunner {
        session,
        store,
        commands: cmd_rx,
        events: event_tx,
        generation: 0,
    };
    tokio::spawn(runner.run());

    SessionHandle {
        commands: cmd_tx,
        events: event_rx,
        room_code,
        player_id,
        map_type,
    }
}

struct SessionRunner {
    session: Session,
    store: RoomStoreClient,
    commands: mpsc::Receiver<SessionCommand>,
    events: mpsc::Sender<SessionEvent>,
    /// Bumped on teardown; responses from older generations are ignored.
    generation: u64,
}

impl SessionRunner {
    async fn run(mut self) {
        let (resp_tx, mut resp_rx) = mpsc::channel::<(u64, NetResponse)>(64);

        let mut sim_timer = interval(Duration::from_millis(SIM_TICK_MS));
        let mut sync_timer = interval(Duration::from_millis(NETWORK_TICK_MS));
        let mut lobby_timer = interval(Duration::from_millis(LOBBY_POLL_MS));
        sim_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        sync_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        lobby_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = sim_timer.tick() => {
                    let events = self.session.sim_tick(Instant::now());
                    self.emit_all(events).await;
                }

                _ = sync_timer.tick(), if self.session.sync_loop_active() => {
                    self.spawn_sync_push(&resp_tx);
                }

                _ = lobby_timer.tick(), if self.session.lobby_poll_active() => {
                    self.spawn_lobby_poll(&resp_tx);
                }

                Some((generation, response)) = resp_rx.recv() => {
                    if generation != self.generation {
                        debug!("Dropping stale response (generation {})", generation);
                        continue;
                    }
                    let events = self.handle_response(response);
                    self.emit_all(events).await;
                }

                cmd = self.commands.recv() => {
                    let done = self.handle_command(cmd, &resp_tx).await;
                    if done {
                        break;
                    }
                }
            }

            if self.session.lifecycle() == Lifecycle::Abandoned {
                break;
            }
        }
    }

    fn spawn_sync_push(&self, resp_tx: &mpsc::Sender<(u64, NetResponse)>) {
        let store = self.store.clone();
        let code = self.session.room_code().to_string();
        let body = self.session.build_sync_body();
        let generation = self.generation;
        let resp_tx = resp_tx.clone();
        tokio::spawn(async move {
            let result = store.update_room(&code, &body).await;
            let _ = resp_tx.send((generation, NetResponse::Record(result))).await;
        });
    }

    fn spawn_lobby_poll(&self, resp_tx: &mpsc::Sender<(u64, NetResponse)>) {
        let store = self.store.clone();
        let code = self.session.room_code().to_string();
        let generation = self.generation;
        let resp_tx = resp_tx.clone();
        tokio::spawn(async move {
            let result = store.get_room(&code).await;
            let _ = resp_tx.send((generation, NetResponse::Polled(result))).await;
        });
    }

    fn handle_response(&mut self, response: NetResponse) -> Vec<SessionEvent> {
        match response {
            NetResponse::Record(Ok(record)) => self.session.apply_sync_record(&record),
            NetResponse::Polled(Ok(record)) => {
                self.session.observe_lobby_record(&record, Instant::now())
            }
            NetResponse::Started(Ok(response)) => {
                info!("Game started, monkey is {}", response.monkey_player_id);
                self.session
                    .enter_playing(Some(response.monkey_player_id), Instant::now())
            }
            // Steady-state failures are logged and swallowed; the next tick
            // retries naturally.
            NetResponse::Record(Err(err)) | NetResponse::Polled(Err(err)) => {
                warn!("Sync failure (will retry): {}", err);
                Vec::new()
            }
            NetResponse::Started(Err(err)) => {
                warn!("Start/restart failed: {}", err);
                Vec::new()
            }
        }
    }

    async fn handle_command(
        &mut self,
        cmd: Option<SessionCommand>,
        resp_tx: &mpsc::Sender<(u64, NetResponse)>,
    ) -> bool {
        match cmd {
            Some(SessionCommand::SetLocalPosition(p)) => {
                self.session.set_local_position(p);
                false
            }
            Some(SessionCommand::StartGame) => {
                if !self.session.is_host() {
                    warn!("Ignoring start from non-host peer");
                } else if !self.session.peer_joined() {
                    warn!("Ignoring start before the peer joined");
                } else {
                    self.spawn_start(resp_tx, false);
                }
                false
            }
            Some(SessionCommand::RestartGame) => {
                if !self.session.is_host() || self.session.lifecycle() != Lifecycle::Ended {
                    warn!("Ignoring restart (not host, or game not ended)");
                } else {
                    self.spawn_start(resp_tx, true);
                }
                false
            }
            // Dropped command channel means the embedder went away.
            Some(SessionCommand::Leave) | None => {
                self.teardown().await;
                true
            }
        }
    }

    fn spawn_start(&self, resp_tx: &mpsc::Sender<(u64, NetResponse)>, restart: bool) {
        let store = self.store.clone();
        let code = self.session.room_code().to_string();
        let generation = self.generation;
        let resp_tx = resp_tx.clone();
        tokio::spawn(async move {
            let result = if restart {
                store.restart_game(&code).await
            } else {
                store.start_game(&code).await
            };
            let _ = resp_tx.send((generation, NetResponse::Started(result))).await;
        });
    }

    async fn teardown(&mut self) {
        // Invalidate every in-flight response before anything else.
        self.generation += 1;

        let store = self.store.clone();
        let code = self.session.room_code().to_string();
        tokio::spawn(async move {
            if let Err(err) = store.delete_room(&code).await {
                debug!("Room delete on leave failed: {}", err);
            }
        });

        let events = self.session.abandon();
        self.emit_all(events).await;
        info!("Session for room {} torn down", self.session.room_code());
    }

    async fn emit_all(&self, events: Vec<SessionEvent>) {
        for event in events {
            let _ = self.events.send(event).await;
        }
    }
}
