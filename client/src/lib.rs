//! # Session-Synchronization Engine
//!
//! Client side of the two-player chase game: keeps this peer's view of a
//! shared room consistent with the other peer's despite the only transport
//! being periodic polling of a remote room record.
//!
//! ## How consistency is reached without a connection
//!
//! Neither peer can message the other. Instead each peer, on a fixed
//! cadence, pushes the fields it has exclusive authority over and merges
//! whatever the store returns. The per-field single-writer rule (see
//! `shared::authority`) makes write conflicts structurally impossible, so
//! no versioning or conflict resolution is needed anywhere.
//!
//! ## Module organization
//!
//! - `store` — request/response client for the room store; pure I/O.
//! - `interpolation` — exponential smoothing of remote-controlled
//!   positions between sparse network updates.
//! - `game` — the local chase simulation (pet follow, chaser AI, collision
//!   verdict, score clock), in device coordinates.
//! - `session` — the lifecycle state machine and the reconciliation rules
//!   for fetched records; synchronous and fully unit-testable.
//! - `sync` — the async driver: tick scheduling, spawned store calls and
//!   generation-counted teardown.

pub mod game;
pub mod interpolation;
pub mod session;
pub mod store;
pub mod sync;
