//! # Room Store Service
//!
//! An ephemeral key-value store of two-player room records, exposed over a
//! small HTTP API. The store itself carries no game policy: it seats the
//! two peers, performs field-level merge writes filtered by the caller's
//! role, assigns the monkey role on start/restart and garbage-collects
//! abandoned rooms after a TTL. Everything else (lifecycle, interpolation,
//! simulation) lives client-side.

pub mod routes;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use store::RoomStore;

/// Binds the store on `addr` and returns the bound address along with the
/// serve future. Split this way so tests can bind port 0 and learn the
/// ephemeral port before serving.
pub async fn bind(
    addr: SocketAddr,
    store: Arc<RoomStore>,
) -> std::io::Result<(SocketAddr, impl std::future::Future<Output = std::io::Result<()>>)> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let app = routes::router(store);
    Ok((local_addr, async move { axum::serve(listener, app).await }))
}

/// Spawns the periodic TTL sweep for `store`.
pub fn spawn_sweeper(store: Arc<RoomStore>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.tick().await;
        loop {
            timer.tick().await;
            let collected = store.sweep_expired();
            if collected > 0 {
                info!("Swept {} expired room(s)", collected);
            }
        }
    })
}
