use clap::Parser;
use log::info;
use server::store::RoomStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Room time-to-live in seconds
    #[arg(long, default_value = "3600")]
    room_ttl: u64,

    /// Seconds between expired-room sweeps
    #[arg(long, default_value = "60")]
    sweep_interval: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let store = Arc::new(RoomStore::with_ttl(Duration::from_secs(args.room_ttl)));
    spawn_sweeper_task(&store, args.sweep_interval);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let (local_addr, serve) = server::bind(addr, store).await?;
    info!("Room store listening on {}", local_addr);

    tokio::select! {
        result = serve => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

fn spawn_sweeper_task(store: &Arc<RoomStore>, sweep_interval: u64) {
    server::spawn_sweeper(Arc::clone(store), Duration::from_secs(sweep_interval));
}
