//! Headless bot client: creates or joins a room against a running store
//! and drives its avatar on a slow circle. Useful for exercising the full
//! sync path from two terminals.

use clap::Parser;
use client::session::{Lifecycle, SessionEvent};
use client::store::RoomStoreClient;
use client::sync::{create_session, join_session, SessionCommand};
use log::info;
use shared::{MapType, Point, HOST_PLAYER_ID};
use tokio::time::{interval, Duration};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Room store base URL
    #[arg(short = 's', long, default_value = "http://127.0.0.1:8080")]
    store: String,

    /// Display name
    #[arg(short, long, default_value = "bot")]
    name: String,

    /// Room code to join; creates a new room when omitted
    #[arg(short, long)]
    join: Option<String>,

    /// Map for a created room: original, mountain, sea or hotdogLand
    #[arg(short, long, default_value = "original")]
    map: String,

    /// Frame width
    #[arg(short = 'w', long, default_value = "1024")]
    width: f32,

    /// Frame height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "768")]
    height: f32,

    /// Games to play before leaving (host restarts between them)
    #[arg(short, long, default_value = "1")]
    games: u32,
}

fn parse_map(name: &str) -> MapType {
    match name {
        "mountain" => MapType::Mountain,
        "sea" => MapType::Sea,
        "hotdogLand" => MapType::HotdogLand,
        _ => MapType::Original,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let store = RoomStoreClient::new(args.store.clone());
    let mut handle = match &args.join {
        Some(code) => join_session(store, code, &args.name, args.width, args.height).await?,
        None => {
            let map = parse_map(&args.map);
            create_session(store, &args.name, map, args.width, args.height).await?
        }
    };
    let is_host = handle.player_id == HOST_PLAYER_ID;
    info!(
        "Room {} as {} ({})",
        handle.room_code,
        handle.player_id,
        if is_host { "host" } else { "joiner" }
    );

    let center = Point::new(args.width * 0.5, args.height * 0.5);
    let radius = args.width.min(args.height) * 0.3;
    let mut angle: f32 = 0.0;
    let mut games_finished = 0u32;

    let mut input_timer = interval(Duration::from_millis(50));

    loop {
        tokio::select! {
            event = handle.events.recv() => {
                match event {
                    Some(SessionEvent::PeerJoined) => {
                        info!("Peer joined, starting game");
                        handle.commands.send(SessionCommand::StartGame).await?;
                    }
                    Some(SessionEvent::RoleAssigned { monkey_role }) => {
                        info!("Role: {}", if monkey_role { "MONKEY" } else { "PLAYER" });
                    }
                    Some(SessionEvent::PhaseChanged(Lifecycle::Playing)) => {
                        info!("Game on");
                    }
                    Some(SessionEvent::PhaseChanged(Lifecycle::Ended)) => {
                        games_finished += 1;
                        info!("Game over ({}/{})", games_finished, args.games);
                        if games_finished >= args.games {
                            handle.commands.send(SessionCommand::Leave).await?;
                        } else if is_host {
                            handle.commands.send(SessionCommand::RestartGame).await?;
                        }
                    }
                    Some(SessionEvent::PhaseChanged(Lifecycle::Abandoned)) | None => {
                        info!("Session closed");
                        break;
                    }
                    Some(SessionEvent::PhaseChanged(Lifecycle::Waiting)) => {}
                    Some(SessionEvent::ScoreChanged(score)) => {
                        info!("Score: {}", score);
                    }
                }
            }

            _ = input_timer.tick() => {
                angle += 0.05;
                let position = Point::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                );
                // Session ignores this outside of Playing.
                let _ = handle.commands.send(SessionCommand::SetLocalPosition(position)).await;
            }
        }
    }

    Ok(())
}
