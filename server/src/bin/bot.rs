//! Headless room bot: connects to the relay, joins a room, and publishes
//! a synthetic orbit so the relay can be exercised without a window.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{debug, info, warn};
use shared::{
    Packet, PlayerState, ShipClass, DEFAULT_ROOM, FULL_HEALTH, PROTOCOL_VERSION, SIM_TICK_MS,
    WORLD_HEIGHT, WORLD_WIDTH,
};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::time::{interval, Duration};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Room to join
    #[arg(short, long, default_value = DEFAULT_ROOM)]
    room: String,

    /// Orbit radius in world units
    #[arg(long, default_value = "150.0")]
    radius: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    let server_addr: SocketAddr = args.server.parse()?;
    info!("Bot socket bound to {}", socket.local_addr()?);

    let connect = serialize(&Packet::Connect {
        client_version: PROTOCOL_VERSION,
    })?;
    socket.send_to(&connect, server_addr).await?;

    let mut buffer = [0u8; 2048];
    let mut tick_interval = interval(Duration::from_millis(SIM_TICK_MS));
    let mut ticks: u64 = 0;
    let mut connected = false;

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buffer) => {
                match result {
                    Ok((len, _)) => match deserialize::<Packet>(&buffer[0..len]) {
                        Ok(Packet::Connected { player_id }) => {
                            info!("Connected as {}", player_id);
                            connected = true;
                            let join = serialize(&Packet::Join { room: args.room.clone() })?;
                            socket.send_to(&join, server_addr).await?;
                        }
                        Ok(Packet::Joined { players }) => {
                            info!("Roster now has {} players", players.len());
                        }
                        Ok(Packet::Left { player_id }) => {
                            info!("Peer {} left", player_id);
                        }
                        Ok(Packet::StateUpdate { player_id, state }) => {
                            debug!("{} at ({:.0}, {:.0})", player_id, state.x, state.y);
                        }
                        Ok(Packet::ChatBroadcast { message }) => {
                            info!("[chat] {}: {}", message.sender, message.text);
                        }
                        Ok(Packet::Disconnected { reason }) => {
                            warn!("Disconnected: {}", reason);
                            break;
                        }
                        Ok(_) => {}
                        Err(_) => warn!("Failed to decode datagram"),
                    },
                    Err(e) => warn!("Receive error: {}", e),
                }
            },

            _ = tick_interval.tick() => {
                if !connected {
                    continue;
                }

                ticks += 1;
                let t = ticks as f32 * (SIM_TICK_MS as f32 / 1000.0);
                let angle = t * 0.8;
                let state = PlayerState::new(
                    WORLD_WIDTH / 2.0 + args.radius * angle.cos(),
                    WORLD_HEIGHT / 2.0 + args.radius * angle.sin(),
                    angle + std::f32::consts::FRAC_PI_2,
                    ShipClass::Interceptor,
                    FULL_HEALTH,
                );

                let data = serialize(&Packet::State { state })?;
                socket.send_to(&data, server_addr).await?;
            },

            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                let _ = socket.send_to(&serialize(&Packet::Leave)?, server_addr).await;
                let _ = socket.send_to(&serialize(&Packet::Disconnect)?, server_addr).await;
                break;
            },
        }
    }

    Ok(())
}
