//! Relay network layer handling UDP datagrams and room fan-out

use crate::peers::ConnectionTable;
use crate::rooms::RoomRegistry;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PeerId, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Messages sent from network tasks to the main relay loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    PeerTimeout {
        player_id: PeerId,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the relay loop to the sender task
#[derive(Debug)]
pub enum RelayMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    FanOut {
        packet: Packet,
        addrs: Vec<SocketAddr>,
    },
}

/// The relay: accepts connections, tracks rooms, rebroadcasts events.
/// It never simulates game state; clients are authoritative for their
/// own ships.
pub struct Server {
    socket: Arc<UdpSocket>,
    connections: Arc<RwLock<ConnectionTable>>,
    rooms: RoomRegistry,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    relay_tx: mpsc::UnboundedSender<RelayMessage>,
    relay_rx: mpsc::UnboundedReceiver<RelayMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        connection_timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Relay listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            connections: Arc::new(RwLock::new(ConnectionTable::new(connection_timeout))),
            rooms: RoomRegistry::new(),
            server_tx,
            server_rx,
            relay_tx,
            relay_rx,
        })
    }

    /// The address the relay socket actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns the task that continuously listens for incoming datagrams
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to decode datagram from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving datagram: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains the outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut relay_rx = std::mem::replace(&mut self.relay_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = relay_rx.recv().await {
                match message {
                    RelayMessage::SendPacket { packet, addr } => match serialize(&packet) {
                        Ok(data) => {
                            if let Err(e) = socket.send_to(&data, addr).await {
                                error!("Failed to send packet to {}: {}", addr, e);
                            }
                        }
                        Err(e) => error!("Failed to encode packet: {}", e),
                    },
                    RelayMessage::FanOut { packet, addrs } => match serialize(&packet) {
                        // Encode once, send to every recipient.
                        Ok(data) => {
                            for addr in addrs {
                                if let Err(e) = socket.send_to(&data, addr).await {
                                    error!("Failed to send packet to {}: {}", addr, e);
                                }
                            }
                        }
                        Err(e) => error!("Failed to encode packet: {}", e),
                    },
                }
            }
        });
    }

    /// Spawns the task that sweeps silent connections
    async fn spawn_timeout_checker(&self) {
        let connections = Arc::clone(&self.connections);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut sweep_interval = interval(Duration::from_secs(1));

            loop {
                sweep_interval.tick().await;

                let timed_out = {
                    let mut connections_guard = connections.write().await;
                    connections_guard.check_timeouts()
                };

                for player_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::PeerTimeout { player_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_to_addr(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = self.relay_tx.send(RelayMessage::SendPacket {
            packet: packet.clone(),
            addr,
        }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Queues `packet` for every recipient that still has a live
    /// connection. Recipients without one are skipped silently; the
    /// timeout sweep will announce their departure.
    async fn fan_out(&self, packet: &Packet, recipients: &[PeerId]) {
        let addrs: Vec<SocketAddr> = {
            let connections = self.connections.read().await;
            recipients
                .iter()
                .filter_map(|id| connections.addr_for_id(id))
                .collect()
        };

        if addrs.is_empty() {
            return;
        }

        if let Err(e) = self.relay_tx.send(RelayMessage::FanOut {
            packet: packet.clone(),
            addrs,
        }) {
            error!("Failed to queue fan-out packet: {}", e);
        }
    }

    /// Removes a peer from its room and tells the remaining members.
    async fn drop_from_room(&mut self, player_id: &PeerId) {
        if let Some(outcome) = self.rooms.leave(player_id) {
            self.fan_out(
                &Packet::Left {
                    player_id: player_id.clone(),
                },
                &outcome.remaining,
            )
            .await;
        }
    }

    fn now_millis() -> u64 {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis();
        (timestamp.min(u64::MAX as u128)) as u64
    }

    /// Routes one inbound packet to the relevant room/connection mutation
    /// and queues the resulting broadcasts.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        {
            let mut connections = self.connections.write().await;
            connections.touch(&addr);
        }

        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Peer connecting from {} (version: {})",
                    addr, client_version
                );

                if client_version != PROTOCOL_VERSION {
                    let response = Packet::Disconnected {
                        reason: "Protocol version mismatch".to_string(),
                    };
                    self.send_to_addr(&response, addr).await;
                    return;
                }

                let (player_id, stale) = {
                    let mut connections = self.connections.write().await;
                    connections.connect(addr)
                };

                // A reconnect from the same address invalidates the old
                // identity; its room must hear the leave.
                if let Some(stale_id) = stale {
                    self.drop_from_room(&stale_id).await;
                }

                let response = Packet::Connected { player_id };
                self.send_to_addr(&response, addr).await;
            }

            Packet::Join { room } => {
                let player_id = {
                    let connections = self.connections.read().await;
                    connections.id_for_addr(&addr)
                };

                if let Some(player_id) = player_id {
                    // One room per session: changing rooms leaves the old
                    // one first.
                    self.drop_from_room(&player_id).await;

                    let roster = self.rooms.join(player_id, &room);
                    self.fan_out(
                        &Packet::Joined {
                            players: roster.clone(),
                        },
                        &roster,
                    )
                    .await;
                } else {
                    debug!("Join from unknown address {}", addr);
                }
            }

            Packet::State { state } => {
                let player_id = {
                    let connections = self.connections.read().await;
                    connections.id_for_addr(&addr)
                };

                if let Some(player_id) = player_id {
                    if let Some(recipients) = self.rooms.apply_state(&player_id, state.clone()) {
                        self.fan_out(&Packet::StateUpdate { player_id, state }, &recipients)
                            .await;
                    }
                }
            }

            Packet::Chat { text } => {
                let player_id = {
                    let connections = self.connections.read().await;
                    connections.id_for_addr(&addr)
                };

                if let Some(player_id) = player_id {
                    if let Some((message, recipients)) =
                        self.rooms.post_chat(&player_id, text, Self::now_millis())
                    {
                        self.fan_out(&Packet::ChatBroadcast { message }, &recipients)
                            .await;
                    }
                }
            }

            Packet::React { message_id, emoji } => {
                let player_id = {
                    let connections = self.connections.read().await;
                    connections.id_for_addr(&addr)
                };

                if let Some(player_id) = player_id {
                    if let Some((reactions, recipients)) =
                        self.rooms.add_reaction(&player_id, &message_id, &emoji)
                    {
                        self.fan_out(
                            &Packet::ReactionUpdate {
                                message_id,
                                reactions,
                            },
                            &recipients,
                        )
                        .await;
                    }
                }
            }

            Packet::Leave => {
                let player_id = {
                    let connections = self.connections.read().await;
                    connections.id_for_addr(&addr)
                };

                if let Some(player_id) = player_id {
                    self.drop_from_room(&player_id).await;
                }
            }

            Packet::Disconnect => {
                let player_id = {
                    let connections = self.connections.read().await;
                    connections.id_for_addr(&addr)
                };

                if let Some(player_id) = player_id {
                    self.drop_from_room(&player_id).await;
                    let mut connections = self.connections.write().await;
                    connections.disconnect(&player_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Main relay loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut stats_interval = interval(Duration::from_secs(10));

        info!("Relay started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::PeerTimeout { player_id }) => {
                            warn!("Peer {} timed out", player_id);
                            self.drop_from_room(&player_id).await;
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Relay shutting down");
                            break;
                        }
                    }
                },

                _ = stats_interval.tick() => {
                    let connection_count = {
                        let connections = self.connections.read().await;
                        connections.len()
                    };

                    if connection_count > 0 {
                        debug!(
                            "{} connections, {} rooms, {} players in rooms",
                            connection_count,
                            self.rooms.room_count(),
                            self.rooms.player_count()
                        );
                    }
                },
            }
        }

        Ok(())
    }
}
