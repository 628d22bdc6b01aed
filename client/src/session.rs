//! Transport session: one socket, one relay, best-effort sends
//!
//! The session owns the connection for the life of the game. Sends are
//! fire-and-forget: failures are logged and swallowed so the simulation
//! tick can never stall on the network. Inbound datagrams are classified
//! into [`Event`]s and handed to the caller one at a time, between ticks.

use bincode::{deserialize, serialize};
use log::{debug, info, warn};
use shared::{ChatMessage, Packet, PeerId, PlayerState, PROTOCOL_VERSION};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// An inbound message after classification. Unknown and malformed
/// datagrams never become events.
#[derive(Debug, Clone)]
pub enum Event {
    Connected {
        player_id: PeerId,
    },
    Joined {
        players: Vec<PeerId>,
    },
    Left {
        player_id: PeerId,
    },
    StateUpdate {
        player_id: PeerId,
        state: PlayerState,
    },
    Chat {
        message: ChatMessage,
    },
    Reactions {
        message_id: String,
        reactions: HashMap<String, Vec<PeerId>>,
    },
    Disconnected {
        reason: String,
    },
}

pub struct Session {
    socket: UdpSocket,
    relay_addr: SocketAddr,
    player_id: Option<PeerId>,
    connected: bool,
}

impl Session {
    pub async fn bind(relay_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let relay_addr = relay_addr.parse()?;

        Ok(Session {
            socket,
            relay_addr,
            player_id: None,
            connected: false,
        })
    }

    /// The identity the relay assigned us, valid only while connected.
    pub fn player_id(&self) -> Option<&PeerId> {
        self.player_id.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Starts (or restarts) the handshake. Any previous identity is
    /// invalid from this point; the new one arrives in `Connected`.
    pub async fn connect(&mut self) {
        info!("Connecting to relay at {}...", self.relay_addr);
        self.connected = false;
        self.player_id = None;

        self.send(&Packet::Connect {
            client_version: PROTOCOL_VERSION,
        })
        .await;
    }

    /// Fire-and-forget send. While disconnected everything but the
    /// handshake is dropped (logged, never surfaced to game logic).
    pub async fn send(&self, packet: &Packet) {
        if !self.connected && !matches!(packet, Packet::Connect { .. }) {
            debug!("Dropping outbound packet while disconnected");
            return;
        }

        match serialize(packet) {
            Ok(data) => {
                if let Err(e) = self.socket.send_to(&data, self.relay_addr).await {
                    warn!("Failed to send packet: {}", e);
                }
            }
            Err(e) => warn!("Failed to encode packet: {}", e),
        }
    }

    /// Awaits the next datagram and classifies it. Returns `None` for
    /// malformed or out-of-place messages; the caller just keeps going.
    pub async fn recv_event(&mut self, buffer: &mut [u8]) -> Option<Event> {
        match self.socket.recv_from(buffer).await {
            Ok((len, _)) => self.classify(&buffer[0..len]),
            Err(e) => {
                warn!("Error receiving datagram: {}", e);
                None
            }
        }
    }

    fn classify(&mut self, datagram: &[u8]) -> Option<Event> {
        let packet = match deserialize::<Packet>(datagram) {
            Ok(packet) => packet,
            Err(_) => {
                debug!("Discarding malformed datagram ({} bytes)", datagram.len());
                return None;
            }
        };

        match packet {
            Packet::Connected { player_id } => {
                info!("Connected! Assigned id: {}", player_id);
                self.player_id = Some(player_id.clone());
                self.connected = true;
                Some(Event::Connected { player_id })
            }
            Packet::Joined { players } => Some(Event::Joined { players }),
            Packet::Left { player_id } => Some(Event::Left { player_id }),
            Packet::StateUpdate { player_id, state } => {
                Some(Event::StateUpdate { player_id, state })
            }
            Packet::ChatBroadcast { message } => Some(Event::Chat { message }),
            Packet::ReactionUpdate {
                message_id,
                reactions,
            } => Some(Event::Reactions {
                message_id,
                reactions,
            }),
            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.connected = false;
                self.player_id = None;
                Some(Event::Disconnected { reason })
            }
            _ => {
                debug!("Ignoring unexpected packet kind");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        tokio_test::block_on(Session::bind("127.0.0.1:8080")).unwrap()
    }

    #[test]
    fn test_identity_tracked_across_connect_and_drop() {
        let mut session = test_session();
        assert!(!session.is_connected());
        assert!(session.player_id().is_none());

        let connected = bincode::serialize(&Packet::Connected {
            player_id: PeerId::from("p1"),
        })
        .unwrap();
        let event = session.classify(&connected);
        assert!(matches!(event, Some(Event::Connected { .. })));
        assert!(session.is_connected());
        assert_eq!(session.player_id(), Some(&PeerId::from("p1")));

        let dropped = bincode::serialize(&Packet::Disconnected {
            reason: "gone".to_string(),
        })
        .unwrap();
        let event = session.classify(&dropped);
        assert!(matches!(event, Some(Event::Disconnected { .. })));
        assert!(!session.is_connected());
        assert!(session.player_id().is_none());
    }

    #[test]
    fn test_malformed_datagram_is_discarded() {
        let mut session = test_session();
        assert!(session.classify(&[]).is_none());
        assert!(session.classify(&[0xFF, 0x01, 0x02]).is_none());

        let mut truncated = bincode::serialize(&Packet::Joined {
            players: vec![PeerId::from("p2"), PeerId::from("p3")],
        })
        .unwrap();
        truncated.truncate(truncated.len() / 2);
        assert!(session.classify(&truncated).is_none());
    }

    #[test]
    fn test_outbound_kinds_are_not_events() {
        let mut session = test_session();
        let echo = bincode::serialize(&Packet::Join {
            room: "r1".to_string(),
        })
        .unwrap();
        assert!(session.classify(&echo).is_none());
    }

    #[test]
    fn test_state_update_classification() {
        let mut session = test_session();
        let datagram = bincode::serialize(&Packet::StateUpdate {
            player_id: PeerId::from("p2"),
            state: PlayerState::placeholder(),
        })
        .unwrap();

        match session.classify(&datagram) {
            Some(Event::StateUpdate { player_id, state }) => {
                assert_eq!(player_id, PeerId::from("p2"));
                assert_eq!(state, PlayerState::placeholder());
            }
            other => panic!("Unexpected classification: {:?}", other),
        }
    }
}
