use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const WORLD_WIDTH: f32 = 800.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const FULL_HEALTH: u32 = 100;
pub const PROTOCOL_VERSION: u32 = 1;
pub const DEFAULT_ROOM: &str = "default";

pub const SIM_TICK_MS: u64 = 50;
pub const RENDER_TICK_MS: u64 = 16;

pub const SHIP_TURN_RATE: f32 = 3.5;
pub const SHIP_THRUST: f32 = 420.0;
pub const SHIP_DRAG: f32 = 0.8;
pub const SHIP_MAX_SPEED: f32 = 520.0;

pub const CHAT_BACKLOG: usize = 64;

/// Opaque identifier assigned by the relay at connect time. Unique per
/// active connection and invalidated the moment that connection drops.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        PeerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        PeerId(id.to_string())
    }
}

/// Visual ship archetype. Draw styling lives in the client's registry,
/// not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipClass {
    #[default]
    Scout,
    Sniper,
    Tank,
    Interceptor,
}

/// A published snapshot of one player's ship. Updates replace the whole
/// value; nothing is ever patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub ship: ShipClass,
    pub health: u32,
}

impl PlayerState {
    pub fn new(x: f32, y: f32, angle: f32, ship: ShipClass, health: u32) -> Self {
        Self {
            x,
            y,
            angle,
            ship,
            health,
        }
    }

    /// Stand-in state for a roster member whose first update has not
    /// arrived yet.
    pub fn placeholder() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            ship: ShipClass::default(),
            health: FULL_HEALTH,
        }
    }
}

/// A relayed room chat message, including any emoji reactions collected
/// so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: PeerId,
    pub text: String,
    pub timestamp: u64,
    pub reactions: HashMap<String, Vec<PeerId>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    Join {
        room: String,
    },
    State {
        state: PlayerState,
    },
    Chat {
        text: String,
    },
    React {
        message_id: String,
        emoji: String,
    },
    Leave,
    Disconnect,

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
    ChatBroadcast {
        message: ChatMessage,
    },
    ReactionUpdate {
        message_id: String,
        reactions: HashMap<String, Vec<PeerId>>,
    },
    Disconnected {
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_placeholder_state() {
        let state = PlayerState::placeholder();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.angle, 0.0);
        assert_eq!(state.ship, ShipClass::Scout);
        assert_eq!(state.health, FULL_HEALTH);
    }

    #[test]
    fn test_default_ship_class_is_scout() {
        assert_eq!(ShipClass::default(), ShipClass::Scout);
    }

    #[test]
    fn test_state_snapshots_are_values() {
        let first = PlayerState::new(10.0, 20.0, 1.57, ShipClass::Sniper, 80);
        let second = PlayerState::new(11.0, 20.0, 1.60, ShipClass::Sniper, 75);
        assert_ne!(first, second);

        // Overwriting a slot leaves the old snapshot intact for anyone
        // still holding it.
        let held = first.clone();
        let mut slot = first;
        assert_eq!(slot, held);
        slot = second.clone();
        assert_eq!(slot, second);
        assert_approx_eq!(held.x, 10.0);
        assert_eq!(held.health, 80);
    }

    #[test]
    fn test_packet_serialization_state() {
        let packet = Packet::State {
            state: PlayerState::new(10.0, 20.0, 1.57, ShipClass::Sniper, 80),
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::State { state } => {
                assert_approx_eq!(state.x, 10.0);
                assert_approx_eq!(state.y, 20.0);
                assert_approx_eq!(state.angle, 1.57);
                assert_eq!(state.ship, ShipClass::Sniper);
                assert_eq!(state.health, 80);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_joined_roster() {
        let packet = Packet::Joined {
            players: vec![PeerId::from("p2"), PeerId::from("p3")],
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Joined { players } => {
                assert_eq!(players, vec![PeerId::from("p2"), PeerId::from("p3")]);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_chat() {
        let message = ChatMessage {
            id: "m1".to_string(),
            sender: PeerId::from("p1"),
            text: "gg".to_string(),
            timestamp: 123456,
            reactions: HashMap::new(),
        };
        let packet = Packet::ChatBroadcast {
            message: message.clone(),
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::ChatBroadcast { message: m } => assert_eq!(m, message),
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_peer_id_display_matches_inner() {
        let id = PeerId::from("abc123");
        assert_eq!(id.to_string(), "abc123");
        assert_eq!(id.as_str(), "abc123");
    }
}
