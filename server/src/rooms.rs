//! Room registry: rosters, relayed state, and chat backlogs
//!
//! The relay never simulates anything. It keeps, per room, the ordered
//! list of members, the latest state each member reported, and a bounded
//! chat backlog, and tells the network layer who should hear about each
//! event. Rooms appear on first join and vanish with their last member.

use log::{debug, info};
use shared::{ChatMessage, PeerId, PlayerState, CHAT_BACKLOG};
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Room {
    /// Join-ordered roster, broadcast whole on every join.
    players: Vec<PeerId>,
    /// Latest state reported per member; pruned with the member.
    states: HashMap<PeerId, PlayerState>,
    messages: Vec<ChatMessage>,
}

/// What a leave needs to trigger: the room it happened in and who is
/// still there to hear about it.
#[derive(Debug, PartialEq)]
pub struct LeaveOutcome {
    pub room: String,
    pub remaining: Vec<PeerId>,
}

pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    player_rooms: HashMap<PeerId, String>,
    next_message_serial: u64,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            next_message_serial: 1,
        }
    }

    /// Adds `player` to `room_name`, creating the room on demand, and
    /// returns the full roster to broadcast. The caller must have removed
    /// the player from any previous room first (one room per session).
    pub fn join(&mut self, player: PeerId, room_name: &str) -> Vec<PeerId> {
        let room = self.rooms.entry(room_name.to_string()).or_default();
        if !room.players.contains(&player) {
            room.players.push(player.clone());
        }
        self.player_rooms
            .insert(player.clone(), room_name.to_string());
        info!("Peer {} joined room '{}'", player, room_name);
        room.players.clone()
    }

    /// Removes `player` from its room, pruning its stored state with it.
    /// Idempotent: a player in no room yields `None`.
    pub fn leave(&mut self, player: &PeerId) -> Option<LeaveOutcome> {
        let room_name = self.player_rooms.remove(player)?;
        let room = self.rooms.get_mut(&room_name)?;

        room.players.retain(|p| p != player);
        room.states.remove(player);
        info!("Peer {} left room '{}'", player, room_name);

        let remaining = room.players.clone();
        if remaining.is_empty() {
            self.rooms.remove(&room_name);
            debug!("Room '{}' is empty, dropping it", room_name);
        }

        Some(LeaveOutcome {
            room: room_name,
            remaining,
        })
    }

    /// Stores the latest state for `player` and returns who to relay it
    /// to (everyone in the room but the sender).
    pub fn apply_state(&mut self, player: &PeerId, state: PlayerState) -> Option<Vec<PeerId>> {
        let room_name = self.player_rooms.get(player)?;
        let room = self.rooms.get_mut(room_name)?;

        room.states.insert(player.clone(), state);
        Some(
            room.players
                .iter()
                .filter(|p| *p != player)
                .cloned()
                .collect(),
        )
    }

    /// Records a chat message in the sender's room and returns it with
    /// the full recipient list (the sender included, as in chat).
    pub fn post_chat(
        &mut self,
        sender: &PeerId,
        text: String,
        timestamp: u64,
    ) -> Option<(ChatMessage, Vec<PeerId>)> {
        let room_name = self.player_rooms.get(sender)?;
        let room = self.rooms.get_mut(room_name)?;

        let message = ChatMessage {
            id: format!("m{}", self.next_message_serial),
            sender: sender.clone(),
            text,
            timestamp,
            reactions: HashMap::new(),
        };
        self.next_message_serial += 1;

        room.messages.push(message.clone());
        if room.messages.len() > CHAT_BACKLOG {
            room.messages.remove(0);
        }

        Some((message, room.players.clone()))
    }

    /// Adds `reactor` under `emoji` on a message in its room. Returns the
    /// updated reaction map and recipients only when something actually
    /// changed; a repeat reaction or unknown message is a no-op.
    pub fn add_reaction(
        &mut self,
        reactor: &PeerId,
        message_id: &str,
        emoji: &str,
    ) -> Option<(HashMap<String, Vec<PeerId>>, Vec<PeerId>)> {
        let room_name = self.player_rooms.get(reactor)?;
        let room = self.rooms.get_mut(room_name)?;

        let message = room.messages.iter_mut().find(|m| m.id == message_id)?;
        let reactors = message.reactions.entry(emoji.to_string()).or_default();
        if reactors.contains(reactor) {
            return None;
        }
        reactors.push(reactor.clone());

        Some((message.reactions.clone(), room.players.clone()))
    }

    pub fn room_of(&self, player: &PeerId) -> Option<&str> {
        self.player_rooms.get(player).map(String::as_str)
    }

    pub fn members(&self, room_name: &str) -> Option<Vec<PeerId>> {
        self.rooms.get(room_name).map(|room| room.players.clone())
    }

    pub fn state_of(&self, room_name: &str, player: &PeerId) -> Option<&PlayerState> {
        self.rooms.get(room_name)?.states.get(player)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn player_count(&self) -> usize {
        self.player_rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ShipClass;

    fn p(id: &str) -> PeerId {
        PeerId::from(id)
    }

    #[test]
    fn test_join_creates_room_and_returns_full_roster() {
        let mut registry = RoomRegistry::new();

        let roster = registry.join(p("p1"), "r1");
        assert_eq!(roster, vec![p("p1")]);

        let roster = registry.join(p("p2"), "r1");
        assert_eq!(roster, vec![p("p1"), p("p2")]);
        assert_eq!(registry.room_count(), 1);
        assert_eq!(registry.room_of(&p("p2")), Some("r1"));
    }

    #[test]
    fn test_leave_prunes_state_and_reports_remaining() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");
        registry.join(p("p2"), "r1");
        registry
            .apply_state(&p("p1"), PlayerState::placeholder())
            .unwrap();

        let outcome = registry.leave(&p("p1")).unwrap();
        assert_eq!(outcome.room, "r1");
        assert_eq!(outcome.remaining, vec![p("p2")]);
        assert!(registry.state_of("r1", &p("p1")).is_none());
        assert_eq!(registry.room_of(&p("p1")), None);
    }

    #[test]
    fn test_last_leave_drops_room() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");

        let outcome = registry.leave(&p("p1")).unwrap();
        assert!(outcome.remaining.is_empty());
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn test_leave_is_idempotent() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");

        assert!(registry.leave(&p("p1")).is_some());
        assert!(registry.leave(&p("p1")).is_none());
        assert!(registry.leave(&p("never-joined")).is_none());
    }

    #[test]
    fn test_state_relay_excludes_sender() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");
        registry.join(p("p2"), "r1");
        registry.join(p("p3"), "r1");

        let state = PlayerState::new(10.0, 20.0, 1.57, ShipClass::Scout, 80);
        let recipients = registry.apply_state(&p("p2"), state.clone()).unwrap();

        assert_eq!(recipients, vec![p("p1"), p("p3")]);
        assert_eq!(registry.state_of("r1", &p("p2")), Some(&state));
    }

    #[test]
    fn test_state_from_roomless_peer_is_dropped() {
        let mut registry = RoomRegistry::new();
        assert!(registry
            .apply_state(&p("p9"), PlayerState::placeholder())
            .is_none());
    }

    #[test]
    fn test_state_is_last_write_wins() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");

        let old = PlayerState::new(1.0, 1.0, 0.0, ShipClass::Scout, 100);
        let new = PlayerState::new(2.0, 2.0, 0.5, ShipClass::Scout, 90);
        registry.apply_state(&p("p1"), old).unwrap();
        registry.apply_state(&p("p1"), new.clone()).unwrap();

        assert_eq!(registry.state_of("r1", &p("p1")), Some(&new));
    }

    #[test]
    fn test_chat_reaches_whole_room_including_sender() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");
        registry.join(p("p2"), "r1");

        let (message, recipients) = registry
            .post_chat(&p("p1"), "hello!".to_string(), 1000)
            .unwrap();

        assert_eq!(message.sender, p("p1"));
        assert_eq!(message.text, "hello!");
        assert_eq!(recipients, vec![p("p1"), p("p2")]);
    }

    #[test]
    fn test_chat_ids_are_unique() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");

        let (m1, _) = registry.post_chat(&p("p1"), "a".to_string(), 1).unwrap();
        let (m2, _) = registry.post_chat(&p("p1"), "a".to_string(), 1).unwrap();
        assert_ne!(m1.id, m2.id);
    }

    #[test]
    fn test_chat_backlog_is_bounded() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");

        for i in 0..(CHAT_BACKLOG + 10) {
            registry
                .post_chat(&p("p1"), format!("msg {}", i), i as u64)
                .unwrap();
        }

        let room = registry.rooms.get("r1").unwrap();
        assert_eq!(room.messages.len(), CHAT_BACKLOG);
        assert_eq!(room.messages[0].text, "msg 10");
    }

    #[test]
    fn test_reaction_dedupes_per_player() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");
        registry.join(p("p2"), "r1");

        let (message, _) = registry.post_chat(&p("p1"), "gg".to_string(), 5).unwrap();

        let (reactions, recipients) = registry
            .add_reaction(&p("p2"), &message.id, "\u{1f44d}")
            .unwrap();
        assert_eq!(reactions.get("\u{1f44d}"), Some(&vec![p("p2")]));
        assert_eq!(recipients, vec![p("p1"), p("p2")]);

        // Same player, same emoji: nothing changes, nothing broadcast.
        assert!(registry
            .add_reaction(&p("p2"), &message.id, "\u{1f44d}")
            .is_none());
    }

    #[test]
    fn test_reaction_on_unknown_message_is_noop() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");
        assert!(registry.add_reaction(&p("p1"), "nope", "\u{1f44d}").is_none());
    }

    #[test]
    fn test_two_rooms_are_isolated() {
        let mut registry = RoomRegistry::new();
        registry.join(p("p1"), "r1");
        registry.join(p("p2"), "r2");

        let recipients = registry
            .apply_state(&p("p1"), PlayerState::placeholder())
            .unwrap();
        assert!(recipients.is_empty());
        assert_eq!(registry.members("r2"), Some(vec![p("p2")]));
        assert!(registry.state_of("r2", &p("p1")).is_none());
    }
}
