//! Room roster and last-known remote state
//!
//! Membership and state live behind one struct and are mutated only by
//! the inbound-event path, so every method upholds a single invariant:
//! the set of peers with stored state is exactly the set of room
//! members. A leave removes both in one call; a roster replaces both in
//! one call. Readers (the render path) take a point-in-time snapshot and
//! never observe a half-applied event.

use log::debug;
use shared::{PeerId, PlayerState};
use std::collections::{HashMap, HashSet};

pub struct RoomTracker {
    members: HashSet<PeerId>,
    states: HashMap<PeerId, PlayerState>,
}

impl RoomTracker {
    pub fn new() -> Self {
        Self {
            members: HashSet::new(),
            states: HashMap::new(),
        }
    }

    /// Replaces the membership with `roster`, minus ourselves.
    ///
    /// Rosters arrive whole, not as deltas: whatever we believed before
    /// is discarded. New members get a placeholder state immediately so
    /// a renderer never finds a member without one; members missing from
    /// the roster lose their state with their membership.
    pub fn apply_roster(&mut self, roster: &[PeerId], local: Option<&PeerId>) {
        self.members = roster
            .iter()
            .filter(|id| Some(*id) != local)
            .cloned()
            .collect();

        for id in &self.members {
            self.states
                .entry(id.clone())
                .or_insert_with(PlayerState::placeholder);
        }
        self.states.retain(|id, _| self.members.contains(id));
    }

    /// Last-write-wins overwrite of one peer's state.
    ///
    /// Our own echoes are dropped (local state is authored locally), and
    /// so are updates for peers we do not know: admitting those would
    /// resurrect ghosts from updates reordered past their leave.
    pub fn apply_state(&mut self, player_id: PeerId, state: PlayerState, local: Option<&PeerId>) {
        if Some(&player_id) == local {
            return;
        }
        if !self.members.contains(&player_id) {
            debug!("Dropping state for non-member {}", player_id);
            return;
        }
        self.states.insert(player_id, state);
    }

    /// Removes a peer's membership and state together. Idempotent: a
    /// duplicate or late leave changes nothing.
    pub fn remove_peer(&mut self, player_id: &PeerId) {
        self.members.remove(player_id);
        self.states.remove(player_id);
    }

    /// Point-in-time copy for the render path.
    pub fn snapshot(&self) -> HashMap<PeerId, PlayerState> {
        self.states.clone()
    }

    pub fn state_of(&self, player_id: &PeerId) -> Option<&PlayerState> {
        self.states.get(player_id)
    }

    pub fn contains(&self, player_id: &PeerId) -> bool {
        self.members.contains(player_id)
    }

    pub fn members(&self) -> &HashSet<PeerId> {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Forgets everyone. Used when we leave the room or lose the
    /// connection; nothing may linger from a room we are no longer in.
    pub fn clear(&mut self) {
        self.members.clear();
        self.states.clear();
    }
}

impl Default for RoomTracker {
    fn default() -> Self {
        Self::new()
    }
}
