//! Publishes the local ship's state once per simulation tick
//!
//! Cadence is the simulation tick, not the render frame; 20 Hz bounds
//! outbound volume regardless of refresh rate. Every tick sends the
//! whole state unconditionally: no deltas, no dirty-checking, no
//! batching. A lost packet is simply corrected by the next tick's.

use crate::game::LocalShip;
use shared::Packet;

pub struct StatePublisher {
    published: u64,
}

impl StatePublisher {
    pub fn new() -> Self {
        Self { published: 0 }
    }

    /// Builds this tick's outbound state packet, or `None` while no ship
    /// has spawned yet.
    pub fn sample(&mut self, ship: Option<&LocalShip>) -> Option<Packet> {
        let ship = ship?;
        self.published += 1;
        Some(Packet::State {
            state: ship.state(),
        })
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new()
    }
}
