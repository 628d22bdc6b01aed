//! # Game Client Library
//!
//! Client-side implementation of the stardrift multiplayer game. Each
//! client is authoritative for its own ship and best-effort-broadcasts
//! that state through a relay; everything it knows about other players
//! arrives the same way. There is no lockstep and no server simulation:
//! a missed update is corrected by the next one, and a roster refresh
//! always arrives whole so a late or reconnecting client can converge
//! without sequence numbers.
//!
//! ## Architecture Overview
//!
//! One task drives everything. Inbound relay events, the 20 Hz
//! simulation tick and the 60 Hz render tick interleave through a single
//! `tokio::select!` loop, so an event's roster-and-state mutation is
//! always complete before the next render read. Sends never block and
//! never fail loudly; while the connection is down they are dropped and
//! logged, and the game keeps simulating.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! Owns the UDP socket and the relay-assigned identity; classifies
//! inbound datagrams into events and drops malformed ones.
//!
//! ### Room Module (`room`)
//! The room roster plus the latest known state per peer, mutated only
//! from the event path. Guarantees a renderer never sees a member
//! without a state or a state without a member.
//!
//! ### Publisher Module (`publisher`)
//! Samples the local ship once per simulation tick and builds the full
//! outbound state packet, unconditionally.
//!
//! ### Game Module (`game`)
//! The local ship: rotate/thrust integration, world wrap, ship class.
//! Pure logic, no rendering, no networking.
//!
//! ### Chat Module (`chat`)
//! Bounded log of relayed room chat and reactions.
//!
//! ### Input Module (`input`)
//! Keyboard sampling with press-edge detection for control keys.
//!
//! ### Rendering Module (`rendering`)
//! Draws the local ship, every peer from the room snapshot through the
//! ship-archetype style registry, and the HUD.
//!
//! ### Network Module (`network`)
//! The shell that wires all of the above into the cooperative loop.

pub mod chat;
pub mod game;
pub mod input;
pub mod network;
pub mod publisher;
pub mod rendering;
pub mod room;
pub mod session;
