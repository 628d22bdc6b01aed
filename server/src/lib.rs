//! # Relay Server Library
//!
//! This library implements the relay that stardrift clients connect to.
//! The relay is deliberately not a game server: it never simulates
//! physics and never arbitrates game rules. Each client is authoritative
//! for its own ship; the relay's job is to assign identities, track who
//! is in which room, and rebroadcast what clients tell it.
//!
//! ## Core Responsibilities
//!
//! ### Identity Assignment
//! Every connection is handed an opaque peer id at connect time. Ids are
//! unique for the life of the process and die with their connection, so
//! a reconnecting client always comes back as somebody new and the old
//! identity can be announced as departed.
//!
//! ### Room Tracking
//! Players join named rooms. On every join the relay broadcasts the full
//! roster to the whole room rather than a delta: deliveries are
//! unordered and best-effort, and a complete roster lets late or
//! reconnecting clients converge without sequence numbers.
//!
//! ### State Relay
//! State reports are stored (latest only) and rebroadcast to everyone in
//! the sender's room except the sender. There are no acknowledgments and
//! no retries; a lost update is corrected by the next one.
//!
//! ### Disconnect Detection
//! Clients send a best-effort leave on the way out, but the relay does
//! not rely on it: a timeout sweep drops connections that have gone
//! silent and announces their departure to the room. This is the
//! authoritative removal path.
//!
//! ## Module Organization
//!
//! ### Peers Module (`peers`)
//! Connection table: address/id mapping, id minting, liveness tracking,
//! timeout sweeps.
//!
//! ### Rooms Module (`rooms`)
//! Room registry: rosters, per-player latest state, chat backlogs and
//! reactions, and recipient lists for every broadcast.
//!
//! ### Network Module (`network`)
//! UDP plumbing: receiver/sender/timeout tasks, packet dispatch, and the
//! main relay loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:8080", Duration::from_secs(5)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod peers;
pub mod rooms;
