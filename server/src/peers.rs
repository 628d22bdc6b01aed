//! Connection bookkeeping for the relay
//!
//! Tracks which socket addresses currently hold a live connection, mints
//! the opaque peer identifiers handed out at connect time, and sweeps
//! connections that have gone silent. The timeout sweep is what turns a
//! vanished client into a `Left` broadcast even when its own leave
//! message never arrived.

use log::info;
use rand::Rng;
use shared::PeerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// One live connection from a client socket.
#[derive(Debug)]
pub struct Connection {
    pub id: PeerId,
    pub addr: SocketAddr,
    /// Last time any packet arrived from this address.
    pub last_seen: Instant,
}

impl Connection {
    fn new(id: PeerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// All live connections, indexed both ways.
///
/// Peer ids are a monotone serial plus random salt, so an id is never
/// reused while the process lives and never collides across quick
/// reconnects from the same address.
pub struct ConnectionTable {
    connections: HashMap<PeerId, Connection>,
    by_addr: HashMap<SocketAddr, PeerId>,
    next_serial: u64,
    timeout: Duration,
}

impl ConnectionTable {
    pub fn new(timeout: Duration) -> Self {
        Self {
            connections: HashMap::new(),
            by_addr: HashMap::new(),
            next_serial: 1,
            timeout,
        }
    }

    fn mint_id(&mut self) -> PeerId {
        let salt: u32 = rand::thread_rng().gen();
        let id = PeerId::new(format!("{:x}-{:08x}", self.next_serial, salt));
        self.next_serial += 1;
        id
    }

    /// Registers a connection from `addr` and returns its fresh id.
    ///
    /// A connect from an address that already holds a connection replaces
    /// it; the caller gets the stale id back so it can announce the leave.
    pub fn connect(&mut self, addr: SocketAddr) -> (PeerId, Option<PeerId>) {
        let stale = self.by_addr.remove(&addr).map(|old| {
            self.connections.remove(&old);
            old
        });

        let id = self.mint_id();
        info!("Peer {} connected from {}", id, addr);
        self.by_addr.insert(addr, id.clone());
        self.connections.insert(id.clone(), Connection::new(id.clone(), addr));
        (id, stale)
    }

    /// Drops a connection. Idempotent.
    pub fn disconnect(&mut self, id: &PeerId) -> bool {
        if let Some(conn) = self.connections.remove(id) {
            self.by_addr.remove(&conn.addr);
            info!("Peer {} disconnected", conn.id);
            true
        } else {
            false
        }
    }

    /// Refreshes the liveness clock for whoever owns `addr`.
    pub fn touch(&mut self, addr: &SocketAddr) {
        if let Some(id) = self.by_addr.get(addr) {
            if let Some(conn) = self.connections.get_mut(id) {
                conn.last_seen = Instant::now();
            }
        }
    }

    pub fn id_for_addr(&self, addr: &SocketAddr) -> Option<PeerId> {
        self.by_addr.get(addr).cloned()
    }

    pub fn addr_for_id(&self, id: &PeerId) -> Option<SocketAddr> {
        self.connections.get(id).map(|conn| conn.addr)
    }

    /// Removes and returns every connection that has been silent past the
    /// configured timeout.
    pub fn check_timeouts(&mut self) -> Vec<PeerId> {
        let timeout = self.timeout;
        let timed_out: Vec<PeerId> = self
            .connections
            .values()
            .filter(|conn| conn.is_timed_out(timeout))
            .map(|conn| conn.id.clone())
            .collect();

        for id in &timed_out {
            self.disconnect(id);
        }

        timed_out
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_connect_assigns_unique_ids() {
        let mut table = ConnectionTable::new(Duration::from_secs(5));
        let (id1, stale1) = table.connect(test_addr());
        let (id2, stale2) = table.connect(test_addr2());

        assert_ne!(id1, id2);
        assert!(stale1.is_none());
        assert!(stale2.is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_reconnect_replaces_and_reports_stale_id() {
        let mut table = ConnectionTable::new(Duration::from_secs(5));
        let (old, _) = table.connect(test_addr());
        let (new, stale) = table.connect(test_addr());

        assert_eq!(stale, Some(old.clone()));
        assert_ne!(new, old);
        assert_eq!(table.len(), 1);
        assert_eq!(table.id_for_addr(&test_addr()), Some(new));
    }

    #[test]
    fn test_id_invalidated_on_disconnect() {
        let mut table = ConnectionTable::new(Duration::from_secs(5));
        let (id, _) = table.connect(test_addr());

        assert!(table.disconnect(&id));
        assert!(table.addr_for_id(&id).is_none());
        assert!(table.id_for_addr(&test_addr()).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_disconnect_unknown_is_noop() {
        let mut table = ConnectionTable::new(Duration::from_secs(5));
        assert!(!table.disconnect(&PeerId::from("ghost")));
    }

    #[test]
    fn test_timeout_sweep() {
        let mut table = ConnectionTable::new(Duration::from_secs(1));
        let (id, _) = table.connect(test_addr());
        let (kept, _) = table.connect(test_addr2());

        if let Some(conn) = table.connections.get_mut(&id) {
            conn.last_seen = Instant::now() - Duration::from_secs(2);
        }

        let timed_out = table.check_timeouts();
        assert_eq!(timed_out, vec![id]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.id_for_addr(&test_addr2()), Some(kept));
    }

    #[test]
    fn test_touch_resets_liveness() {
        let mut table = ConnectionTable::new(Duration::from_secs(1));
        let (id, _) = table.connect(test_addr());

        if let Some(conn) = table.connections.get_mut(&id) {
            conn.last_seen = Instant::now() - Duration::from_secs(2);
        }
        table.touch(&test_addr());

        assert!(table.check_timeouts().is_empty());
        assert_eq!(table.len(), 1);
    }
}
