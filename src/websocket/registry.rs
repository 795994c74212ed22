//! Connection Registry
//!
//! Owns the set of live observer connections and their lifecycle state.
//! The registry is a plain map; the [`BroadcastHub`](super::hub::BroadcastHub)
//! serializes all access to it behind a single lock.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::ServerMessage;

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Lifecycle of a single connection
///
/// `Connecting` covers the admission phase before the registry holds an
/// entry; registered entries start at `Open`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// A tracked observer connection
///
/// The transport handle is the sending half of a bounded channel; the
/// receiving half lives in the per-socket writer task. The recorded topic
/// set mirrors the subscription index exactly.
pub struct Connection {
    pub sender: mpsc::Sender<ServerMessage>,
    pub state: ConnectionState,
    pub topics: HashSet<String>,
    pub last_activity: DateTime<Utc>,
}

impl Connection {
    fn new(sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            sender,
            state: ConnectionState::Open,
            topics: HashSet::new(),
            last_activity: Utc::now(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

/// Registry of live connections keyed by id
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection in state Open and return its fresh id.
    pub fn register(&mut self, sender: mpsc::Sender<ServerMessage>) -> ConnectionId {
        let id = Uuid::new_v4().to_string();
        self.connections.insert(id.clone(), Connection::new(sender));
        id
    }

    pub fn get(&self, id: &str) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Connection> {
        self.connections.get_mut(id)
    }

    /// Transition a connection to Closing. No-op for unknown ids or
    /// connections already past Open.
    pub fn mark_closing(&mut self, id: &str) {
        if let Some(conn) = self.connections.get_mut(id) {
            if conn.state == ConnectionState::Open {
                conn.state = ConnectionState::Closing;
            }
        }
    }

    /// Remove a connection, transitioning it to Closed.
    ///
    /// Returns the removed entry so the caller can drop its subscriptions
    /// from the index (invariant: a Closed connection appears in no
    /// topic's subscriber set).
    pub fn remove(&mut self, id: &str) -> Option<Connection> {
        self.connections.remove(id).map(|mut conn| {
            conn.state = ConnectionState::Closed;
            conn
        })
    }

    /// Visit every live connection. Diagnostics only; fan-out resolves
    /// targets through the subscription index instead.
    pub fn for_each(&self, mut visitor: impl FnMut(&ConnectionId, &Connection)) {
        for (id, conn) in &self.connections {
            visitor(id, conn);
        }
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

    fn sender() -> mpsc::Sender<ServerMessage> {
        mpsc::channel(8).0
    }

    #[test]
    fn test_register_creates_open_connection() {
        let mut registry = ConnectionRegistry::new();
        let id = registry.register(sender());

        assert!(!id.is_empty());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&id).unwrap().is_open());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut registry = ConnectionRegistry::new();
        let a = registry.register(sender());
        let b = registry.register(sender());
        assert_ne!(a, b);
    }

    #[test]
    fn test_mark_closing_then_remove() {
        let mut registry = ConnectionRegistry::new();
        let id = registry.register(sender());

        registry.mark_closing(&id);
        assert_eq!(registry.get(&id).unwrap().state, ConnectionState::Closing);

        let removed = registry.remove(&id).unwrap();
        assert_eq!(removed.state, ConnectionState::Closed);
        assert!(registry.get(&id).is_none());
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut registry = ConnectionRegistry::new();
        assert!(registry.remove("nope").is_none());
    }

    #[test]
    fn test_mark_closing_does_not_resurrect() {
        let mut registry = ConnectionRegistry::new();
        let id = registry.register(sender());
        registry.mark_closing(&id);
        // A second mark_closing keeps the state as-is.
        registry.mark_closing(&id);
        assert_eq!(registry.get(&id).unwrap().state, ConnectionState::Closing);
    }

    #[test]
    fn test_for_each_visits_all() {
        let mut registry = ConnectionRegistry::new();
        registry.register(sender());
        registry.register(sender());

        let mut seen = 0;
        registry.for_each(|_, _| seen += 1);
        assert_eq!(seen, 2);
    }
}
