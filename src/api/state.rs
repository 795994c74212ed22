//! Application State
//!
//! Shared state accessible by all API handlers. The broadcast hub is
//! constructed once at startup and injected here; handlers reach it
//! through the state rather than through any ambient global.

use crate::store::MatchStore;
use crate::websocket::{BroadcastHub, ConfigGate, HandshakeGate, HubConfig};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Match and commentary persistence
    pub store: Arc<MatchStore>,
    /// Broadcast hub for real-time fan-out
    pub hub: Arc<BroadcastHub>,
    /// Admission gate for WebSocket upgrade attempts
    pub gate: Arc<dyn HandshakeGate>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state with a default (admit-all, hub-capacity) gate.
    pub fn new(store: Arc<MatchStore>, hub_config: HubConfig) -> Self {
        let gate = Arc::new(ConfigGate::new(vec![], hub_config.max_connections));
        Self::with_gate(store, hub_config, gate)
    }

    /// Create state with an explicit gate implementation.
    pub fn with_gate(
        store: Arc<MatchStore>,
        hub_config: HubConfig,
        gate: Arc<dyn HandshakeGate>,
    ) -> Self {
        Self {
            store,
            hub: Arc::new(BroadcastHub::new(hub_config)),
            gate,
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
