//! Real-Time Broadcast Channel
//!
//! Pushes newly created matches and commentary to live observers without
//! polling.
//!
//! ## Architecture
//!
//! - **ConnectionRegistry**: owns live connections and their lifecycle
//! - **SubscriptionIndex**: topic → interested connection ids
//! - **BroadcastHub**: composes the two; subscribe/unsubscribe/publish
//! - **HandshakeGate**: admission check before any hub state is created
//! - **Handler**: axum upgrade handler and per-socket tasks
//!
//! ## Usage
//!
//! Clients connect to `/ws` and subscribe by topic:
//! - `"<matchId>"` - commentary for one match
//! - `"global"` - match-creation events
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8000/ws');
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({action: 'subscribe', topic: '42'}));
//! };
//! ws.onmessage = (event) => console.log(JSON.parse(event.data));
//! ```

mod gate;
mod handler;
mod hub;
mod index;
mod messages;
mod registry;

pub use gate::{ConfigGate, DenyReason, GateDecision, HandshakeGate, UpgradeRequest};
pub use handler::websocket_handler;
pub use hub::{BroadcastHub, HubConfig, HubError};
pub use messages::{ClientMessage, Control, Event, EventKind, ServerMessage, GLOBAL_TOPIC};
pub use registry::{Connection, ConnectionId, ConnectionRegistry, ConnectionState};

pub use index::SubscriptionIndex;
