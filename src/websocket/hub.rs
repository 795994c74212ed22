//! Broadcast Hub
//!
//! Public-facing fan-out API used by the HTTP write path. Composes the
//! connection registry and subscription index behind a single lock so the
//! inbound-message path (subscribe/unsubscribe), the publish path, and the
//! disconnect path all share one serialization discipline.
//!
//! Delivery is best-effort push: each subscriber has a small bounded
//! outbound buffer, sends are non-blocking, and a subscriber that is full
//! or gone is pruned rather than retried. A broadcast failure never turns
//! a successful persisted write into an HTTP error.

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};

use super::index::SubscriptionIndex;
use super::messages::{Control, Event, EventKind, ServerMessage, GLOBAL_TOPIC};
use super::registry::{ConnectionId, ConnectionRegistry, ConnectionState};

/// Configuration for the broadcast hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Capacity of each connection's outbound buffer; a subscriber that
    /// overflows it is dropped rather than allowed to block the publisher
    pub outbound_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            outbound_buffer: 64,
        }
    }
}

/// Errors reported to hub callers
///
/// None of these reach the publish path; `publish` swallows subscriber
/// failures by contract.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections")]
    TooManyConnections,

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Connection is not open")]
    NotOpen,

    #[error("Failed to send message")]
    SendFailed,
}

struct HubInner {
    registry: ConnectionRegistry,
    index: SubscriptionIndex,
}

/// Fan-out hub keyed by match topic
pub struct BroadcastHub {
    inner: RwLock<HubInner>,
    config: HubConfig,
}

impl BroadcastHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            inner: RwLock::new(HubInner {
                registry: ConnectionRegistry::new(),
                index: SubscriptionIndex::new(),
            }),
            config,
        }
    }

    /// Register a new connection and hand back its id plus the receiving
    /// half of its bounded outbound buffer. The per-socket writer task
    /// drains the receiver.
    pub async fn register(
        &self,
    ) -> Result<(ConnectionId, mpsc::Receiver<ServerMessage>), HubError> {
        let mut inner = self.inner.write().await;
        if inner.registry.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections);
        }

        let (tx, rx) = mpsc::channel(self.config.outbound_buffer);
        let id = inner.registry.register(tx);

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok((id, rx))
    }

    /// Current lifecycle state, if the connection is still tracked.
    pub async fn connection_state(&self, id: &str) -> Option<ConnectionState> {
        self.inner.read().await.registry.get(id).map(|c| c.state)
    }

    /// Transition a connection to Closing; inbound frames for it are
    /// ignored from here on.
    pub async fn mark_closing(&self, id: &str) {
        self.inner.write().await.registry.mark_closing(id);
    }

    /// Subscribe an Open connection to a topic. Idempotent.
    pub async fn subscribe(&self, id: &str, topic: &str) -> Result<(), HubError> {
        let mut inner = self.inner.write().await;
        let conn = inner.registry.get_mut(id).ok_or(HubError::ConnectionNotFound)?;
        if !conn.is_open() {
            return Err(HubError::NotOpen);
        }
        conn.touch();
        conn.topics.insert(topic.to_string());
        inner.index.subscribe(id, topic);

        tracing::debug!(connection_id = %id, topic = %topic, "Subscribed");
        Ok(())
    }

    /// Unsubscribe a connection from a topic. Idempotent.
    pub async fn unsubscribe(&self, id: &str, topic: &str) -> Result<(), HubError> {
        let mut inner = self.inner.write().await;
        let conn = inner.registry.get_mut(id).ok_or(HubError::ConnectionNotFound)?;
        if !conn.is_open() {
            return Err(HubError::NotOpen);
        }
        conn.touch();
        conn.topics.remove(topic);
        inner.index.unsubscribe(id, topic);

        tracing::debug!(connection_id = %id, topic = %topic, "Unsubscribed");
        Ok(())
    }

    /// Publish an event to every subscriber of its topic.
    ///
    /// Never returns an error: a topic with zero subscribers is a no-op,
    /// and a subscriber whose buffer is full or whose socket is gone is
    /// pruned from registry and index as part of this call. Delivery order
    /// across subscribers is unspecified.
    pub async fn publish(&self, topic: &str, kind: EventKind, payload: Value) {
        let event = Event::new(kind, topic, payload);

        // Snapshot ids and sender handles under the read guard, then send
        // outside it so pruning can retake the write lock.
        let targets: Vec<(ConnectionId, mpsc::Sender<ServerMessage>)> = {
            let inner = self.inner.read().await;
            inner
                .index
                .subscribers_of(topic)
                .into_iter()
                .filter_map(|id| {
                    let conn = inner.registry.get(&id)?;
                    conn.is_open().then(|| (id, conn.sender.clone()))
                })
                .collect()
        };

        if targets.is_empty() {
            return;
        }

        let message = ServerMessage::from(event);
        let mut stale = Vec::new();
        let mut delivered = 0;

        for (id, sender) in targets {
            match sender.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = %id,
                        topic = %topic,
                        "Outbound buffer full, dropping slow subscriber"
                    );
                    stale.push(id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(
                        connection_id = %id,
                        topic = %topic,
                        "Subscriber gone, pruning"
                    );
                    stale.push(id);
                }
            }
        }

        for id in &stale {
            self.on_connection_closed(id).await;
        }

        tracing::trace!(
            topic = %topic,
            delivered,
            pruned = stale.len(),
            "Broadcast event"
        );
    }

    /// Write-path entry point: a match row was persisted.
    pub async fn publish_match_created(&self, match_payload: Value) {
        self.publish(GLOBAL_TOPIC, EventKind::MatchCreated, match_payload)
            .await;
    }

    /// Write-path entry point: a commentary row was persisted.
    pub async fn publish_commentary_created(&self, match_id: i64, commentary: Value) {
        self.publish(
            &match_id.to_string(),
            EventKind::CommentaryCreated,
            commentary,
        )
        .await;
    }

    /// Tear down a connection: registry removal first, then index
    /// cleanup, so a Closed connection never lingers in a subscriber set.
    /// Idempotent; the second call for the same id is a no-op.
    pub async fn on_connection_closed(&self, id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(conn) = inner.registry.remove(id) {
            inner.index.unsubscribe_all(id, &conn.topics);
            tracing::info!(connection_id = %id, "WebSocket disconnected");
        }
    }

    /// Send a control frame directly to one connection.
    pub async fn send_to(&self, id: &str, control: Control) -> Result<(), HubError> {
        let sender = {
            let inner = self.inner.read().await;
            let conn = inner.registry.get(id).ok_or(HubError::ConnectionNotFound)?;
            conn.sender.clone()
        };
        sender
            .try_send(ServerMessage::from(control))
            .map_err(|_| HubError::SendFailed)
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.registry.len()
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.read().await.index.subscriber_count(topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hub() -> BroadcastHub {
        BroadcastHub::new(HubConfig::default())
    }

    fn event_topic(msg: &ServerMessage) -> &str {
        match msg {
            ServerMessage::Event(e) => &e.topic,
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subscribe_then_publish_delivers_exactly_once() {
        let hub = hub();
        let (id, mut rx) = hub.register().await.unwrap();

        hub.subscribe(&id, "42").await.unwrap();
        assert_eq!(hub.subscriber_count("42").await, 1);

        hub.publish("42", EventKind::CommentaryCreated, json!({"minute": 10}))
            .await;

        let msg = rx.try_recv().unwrap();
        assert_eq!(event_topic(&msg), "42");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let hub = hub();
        let (id, mut rx) = hub.register().await.unwrap();

        hub.subscribe(&id, "42").await.unwrap();
        hub.unsubscribe(&id, "42").await.unwrap();

        hub.publish("42", EventKind::CommentaryCreated, json!({})).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_a_noop() {
        let hub = hub();
        // Must return normally with no visible effect.
        hub.publish("42", EventKind::CommentaryCreated, json!({})).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_topic_isolation() {
        let hub = hub();
        let (a, mut rx_a) = hub.register().await.unwrap();
        let (b, mut rx_b) = hub.register().await.unwrap();

        hub.subscribe(&a, "1").await.unwrap();
        hub.subscribe(&b, "2").await.unwrap();

        hub.publish("1", EventKind::CommentaryCreated, json!({})).await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_global_and_match_topics_route_independently() {
        let hub = hub();
        let (a, mut rx_a) = hub.register().await.unwrap();
        let (b, mut rx_b) = hub.register().await.unwrap();

        hub.subscribe(&a, "42").await.unwrap();
        hub.subscribe(&b, GLOBAL_TOPIC).await.unwrap();

        hub.publish_match_created(json!({"id": 7})).await;
        assert!(rx_a.try_recv().is_err());
        assert_eq!(event_topic(&rx_b.try_recv().unwrap()), "global");

        hub.publish_commentary_created(42, json!({"minute": 10, "text": "Goal"}))
            .await;
        assert_eq!(event_topic(&rx_a.try_recv().unwrap()), "42");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_connection_is_pruned_everywhere() {
        let hub = hub();
        let (id, _rx) = hub.register().await.unwrap();
        hub.subscribe(&id, "42").await.unwrap();

        hub.on_connection_closed(&id).await;

        assert_eq!(hub.connection_count().await, 0);
        assert_eq!(hub.subscriber_count("42").await, 0);
        assert!(hub.connection_state(&id).await.is_none());

        // Publish to the topic it had subscribed to still succeeds.
        hub.publish("42", EventKind::CommentaryCreated, json!({})).await;
    }

    #[tokio::test]
    async fn test_on_connection_closed_is_idempotent() {
        let hub = hub();
        let (id, _rx) = hub.register().await.unwrap();
        hub.subscribe(&id, "42").await.unwrap();

        hub.on_connection_closed(&id).await;
        hub.on_connection_closed(&id).await;

        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_publish_prunes_dropped_receiver() {
        let hub = hub();
        let (gone, rx) = hub.register().await.unwrap();
        let (live, mut rx_live) = hub.register().await.unwrap();

        hub.subscribe(&gone, "42").await.unwrap();
        hub.subscribe(&live, "42").await.unwrap();

        // Simulated transport failure: the writer side is gone.
        drop(rx);

        hub.publish("42", EventKind::CommentaryCreated, json!({})).await;

        // The live subscriber still got the event; the dead one is gone
        // from both registry and index.
        assert!(rx_live.try_recv().is_ok());
        assert_eq!(hub.connection_count().await, 1);
        assert_eq!(hub.subscriber_count("42").await, 1);
    }

    #[tokio::test]
    async fn test_slow_subscriber_is_dropped_not_blocked() {
        let hub = BroadcastHub::new(HubConfig {
            max_connections: 10,
            outbound_buffer: 2,
        });
        let (id, _rx) = hub.register().await.unwrap();
        hub.subscribe(&id, "42").await.unwrap();

        // Fill the buffer without draining it, then overflow.
        for _ in 0..3 {
            hub.publish("42", EventKind::CommentaryCreated, json!({})).await;
        }

        assert_eq!(hub.connection_count().await, 0);
        assert_eq!(hub.subscriber_count("42").await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_connection_errors() {
        let hub = hub();
        let err = hub.subscribe("nope", "42").await.unwrap_err();
        assert!(matches!(err, HubError::ConnectionNotFound));

        let err = hub.unsubscribe("nope", "42").await.unwrap_err();
        assert!(matches!(err, HubError::ConnectionNotFound));
    }

    #[tokio::test]
    async fn test_subscribe_while_closing_errors() {
        let hub = hub();
        let (id, _rx) = hub.register().await.unwrap();
        hub.mark_closing(&id).await;

        let err = hub.subscribe(&id, "42").await.unwrap_err();
        assert!(matches!(err, HubError::NotOpen));
        assert_eq!(hub.subscriber_count("42").await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent_through_hub() {
        let hub = hub();
        let (id, mut rx) = hub.register().await.unwrap();

        hub.subscribe(&id, "42").await.unwrap();
        hub.subscribe(&id, "42").await.unwrap();

        hub.publish("42", EventKind::CommentaryCreated, json!({})).await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = BroadcastHub::new(HubConfig {
            max_connections: 2,
            outbound_buffer: 8,
        });

        let (_a, _rx_a) = hub.register().await.unwrap();
        let (_b, _rx_b) = hub.register().await.unwrap();

        let err = hub.register().await.map(|_| ()).unwrap_err();
        assert!(matches!(err, HubError::TooManyConnections));
    }

    #[tokio::test]
    async fn test_multiple_topics_per_connection() {
        let hub = hub();
        let (id, mut rx) = hub.register().await.unwrap();

        hub.subscribe(&id, "42").await.unwrap();
        hub.subscribe(&id, GLOBAL_TOPIC).await.unwrap();

        hub.publish("42", EventKind::CommentaryCreated, json!({})).await;
        hub.publish_match_created(json!({})).await;

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }
}
