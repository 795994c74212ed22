//! Subscription Index
//!
//! Maps topics (one per match, plus the reserved "global" topic) to the
//! set of connection ids currently interested. Topics exist only as keys
//! with a non-empty subscriber set; the last unsubscribe removes the key.

use std::collections::{HashMap, HashSet};

use super::registry::ConnectionId;

/// Topic → subscriber-id set
#[derive(Default)]
pub struct SubscriptionIndex {
    topics: HashMap<String, HashSet<ConnectionId>>,
}

impl SubscriptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a topic's subscriber set. Idempotent; returns
    /// false if the connection was already subscribed.
    pub fn subscribe(&mut self, id: &str, topic: &str) -> bool {
        self.topics
            .entry(topic.to_string())
            .or_default()
            .insert(id.to_string())
    }

    /// Remove a connection from a topic's subscriber set, dropping the
    /// topic key entirely once empty. Idempotent; returns false if there
    /// was no such subscription.
    pub fn unsubscribe(&mut self, id: &str, topic: &str) -> bool {
        let Some(subscribers) = self.topics.get_mut(topic) else {
            return false;
        };
        let removed = subscribers.remove(id);
        if subscribers.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }

    /// Remove a connection from every topic it belongs to. Called exactly
    /// once, at connection removal.
    pub fn unsubscribe_all(&mut self, id: &str, topics: &HashSet<String>) {
        for topic in topics {
            self.unsubscribe(id, topic);
        }
    }

    /// Snapshot of a topic's subscribers. A copy, not a live view, so
    /// fan-out iteration cannot observe concurrent mutation.
    pub fn subscribers_of(&self, topic: &str) -> HashSet<ConnectionId> {
        self.topics.get(topic).cloned().unwrap_or_default()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map(|s| s.len()).unwrap_or(0)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// True if the connection appears in any topic's subscriber set.
    /// Used by tests to assert coordinated cleanup.
    pub fn contains(&self, id: &str) -> bool {
        self.topics.values().any(|subs| subs.contains(id))
    }
}
