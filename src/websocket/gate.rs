//! Handshake Gate
//!
//! Admission check run once per connection attempt, before any hub state
//! exists for it. The hub only consumes the allow/deny contract; what a
//! gate actually inspects is its own business.

use async_trait::async_trait;
use axum::http::HeaderMap;
use thiserror::Error;

/// Why an upgrade attempt was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("Origin not allowed")]
    OriginNotAllowed,

    #[error("Connection limit reached")]
    AtCapacity,
}

/// Outcome of the admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(DenyReason),
}

/// What the gate gets to look at for an upgrade attempt
pub struct UpgradeRequest<'a> {
    pub headers: &'a HeaderMap,
    /// Connections the hub currently tracks
    pub active_connections: usize,
}

/// Admission check for incoming WebSocket upgrade attempts.
///
/// On deny no connection is ever created and the transport is closed
/// immediately (the handler answers 403 instead of upgrading).
#[async_trait]
pub trait HandshakeGate: Send + Sync {
    async fn check(&self, request: &UpgradeRequest<'_>) -> GateDecision;
}

/// Default gate: optional origin allowlist plus a connection cap.
///
/// An empty allowlist admits every origin, including requests without an
/// Origin header (non-browser clients).
pub struct ConfigGate {
    allowed_origins: Vec<String>,
    max_connections: usize,
}

impl ConfigGate {
    pub fn new(allowed_origins: Vec<String>, max_connections: usize) -> Self {
        Self {
            allowed_origins,
            max_connections,
        }
    }

    fn origin_allowed(&self, headers: &HeaderMap) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        headers
            .get("origin")
            .and_then(|v| v.to_str().ok())
            .map(|origin| self.allowed_origins.iter().any(|a| a == origin))
            .unwrap_or(false)
    }
}

#[async_trait]
impl HandshakeGate for ConfigGate {
    async fn check(&self, request: &UpgradeRequest<'_>) -> GateDecision {
        if request.active_connections >= self.max_connections {
            return GateDecision::Deny(DenyReason::AtCapacity);
        }
        if !self.origin_allowed(request.headers) {
            return GateDecision::Deny(DenyReason::OriginNotAllowed);
        }
        GateDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_origin(origin: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("origin", origin.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn test_empty_allowlist_admits_all() {
        let gate = ConfigGate::new(vec![], 10);
        let headers = HeaderMap::new();
        let request = UpgradeRequest {
            headers: &headers,
            active_connections: 0,
        };
        assert_eq!(gate.check(&request).await, GateDecision::Allow);
    }

    #[tokio::test]
    async fn test_origin_allowlist_enforced() {
        let gate = ConfigGate::new(vec!["http://localhost:3000".to_string()], 10);

        let good = headers_with_origin("http://localhost:3000");
        let request = UpgradeRequest {
            headers: &good,
            active_connections: 0,
        };
        assert_eq!(gate.check(&request).await, GateDecision::Allow);

        let bad = headers_with_origin("http://evil.example");
        let request = UpgradeRequest {
            headers: &bad,
            active_connections: 0,
        };
        assert_eq!(
            gate.check(&request).await,
            GateDecision::Deny(DenyReason::OriginNotAllowed)
        );
    }

    #[tokio::test]
    async fn test_missing_origin_denied_when_allowlist_set() {
        let gate = ConfigGate::new(vec!["http://localhost:3000".to_string()], 10);
        let headers = HeaderMap::new();
        let request = UpgradeRequest {
            headers: &headers,
            active_connections: 0,
        };
        assert_eq!(
            gate.check(&request).await,
            GateDecision::Deny(DenyReason::OriginNotAllowed)
        );
    }

    #[tokio::test]
    async fn test_capacity_denied() {
        let gate = ConfigGate::new(vec![], 2);
        let headers = HeaderMap::new();
        let request = UpgradeRequest {
            headers: &headers,
            active_connections: 2,
        };
        assert_eq!(
            gate.check(&request).await,
            GateDecision::Deny(DenyReason::AtCapacity)
        );
    }
}
