//! Audit trail for gated ballot operations
//!
//! Every attempt at a mutating operation (register voter, change phase,
//! vote) produces one [`AuditEvent`], whether it was committed or rejected.
//! Sinks decide where the events go.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Audit event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditCategory {
    /// Admin quorum decisions
    Authorization,
    /// Voter registration
    Registration,
    /// Lifecycle transitions
    Phase,
    /// Ballots cast
    Vote,
}

impl std::fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditCategory::Authorization => write!(f, "AUTHZ"),
            AuditCategory::Registration => write!(f, "REGISTER"),
            AuditCategory::Phase => write!(f, "PHASE"),
            AuditCategory::Vote => write!(f, "VOTE"),
        }
    }
}

/// Audit outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Committed,
    Rejected,
}

/// Audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: String,

    /// Timestamp (Unix millis)
    pub timestamp: i64,

    pub category: AuditCategory,

    /// Operation name (e.g. "registerVoter")
    pub action: String,

    pub outcome: AuditOutcome,

    /// Who the operation acted for (voter or admin signers)
    pub actor: Option<String>,

    /// Sorted so serialized events are stable
    pub details: BTreeMap<String, String>,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(category: AuditCategory, action: &str, outcome: AuditOutcome) -> Self {
        Self {
            event_id: uuid::Uuid::now_v7().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            category,
            action: action.to_string(),
            outcome,
            actor: None,
            details: BTreeMap::new(),
        }
    }

    /// Set actor
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Add detail
    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Audit log sink
pub trait AuditSink: Send + Sync {
    /// Write an audit event
    fn write(&self, event: &AuditEvent);
}

/// Emits audit events as structured tracing records
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn write(&self, event: &AuditEvent) {
        let actor = event.actor.as_deref().unwrap_or("-");
        match event.outcome {
            AuditOutcome::Committed => info!(
                target: "ballot::audit",
                event_id = %event.event_id,
                category = %event.category,
                action = %event.action,
                actor,
                details = ?event.details,
                "committed"
            ),
            AuditOutcome::Rejected => warn!(
                target: "ballot::audit",
                event_id = %event.event_id,
                category = %event.category,
                action = %event.action,
                actor,
                details = ?event.details,
                "rejected"
            ),
        }
    }
}

/// Keeps events in memory (inspection and tests)
#[derive(Default, Clone)]
pub struct MemoryAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn write(&self, event: &AuditEvent) {
        self.events.write().push(event.clone());
    }
}

/// Fans audit events out to every configured sink
pub struct AuditLog {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl AuditLog {
    /// Audit log writing to tracing
    pub fn new() -> Self {
        Self {
            sinks: vec![Arc::new(TracingAuditSink)],
        }
    }

    /// Audit log with no sinks
    pub fn disabled() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a sink
    pub fn add_sink(&mut self, sink: Arc<dyn AuditSink>) {
        self.sinks.push(sink);
    }

    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.add_sink(sink);
        self
    }

    /// Log an audit event
    pub fn record(&self, event: AuditEvent) {
        for sink in &self.sinks {
            sink.write(&event);
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
