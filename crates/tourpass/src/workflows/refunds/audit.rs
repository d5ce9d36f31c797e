use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{OrderId, RefundRequestId};

/// Immutable activity-log entry appended after every successful transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub actor: String,
    pub action: String,
    pub order_id: OrderId,
    pub refund_request_id: RefundRequestId,
    pub detail: BTreeMap<String, String>,
    pub recorded_at: DateTime<Utc>,
}

/// Outbound hook to the platform's activity log. Fire-and-forget: the engine
/// logs append failures and never blocks or reverses a transition on them.
pub trait AuditRecorder: Send + Sync {
    fn append(&self, entry: ActivityLogEntry) -> Result<(), AuditError>;
}

/// Audit transport error.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit transport unavailable: {0}")]
    Transport(String),
}

/// Default recorder emitting structured log lines instead of store writes.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditRecorder;

impl AuditRecorder for TracingAuditRecorder {
    fn append(&self, entry: ActivityLogEntry) -> Result<(), AuditError> {
        tracing::info!(
            actor = %entry.actor,
            action = %entry.action,
            order_id = %entry.order_id.0,
            refund_request_id = %entry.refund_request_id.0,
            "refund activity"
        );
        Ok(())
    }
}
