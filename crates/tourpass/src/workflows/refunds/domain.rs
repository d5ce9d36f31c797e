use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for customer orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Identifier wrapper for purchased passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(pub String);

/// Identifier wrapper for refund requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefundRequestId(pub String);

/// Identifier wrapper for storefront customers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

/// Identifier wrapper for back-office reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminId(pub String);

/// Authenticated storefront caller, resolved by the session layer and passed
/// explicitly into every engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerIdentity {
    pub customer_id: CustomerId,
}

/// Authenticated back-office caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub admin_id: AdminId,
}

/// Order lifecycle as owned by the commerce subsystem. The refund engine may
/// only move an order to `Refunded` as the terminal step of a completed
/// refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Snapshot of an order as read from the commerce store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Charged amount in minor currency units.
    pub total_amount: u32,
    pub currency: String,
}

/// Lifecycle of a purchased entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    PendingActivation,
    Active,
    Suspended,
    Cancelled,
    Expired,
    Used,
}

impl PassStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PassStatus::PendingActivation => "pending_activation",
            PassStatus::Active => "active",
            PassStatus::Suspended => "suspended",
            PassStatus::Cancelled => "cancelled",
            PassStatus::Expired => "expired",
            PassStatus::Used => "used",
        }
    }
}

/// A purchased entitlement granting venue access for a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pass {
    pub id: PassId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub status: PassStatus,
    /// Monotonic, incremented only by venue redemption.
    pub usage_count: u32,
    /// Status held before the synchronizer suspended the pass. Written only
    /// by the synchronizer; never overwritten while already set.
    pub previous_status: Option<PassStatus>,
    pub activation_date: Option<NaiveDate>,
    /// Free-form counters mirrored from external scanner payloads
    /// (`used_count`, `visit_count`, `scans`, `redemptions`).
    pub usage_counters: BTreeMap<String, u64>,
}

impl Pass {
    /// Status a suspended pass should return to on refund rejection.
    ///
    /// `previous_status` wins; absent that, a set activation date implies the
    /// pass was `Active`, otherwise it never started.
    pub fn restored_status(&self) -> PassStatus {
        match self.previous_status {
            Some(status) => status,
            None if self.activation_date.is_some() => PassStatus::Active,
            None => PassStatus::PendingActivation,
        }
    }

    /// Whether the suspend operation applies to this pass.
    pub fn suspendable(&self) -> bool {
        matches!(
            self.status,
            PassStatus::Active | PassStatus::PendingActivation
        )
    }
}

/// Refund request lifecycle, owned exclusively by the review state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl RefundStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::UnderReview => "under_review",
            RefundStatus::Approved => "approved",
            RefundStatus::Rejected => "rejected",
            RefundStatus::Completed => "completed",
            RefundStatus::Cancelled => "cancelled",
        }
    }

    /// The one-in-flight gate: while a request for an order sits in any of
    /// these states, no new refund request may be created for that order.
    pub const fn blocks_new_request(self) -> bool {
        matches!(
            self,
            RefundStatus::Pending
                | RefundStatus::UnderReview
                | RefundStatus::Approved
                | RefundStatus::Completed
        )
    }
}

/// Customer-declared motivation for the refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundReasonKind {
    TechnicalIssue,
    NotAsDescribed,
    ChangedPlans,
    DuplicatePurchase,
    Other,
}

impl RefundReasonKind {
    pub const fn label(self) -> &'static str {
        match self {
            RefundReasonKind::TechnicalIssue => "technical_issue",
            RefundReasonKind::NotAsDescribed => "not_as_described",
            RefundReasonKind::ChangedPlans => "changed_plans",
            RefundReasonKind::DuplicatePurchase => "duplicate_purchase",
            RefundReasonKind::Other => "other",
        }
    }
}

/// Settlement channel for an approved refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundMethod {
    OriginalPayment,
    StoreCredit,
}

impl RefundMethod {
    pub const fn label(self) -> &'static str {
        match self {
            RefundMethod::OriginalPayment => "original_payment",
            RefundMethod::StoreCredit => "store_credit",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "original_payment" => Some(RefundMethod::OriginalPayment),
            "store_credit" => Some(RefundMethod::StoreCredit),
            _ => None,
        }
    }
}

/// A customer's request to unwind an order, created by the eligibility guard
/// in state `Pending` and mutated only by the review state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub id: RefundRequestId,
    pub request_number: String,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub status: RefundStatus,
    pub reason_kind: RefundReasonKind,
    pub reason_text: String,
    /// Requested amount in minor currency units.
    pub requested_amount: u32,
    pub refund_method: Option<RefundMethod>,
    pub refund_amount: Option<u32>,
    pub rejection_reason: Option<String>,
    pub admin_notes: Option<String>,
    pub assigned_to: Option<AdminId>,
    pub reviewed_by: Option<AdminId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub refund_processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RefundRequest {
    pub fn status_view(&self) -> RefundRequestView {
        RefundRequestView {
            refund_request_id: self.id.clone(),
            request_number: self.request_number.clone(),
            order_id: self.order_id.clone(),
            status: self.status.label(),
            reason_kind: self.reason_kind.label(),
            requested_amount: self.requested_amount,
            refund_method: self.refund_method.map(RefundMethod::label),
            refund_amount: self.refund_amount,
            rejection_reason: self.rejection_reason.clone(),
            refund_processed_at: self.refund_processed_at,
        }
    }
}

/// Sanitized representation of a refund request for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct RefundRequestView {
    pub refund_request_id: RefundRequestId,
    pub request_number: String,
    pub order_id: OrderId,
    pub status: &'static str,
    pub reason_kind: &'static str,
    pub requested_amount: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_method: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_processed_at: Option<DateTime<Utc>>,
}

/// Customer-facing payload opening the refund workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundSubmission {
    pub order_id: OrderId,
    pub reason_kind: RefundReasonKind,
    pub reason_text: String,
    pub requested_amount: u32,
}

/// Admin-facing review verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Assign,
    Approve,
    Reject,
    MarkCompleted,
}

impl ReviewAction {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewAction::Assign => "assign",
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
            ReviewAction::MarkCompleted => "mark_completed",
        }
    }
}

/// Admin-facing payload driving one review transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCommand {
    pub action: ReviewAction,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub refund_method: Option<RefundMethod>,
    #[serde(default)]
    pub refund_amount: Option<u32>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}
