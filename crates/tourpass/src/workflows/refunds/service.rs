use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::config::RefundPolicyConfig;

use super::audit::{ActivityLogEntry, AuditRecorder};
use super::domain::{
    AdminIdentity, CustomerIdentity, RefundRequest, RefundRequestId, RefundStatus,
    RefundSubmission, ReviewAction, ReviewCommand,
};
use super::eligibility::{EligibilityError, EligibilityGuard, ScreenError};
use super::repository::{
    LedgerError, OrderRepository, PassRepository, RefundRequestRepository, RepositoryError,
    UsageLedger,
};
use super::review::{ensure_transition, TransitionError};
use super::synchronizer::{PassStateSynchronizer, SyncReport};

/// Service composing the eligibility guard, pass state synchronizer, and
/// review state machine over the storage trait seams.
pub struct RefundService<O, P, R, L, A> {
    orders: Arc<O>,
    passes: Arc<P>,
    refunds: Arc<R>,
    ledger: Arc<L>,
    audit: Arc<A>,
    guard: EligibilityGuard,
    synchronizer: PassStateSynchronizer<P>,
    policy: RefundPolicyConfig,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Created request plus the per-pass suspension outcome, so callers can see
/// (and tests can assert on) partial suspension failures that deliberately
/// do not fail the creation.
#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub request: RefundRequest,
    pub suspension: SyncReport,
}

impl<O, P, R, L, A> RefundService<O, P, R, L, A>
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    R: RefundRequestRepository + 'static,
    L: UsageLedger + 'static,
    A: AuditRecorder + 'static,
{
    pub fn new(
        orders: Arc<O>,
        passes: Arc<P>,
        refunds: Arc<R>,
        ledger: Arc<L>,
        audit: Arc<A>,
        policy: RefundPolicyConfig,
    ) -> Self {
        let synchronizer = PassStateSynchronizer::new(passes.clone());
        Self {
            orders,
            passes,
            refunds,
            ledger,
            audit,
            guard: EligibilityGuard,
            synchronizer,
            policy,
        }
    }

    /// Open the refund workflow for an order.
    ///
    /// The request row is inserted before passes are suspended; a partial
    /// suspension failure is reported in the outcome but never rolls the
    /// request back, because suspend is idempotent and safely re-runnable.
    pub fn request_refund(
        &self,
        caller: &CustomerIdentity,
        submission: RefundSubmission,
    ) -> Result<RefundOutcome, RefundServiceError> {
        let order = self
            .orders
            .fetch(&submission.order_id)?
            .ok_or(EligibilityError::OrderNotFound)?;
        let passes = self.passes.passes_for_order(&order.id)?;
        let in_flight = self.refunds.active_for_order(&order.id)?;

        self.guard
            .screen(caller, &order, &passes, in_flight.as_ref(), &*self.ledger)?;

        let sequence = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let request = RefundRequest {
            id: RefundRequestId(format!("rr-{sequence:06}")),
            request_number: format!("{}-{sequence:06}", self.policy.request_number_prefix),
            order_id: order.id.clone(),
            customer_id: caller.customer_id.clone(),
            status: RefundStatus::Pending,
            reason_kind: submission.reason_kind,
            reason_text: submission.reason_text,
            requested_amount: submission.requested_amount,
            refund_method: None,
            refund_amount: None,
            rejection_reason: None,
            admin_notes: None,
            assigned_to: None,
            reviewed_by: None,
            reviewed_at: None,
            refund_processed_at: None,
            created_at: Utc::now(),
        };

        let request = self.refunds.insert(request)?;
        let suspension = self.synchronizer.suspend(&order.id)?;
        if !suspension.is_clean() {
            tracing::warn!(
                order_id = %order.id.0,
                request_number = %request.request_number,
                failed = suspension.failed.len(),
                "refund created with partial pass suspension"
            );
        }

        let mut detail = BTreeMap::new();
        detail.insert(
            "request_number".to_string(),
            request.request_number.clone(),
        );
        detail.insert(
            "suspended_passes".to_string(),
            suspension.updated.len().to_string(),
        );
        self.record(&caller.customer_id.0, "refund_requested", &request, detail);

        Ok(RefundOutcome {
            request,
            suspension,
        })
    }

    /// Apply one admin review action to a refund request.
    pub fn review(
        &self,
        caller: &AdminIdentity,
        id: &RefundRequestId,
        command: ReviewCommand,
    ) -> Result<RefundRequest, RefundServiceError> {
        let mut request = self.refunds.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        ensure_transition(command.action, request.status)?;

        // Idempotent re-confirmation: the cancel and order writes below are
        // themselves idempotent, so a retry after a partial completion
        // converges without touching the stored request again.
        if command.action == ReviewAction::MarkCompleted
            && request.status == RefundStatus::Completed
        {
            self.synchronizer.force_cancel_remaining(&request.order_id)?;
            self.orders.mark_refunded(&request.order_id)?;
            return Ok(request);
        }

        let now = Utc::now();
        let mut detail = BTreeMap::new();

        match command.action {
            ReviewAction::Assign => {
                request.assigned_to = Some(caller.admin_id.clone());
                request.status = RefundStatus::UnderReview;
            }
            ReviewAction::Approve => {
                let method = command.refund_method.unwrap_or(self.policy.default_method);
                let amount = command.refund_amount.unwrap_or(request.requested_amount);
                request.refund_method = Some(method);
                request.refund_amount = Some(amount);
                request.status = RefundStatus::Approved;
                detail.insert("refund_method".to_string(), method.label().to_string());
                detail.insert("refund_amount".to_string(), amount.to_string());
            }
            ReviewAction::Reject => {
                let reason = command
                    .rejection_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|reason| !reason.is_empty())
                    .ok_or(TransitionError::MissingRejectionReason)?;
                request.rejection_reason = Some(reason.to_string());
                request.status = RefundStatus::Rejected;
            }
            ReviewAction::MarkCompleted => {
                // Cancel first, then flip the order. If the order write fails
                // the passes stay cancelled and the caller retries this
                // action; the request is persisted as completed only after
                // both effects landed.
                let cancelled = self.synchronizer.force_cancel_remaining(&request.order_id)?;
                self.orders.mark_refunded(&request.order_id)?;
                request.status = RefundStatus::Completed;
                request.refund_processed_at = Some(now);
                detail.insert("cancelled_passes".to_string(), cancelled.to_string());
            }
        }

        if let Some(notes) = command.admin_notes {
            request.admin_notes = Some(notes);
        }
        request.reviewed_by = Some(caller.admin_id.clone());
        request.reviewed_at = Some(now);

        self.refunds.update(request.clone())?;

        if request.status == RefundStatus::Rejected {
            let reactivation = self.synchronizer.reactivate(&request.order_id)?;
            detail.insert(
                "reactivated_passes".to_string(),
                reactivation.updated.len().to_string(),
            );
            if !reactivation.is_clean() {
                tracing::warn!(
                    order_id = %request.order_id.0,
                    request_number = %request.request_number,
                    failed = reactivation.failed.len(),
                    "refund rejected with partial pass reactivation"
                );
            }
        }

        self.record(&caller.admin_id.0, command.action.label(), &request, detail);

        Ok(request)
    }

    /// Fetch a refund request for API responses.
    pub fn get(&self, id: &RefundRequestId) -> Result<RefundRequest, RefundServiceError> {
        let request = self.refunds.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(request)
    }

    fn record(
        &self,
        actor: &str,
        action: &str,
        request: &RefundRequest,
        detail: BTreeMap<String, String>,
    ) {
        let entry = ActivityLogEntry {
            actor: actor.to_string(),
            action: action.to_string(),
            order_id: request.order_id.clone(),
            refund_request_id: request.id.clone(),
            detail,
            recorded_at: Utc::now(),
        };

        if let Err(err) = self.audit.append(entry) {
            tracing::warn!(action, error = %err, "audit append failed; transition stands");
        }
    }
}

/// Error raised by the refund service.
#[derive(Debug, thiserror::Error)]
pub enum RefundServiceError {
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<ScreenError> for RefundServiceError {
    fn from(value: ScreenError) -> Self {
        match value {
            ScreenError::Rejected(err) => Self::Eligibility(err),
            ScreenError::Ledger(err) => Self::Ledger(err),
        }
    }
}
