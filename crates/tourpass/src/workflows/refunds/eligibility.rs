use super::domain::{CustomerIdentity, Order, OrderStatus, Pass, PassStatus, RefundRequest};
use super::repository::{LedgerError, UsageLedger};

/// Metadata counters treated as redemption evidence when positive.
pub const USAGE_COUNTER_KEYS: [&str; 4] = ["used_count", "visit_count", "scans", "redemptions"];

/// Hard rejections blocking entry into the refund workflow. Messages are
/// surfaced verbatim to the requesting customer.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("order not found")]
    OrderNotFound,
    #[error("order does not belong to the requesting customer")]
    OrderNotOwned,
    #[error("order cannot be refunded from status '{status}'")]
    OrderNotRefundable { status: &'static str },
    #[error("a refund request is already in flight for this order ({request_number})")]
    DuplicateInFlight { request_number: String },
    #[error("passes already used: pass '{pass_id}' has recorded usage")]
    PassAlreadyUsed { pass_id: String },
}

/// Screen outcome separating customer-facing rejections from ledger
/// infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error(transparent)]
    Rejected(#[from] EligibilityError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Decides whether an order may enter the refund workflow.
#[derive(Debug, Default, Clone)]
pub struct EligibilityGuard;

impl EligibilityGuard {
    /// Run the full validation sequence. Each check is a hard rejection and
    /// nothing is mutated on any path through this function.
    pub fn screen<L>(
        &self,
        caller: &CustomerIdentity,
        order: &Order,
        passes: &[Pass],
        in_flight: Option<&RefundRequest>,
        ledger: &L,
    ) -> Result<(), ScreenError>
    where
        L: UsageLedger + ?Sized,
    {
        if order.customer_id != caller.customer_id {
            return Err(EligibilityError::OrderNotOwned.into());
        }

        if matches!(order.status, OrderStatus::Refunded | OrderStatus::Cancelled) {
            return Err(EligibilityError::OrderNotRefundable {
                status: order.status.label(),
            }
            .into());
        }

        if let Some(existing) = in_flight {
            if existing.status.blocks_new_request() {
                return Err(EligibilityError::DuplicateInFlight {
                    request_number: existing.request_number.clone(),
                }
                .into());
            }
        }

        for pass in passes {
            if usage_blocks_refund(pass) || ledger.has_redemption(&pass.id)? {
                return Err(EligibilityError::PassAlreadyUsed {
                    pass_id: pass.id.0.clone(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Whether a pass is unusable-for-refund on local evidence alone (status,
/// redemption counter, metadata counters). The usage ledger is consulted
/// separately. `Suspended` and `PendingActivation` are exempt from the
/// status leg: the former is already mid-refund, the latter never started.
pub fn usage_blocks_refund(pass: &Pass) -> bool {
    if matches!(
        pass.status,
        PassStatus::Cancelled | PassStatus::Expired | PassStatus::Used
    ) {
        return true;
    }

    if pass.usage_count > 0 {
        return true;
    }

    USAGE_COUNTER_KEYS
        .iter()
        .any(|key| pass.usage_counters.get(*key).is_some_and(|count| *count > 0))
}
