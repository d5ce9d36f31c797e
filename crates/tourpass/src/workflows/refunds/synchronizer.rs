use std::sync::Arc;

use serde::Serialize;

use super::domain::{OrderId, PassId, PassStatus};
use super::repository::{PassRepository, RepositoryError};

/// Per-pass outcome of a suspend or reactivate sweep.
///
/// Suspend and reactivate are best-effort across the set: a single bad row
/// must not abort the remaining passes, so callers get the split of what
/// happened instead of a swallowed log line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub updated: Vec<PassId>,
    pub skipped: Vec<PassId>,
    pub failed: Vec<PassWriteFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassWriteFailure {
    pub pass_id: PassId,
    pub error: String,
}

/// The only component permitted to mutate pass status as a side effect of
/// refund-state changes.
pub struct PassStateSynchronizer<P> {
    passes: Arc<P>,
}

impl<P> PassStateSynchronizer<P>
where
    P: PassRepository,
{
    pub fn new(passes: Arc<P>) -> Self {
        Self { passes }
    }

    /// Suspend every pass on the order still in `active` or
    /// `pending_activation`, preserving the prior status for restoration.
    /// Idempotent per pass: already suspended passes are skipped and a saved
    /// `previous_status` is never overwritten.
    pub fn suspend(&self, order_id: &OrderId) -> Result<SyncReport, RepositoryError> {
        let mut report = SyncReport::default();

        for mut pass in self.passes.passes_for_order(order_id)? {
            if !pass.suspendable() {
                report.skipped.push(pass.id);
                continue;
            }

            pass.previous_status = pass.previous_status.or(Some(pass.status));
            pass.status = PassStatus::Suspended;
            self.apply(pass, "suspend", &mut report);
        }

        Ok(report)
    }

    /// Restore every suspended pass on the order to its prior status,
    /// inferring `active`/`pending_activation` from the activation date when
    /// no prior status was saved. Used only on refund rejection.
    pub fn reactivate(&self, order_id: &OrderId) -> Result<SyncReport, RepositoryError> {
        let mut report = SyncReport::default();

        for mut pass in self.passes.passes_for_order(order_id)? {
            if pass.status != PassStatus::Suspended {
                report.skipped.push(pass.id);
                continue;
            }

            pass.status = pass.restored_status();
            pass.previous_status = None;
            self.apply(pass, "reactivate", &mut report);
        }

        Ok(report)
    }

    /// Cancel every remaining usable pass on the order in one atomic batched
    /// write. The final gate before marking a refund completed; unlike the
    /// per-pass sweeps above, a failure here is fatal to the caller.
    pub fn force_cancel_remaining(&self, order_id: &OrderId) -> Result<u32, RepositoryError> {
        self.passes.cancel_remaining(order_id)
    }

    fn apply(&self, pass: super::domain::Pass, operation: &'static str, report: &mut SyncReport) {
        let pass_id = pass.id.clone();
        match self.passes.update(pass) {
            Ok(()) => report.updated.push(pass_id),
            Err(err) => {
                tracing::warn!(
                    pass_id = %pass_id.0,
                    operation,
                    error = %err,
                    "per-pass write failed; continuing with remaining passes"
                );
                report.failed.push(PassWriteFailure {
                    pass_id,
                    error: err.to_string(),
                });
            }
        }
    }
}
