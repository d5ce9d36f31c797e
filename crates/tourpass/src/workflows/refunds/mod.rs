//! Refund lifecycle and pass-state synchronization.
//!
//! Keeps three related records consistent as a refund moves through review:
//! the order, its passes, and the refund request. The eligibility guard
//! screens creation, the synchronizer is the only writer of pass status, and
//! the review state machine owns the refund request status field and its
//! compensating actions.

pub mod audit;
pub mod domain;
pub mod eligibility;
pub mod repository;
pub mod review;
pub mod router;
pub mod service;
pub mod synchronizer;

#[cfg(test)]
mod tests;

pub use audit::{ActivityLogEntry, AuditError, AuditRecorder, TracingAuditRecorder};
pub use domain::{
    AdminId, AdminIdentity, CustomerId, CustomerIdentity, Order, OrderId, OrderStatus, Pass,
    PassId, PassStatus, PaymentStatus, RefundMethod, RefundReasonKind, RefundRequest,
    RefundRequestId, RefundRequestView, RefundStatus, RefundSubmission, ReviewAction,
    ReviewCommand,
};
pub use eligibility::{usage_blocks_refund, EligibilityError, EligibilityGuard, ScreenError};
pub use repository::{
    LedgerError, OrderRepository, PassRepository, RefundRequestRepository, RepositoryError,
    UsageLedger,
};
pub use review::{allowed_sources, ensure_transition, TransitionError};
pub use router::refund_router;
pub use service::{RefundOutcome, RefundService, RefundServiceError};
pub use synchronizer::{PassStateSynchronizer, PassWriteFailure, SyncReport};
