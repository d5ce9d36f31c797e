use super::domain::{Order, OrderId, Pass, PassId, RefundRequest, RefundRequestId};

/// Storage abstraction over the commerce subsystem's order table. The engine
/// only ever reads orders and performs the terminal refund transition.
pub trait OrderRepository: Send + Sync {
    fn fetch(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;
    /// Set `status = refunded, payment_status = refunded`. Idempotent: an
    /// already refunded order reports success.
    fn mark_refunded(&self, id: &OrderId) -> Result<(), RepositoryError>;
}

/// Storage abstraction over the entitlement store.
pub trait PassRepository: Send + Sync {
    fn passes_for_order(&self, order_id: &OrderId) -> Result<Vec<Pass>, RepositoryError>;
    fn update(&self, pass: Pass) -> Result<(), RepositoryError>;
    /// Cancel every pass on the order still in `active`, `suspended`, or
    /// `pending_activation`, as one all-or-nothing write over the matched
    /// set. Returns the matched count; zero matches is success.
    fn cancel_remaining(&self, order_id: &OrderId) -> Result<u32, RepositoryError>;
}

/// Storage abstraction over refund requests.
///
/// `insert` carries the one-in-flight-per-order uniqueness guarantee:
/// implementations must reject with [`RepositoryError::Conflict`] when the
/// order already has a request in a state that blocks new ones, the way a
/// partial unique index would.
pub trait RefundRequestRepository: Send + Sync {
    fn insert(&self, request: RefundRequest) -> Result<RefundRequest, RepositoryError>;
    fn update(&self, request: RefundRequest) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RefundRequestId) -> Result<Option<RefundRequest>, RepositoryError>;
    /// The in-flight request for the order, if any.
    fn active_for_order(&self, order_id: &OrderId)
        -> Result<Option<RefundRequest>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the append-only venue redemption ledger.
pub trait UsageLedger: Send + Sync {
    fn has_redemption(&self, pass_id: &PassId) -> Result<bool, LedgerError>;
}

/// Ledger read error.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("usage ledger unavailable: {0}")]
    Unavailable(String),
}
