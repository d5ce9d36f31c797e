use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde_json::Value;

use crate::config::RefundPolicyConfig;
use crate::workflows::refunds::audit::{ActivityLogEntry, AuditError, AuditRecorder};
use crate::workflows::refunds::domain::{
    AdminId, AdminIdentity, CustomerId, CustomerIdentity, Order, OrderId, OrderStatus, Pass,
    PassId, PassStatus, PaymentStatus, RefundRequest, RefundRequestId, RefundReasonKind,
    RefundSubmission,
};
use crate::workflows::refunds::repository::{
    LedgerError, OrderRepository, PassRepository, RefundRequestRepository, RepositoryError,
    UsageLedger,
};
use crate::workflows::refunds::service::RefundService;

pub(super) fn customer() -> CustomerIdentity {
    CustomerIdentity {
        customer_id: CustomerId("cust-42".to_string()),
    }
}

pub(super) fn stranger() -> CustomerIdentity {
    CustomerIdentity {
        customer_id: CustomerId("cust-99".to_string()),
    }
}

pub(super) fn admin() -> AdminIdentity {
    AdminIdentity {
        admin_id: AdminId("admin-7".to_string()),
    }
}

pub(super) fn order(id: &str) -> Order {
    Order {
        id: OrderId(id.to_string()),
        customer_id: CustomerId("cust-42".to_string()),
        status: OrderStatus::Completed,
        payment_status: PaymentStatus::Paid,
        total_amount: 200,
        currency: "EUR".to_string(),
    }
}

pub(super) fn active_pass(id: &str, order_id: &str) -> Pass {
    Pass {
        id: PassId(id.to_string()),
        order_id: OrderId(order_id.to_string()),
        customer_id: CustomerId("cust-42".to_string()),
        status: PassStatus::Active,
        usage_count: 0,
        previous_status: None,
        activation_date: NaiveDate::from_ymd_opt(2025, 6, 1),
        usage_counters: Default::default(),
    }
}

pub(super) fn pending_pass(id: &str, order_id: &str) -> Pass {
    Pass {
        id: PassId(id.to_string()),
        order_id: OrderId(order_id.to_string()),
        customer_id: CustomerId("cust-42".to_string()),
        status: PassStatus::PendingActivation,
        usage_count: 0,
        previous_status: None,
        activation_date: None,
        usage_counters: Default::default(),
    }
}

pub(super) fn submission(order_id: &str) -> RefundSubmission {
    RefundSubmission {
        order_id: OrderId(order_id.to_string()),
        reason_kind: RefundReasonKind::TechnicalIssue,
        reason_text: "QR codes never scanned at any venue".to_string(),
        requested_amount: 200,
    }
}

pub(super) fn policy() -> RefundPolicyConfig {
    RefundPolicyConfig::default()
}

#[derive(Default)]
pub(super) struct MemoryOrders {
    orders: Mutex<HashMap<OrderId, Order>>,
    fail_mark_refunded: AtomicBool,
}

impl MemoryOrders {
    pub(super) fn seed(&self, order: Order) {
        self.orders
            .lock()
            .expect("order mutex poisoned")
            .insert(order.id.clone(), order);
    }

    pub(super) fn get(&self, id: &OrderId) -> Order {
        self.orders
            .lock()
            .expect("order mutex poisoned")
            .get(id)
            .cloned()
            .expect("order seeded")
    }

    pub(super) fn fail_next_mark_refunded(&self, fail: bool) {
        self.fail_mark_refunded.store(fail, Ordering::Relaxed);
    }
}

impl OrderRepository for MemoryOrders {
    fn fetch(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let guard = self.orders.lock().expect("order mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn mark_refunded(&self, id: &OrderId) -> Result<(), RepositoryError> {
        if self.fail_mark_refunded.load(Ordering::Relaxed) {
            return Err(RepositoryError::Unavailable(
                "order store offline".to_string(),
            ));
        }

        let mut guard = self.orders.lock().expect("order mutex poisoned");
        let order = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        order.status = OrderStatus::Refunded;
        order.payment_status = PaymentStatus::Refunded;
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryPasses {
    passes: Mutex<HashMap<PassId, Pass>>,
    fail_updates_for: Mutex<HashSet<PassId>>,
}

impl MemoryPasses {
    pub(super) fn seed(&self, pass: Pass) {
        self.passes
            .lock()
            .expect("pass mutex poisoned")
            .insert(pass.id.clone(), pass);
    }

    pub(super) fn get(&self, id: &str) -> Pass {
        self.passes
            .lock()
            .expect("pass mutex poisoned")
            .get(&PassId(id.to_string()))
            .cloned()
            .expect("pass seeded")
    }

    pub(super) fn fail_updates_for(&self, id: &str) {
        self.fail_updates_for
            .lock()
            .expect("pass mutex poisoned")
            .insert(PassId(id.to_string()));
    }
}

impl PassRepository for MemoryPasses {
    fn passes_for_order(&self, order_id: &OrderId) -> Result<Vec<Pass>, RepositoryError> {
        let guard = self.passes.lock().expect("pass mutex poisoned");
        let mut passes: Vec<Pass> = guard
            .values()
            .filter(|pass| &pass.order_id == order_id)
            .cloned()
            .collect();
        passes.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(passes)
    }

    fn update(&self, pass: Pass) -> Result<(), RepositoryError> {
        if self
            .fail_updates_for
            .lock()
            .expect("pass mutex poisoned")
            .contains(&pass.id)
        {
            return Err(RepositoryError::Unavailable("row locked".to_string()));
        }

        let mut guard = self.passes.lock().expect("pass mutex poisoned");
        if !guard.contains_key(&pass.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(pass.id.clone(), pass);
        Ok(())
    }

    fn cancel_remaining(&self, order_id: &OrderId) -> Result<u32, RepositoryError> {
        // One lock over the whole sweep models the single-statement write.
        let mut guard = self.passes.lock().expect("pass mutex poisoned");
        let mut matched = 0;
        for pass in guard.values_mut() {
            if &pass.order_id == order_id
                && matches!(
                    pass.status,
                    PassStatus::Active | PassStatus::Suspended | PassStatus::PendingActivation
                )
            {
                pass.status = PassStatus::Cancelled;
                matched += 1;
            }
        }
        Ok(matched)
    }
}

#[derive(Default)]
pub(super) struct MemoryRefunds {
    records: Mutex<HashMap<RefundRequestId, RefundRequest>>,
}

impl MemoryRefunds {
    pub(super) fn all_for_order(&self, order_id: &OrderId) -> Vec<RefundRequest> {
        self.records
            .lock()
            .expect("refund mutex poisoned")
            .values()
            .filter(|request| &request.order_id == order_id)
            .cloned()
            .collect()
    }
}

impl RefundRequestRepository for MemoryRefunds {
    fn insert(&self, request: RefundRequest) -> Result<RefundRequest, RepositoryError> {
        let mut guard = self.records.lock().expect("refund mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        // Partial-uniqueness constraint: one in-flight request per order.
        if guard
            .values()
            .any(|existing| existing.order_id == request.order_id && existing.status.blocks_new_request())
        {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn update(&self, request: RefundRequest) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("refund mutex poisoned");
        if !guard.contains_key(&request.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(request.id.clone(), request);
        Ok(())
    }

    fn fetch(&self, id: &RefundRequestId) -> Result<Option<RefundRequest>, RepositoryError> {
        let guard = self.records.lock().expect("refund mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn active_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<RefundRequest>, RepositoryError> {
        let guard = self.records.lock().expect("refund mutex poisoned");
        Ok(guard
            .values()
            .find(|request| &request.order_id == order_id && request.status.blocks_new_request())
            .cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryLedger {
    redeemed: Mutex<HashSet<PassId>>,
}

impl MemoryLedger {
    pub(super) fn record_redemption(&self, pass_id: &str) {
        self.redeemed
            .lock()
            .expect("ledger mutex poisoned")
            .insert(PassId(pass_id.to_string()));
    }
}

impl UsageLedger for MemoryLedger {
    fn has_redemption(&self, pass_id: &PassId) -> Result<bool, LedgerError> {
        let guard = self.redeemed.lock().expect("ledger mutex poisoned");
        Ok(guard.contains(pass_id))
    }
}

#[derive(Default)]
pub(super) struct MemoryAudit {
    entries: Mutex<Vec<ActivityLogEntry>>,
    unavailable: AtomicBool,
}

impl MemoryAudit {
    pub(super) fn entries(&self) -> Vec<ActivityLogEntry> {
        self.entries.lock().expect("audit mutex poisoned").clone()
    }

    pub(super) fn go_offline(&self) {
        self.unavailable.store(true, Ordering::Relaxed);
    }
}

impl AuditRecorder for MemoryAudit {
    fn append(&self, entry: ActivityLogEntry) -> Result<(), AuditError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(AuditError::Transport("log sink offline".to_string()));
        }
        self.entries
            .lock()
            .expect("audit mutex poisoned")
            .push(entry);
        Ok(())
    }
}

pub(super) type TestService =
    RefundService<MemoryOrders, MemoryPasses, MemoryRefunds, MemoryLedger, MemoryAudit>;

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) orders: Arc<MemoryOrders>,
    pub(super) passes: Arc<MemoryPasses>,
    pub(super) refunds: Arc<MemoryRefunds>,
    pub(super) ledger: Arc<MemoryLedger>,
    pub(super) audit: Arc<MemoryAudit>,
}

pub(super) fn harness() -> Harness {
    let orders = Arc::new(MemoryOrders::default());
    let passes = Arc::new(MemoryPasses::default());
    let refunds = Arc::new(MemoryRefunds::default());
    let ledger = Arc::new(MemoryLedger::default());
    let audit = Arc::new(MemoryAudit::default());
    let service = Arc::new(RefundService::new(
        orders.clone(),
        passes.clone(),
        refunds.clone(),
        ledger.clone(),
        audit.clone(),
        policy(),
    ));

    Harness {
        service,
        orders,
        passes,
        refunds,
        ledger,
        audit,
    }
}

/// Seed the two-pass order used across most scenarios.
pub(super) fn seed_two_pass_order(harness: &Harness, order_id: &str) {
    harness.orders.seed(order(order_id));
    harness
        .passes
        .seed(active_pass(&format!("{order_id}-pass-1"), order_id));
    harness
        .passes
        .seed(active_pass(&format!("{order_id}-pass-2"), order_id));
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
