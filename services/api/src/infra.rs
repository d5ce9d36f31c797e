use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tourpass::workflows::refunds::{
    ActivityLogEntry, AuditError, AuditRecorder, CustomerId, LedgerError, Order, OrderId,
    OrderRepository, OrderStatus, Pass, PassId, PassRepository, PassStatus, PaymentStatus,
    RefundRequest, RefundRequestId, RefundRequestRepository, RepositoryError, UsageLedger,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryOrderRepository {
    orders: Arc<Mutex<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    pub(crate) fn seed(&self, order: Order) {
        let mut guard = self.orders.lock().expect("order mutex poisoned");
        guard.insert(order.id.clone(), order);
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn fetch(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let guard = self.orders.lock().expect("order mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn mark_refunded(&self, id: &OrderId) -> Result<(), RepositoryError> {
        let mut guard = self.orders.lock().expect("order mutex poisoned");
        let order = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        order.status = OrderStatus::Refunded;
        order.payment_status = PaymentStatus::Refunded;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPassRepository {
    passes: Arc<Mutex<HashMap<PassId, Pass>>>,
}

impl InMemoryPassRepository {
    pub(crate) fn seed(&self, pass: Pass) {
        let mut guard = self.passes.lock().expect("pass mutex poisoned");
        guard.insert(pass.id.clone(), pass);
    }

    pub(crate) fn snapshot_for_order(&self, order_id: &OrderId) -> Vec<Pass> {
        let guard = self.passes.lock().expect("pass mutex poisoned");
        let mut passes: Vec<Pass> = guard
            .values()
            .filter(|pass| &pass.order_id == order_id)
            .cloned()
            .collect();
        passes.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        passes
    }
}

impl PassRepository for InMemoryPassRepository {
    fn passes_for_order(&self, order_id: &OrderId) -> Result<Vec<Pass>, RepositoryError> {
        Ok(self.snapshot_for_order(order_id))
    }

    fn update(&self, pass: Pass) -> Result<(), RepositoryError> {
        let mut guard = self.passes.lock().expect("pass mutex poisoned");
        if guard.contains_key(&pass.id) {
            guard.insert(pass.id.clone(), pass);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn cancel_remaining(&self, order_id: &OrderId) -> Result<u32, RepositoryError> {
        let mut guard = self.passes.lock().expect("pass mutex poisoned");
        let mut cancelled = 0;
        for pass in guard.values_mut() {
            if &pass.order_id == order_id
                && matches!(
                    pass.status,
                    PassStatus::Active | PassStatus::Suspended | PassStatus::PendingActivation
                )
            {
                pass.status = PassStatus::Cancelled;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRefundRequestRepository {
    records: Arc<Mutex<HashMap<RefundRequestId, RefundRequest>>>,
}

impl RefundRequestRepository for InMemoryRefundRequestRepository {
    fn insert(&self, request: RefundRequest) -> Result<RefundRequest, RepositoryError> {
        let mut guard = self.records.lock().expect("refund mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        // The one-in-flight-per-order rule is enforced here, at the write,
        // so concurrent submissions cannot both pass the guard's read.
        if guard.values().any(|existing| {
            existing.order_id == request.order_id && existing.status.blocks_new_request()
        }) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn update(&self, request: RefundRequest) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("refund mutex poisoned");
        if guard.contains_key(&request.id) {
            guard.insert(request.id.clone(), request);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryUsageLedger {
    redeemed: Arc<Mutex<HashSet<PassId>>>,
}

impl InMemoryUsageLedger {
    pub(crate) fn record_redemption(&self, pass_id: PassId) {
        let mut guard = self.redeemed.lock().expect("ledger mutex poisoned");
        guard.insert(pass_id);
    }
}

impl UsageLedger for InMemoryUsageLedger {
    fn has_redemption(&self, pass_id: &PassId) -> Result<bool, LedgerError> {
        let guard = self.redeemed.lock().expect("ledger mutex poisoned");
        Ok(guard.contains(pass_id))
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditTrail {
    entries: Arc<Mutex<Vec<ActivityLogEntry>>>,
}

impl InMemoryAuditTrail {
    pub(crate) fn entries(&self) -> Vec<ActivityLogEntry> {
        self.entries.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditRecorder for InMemoryAuditTrail {
    fn append(&self, entry: ActivityLogEntry) -> Result<(), AuditError> {
        let mut guard = self.entries.lock().expect("audit mutex poisoned");
        guard.push(entry);
        Ok(())
    }
}

/// Seed a small explorable catalog: one clean two-pass order and one order
/// whose pass already carries a venue scan, so both the happy path and the
/// usage rejection can be driven over HTTP. Returns the seeded order ids.
pub(crate) fn seed_demo_catalog(
    orders: &InMemoryOrderRepository,
    passes: &InMemoryPassRepository,
    ledger: &InMemoryUsageLedger,
) -> Vec<OrderId> {
    let customer = CustomerId("cust-1001".to_string());

    let clean = demo_order("ord-1001", &customer, 9800);
    orders.seed(clean.clone());
    passes.seed(demo_pass(
        "ord-1001-pass-1",
        &clean,
        PassStatus::Active,
        NaiveDate::from_ymd_opt(2026, 8, 20),
    ));
    passes.seed(demo_pass(
        "ord-1001-pass-2",
        &clean,
        PassStatus::PendingActivation,
        None,
    ));

    let scanned = demo_order("ord-1002", &customer, 4900);
    orders.seed(scanned.clone());
    let mut used = demo_pass(
        "ord-1002-pass-1",
        &scanned,
        PassStatus::Active,
        NaiveDate::from_ymd_opt(2026, 8, 18),
    );
    used.usage_counters = BTreeMap::from([("scans".to_string(), 2)]);
    ledger.record_redemption(used.id.clone());
    passes.seed(used);

    vec![clean.id, scanned.id]
}

fn demo_order(id: &str, customer: &CustomerId, total_amount: u32) -> Order {
    Order {
        id: OrderId(id.to_string()),
        customer_id: customer.clone(),
        status: OrderStatus::Completed,
        payment_status: PaymentStatus::Paid,
        total_amount,
        currency: "EUR".to_string(),
    }
}

fn demo_pass(
    id: &str,
    order: &Order,
    status: PassStatus,
    activation_date: Option<NaiveDate>,
) -> Pass {
    Pass {
        id: PassId(id.to_string()),
        order_id: order.id.clone(),
        customer_id: order.customer_id.clone(),
        status,
        usage_count: 0,
        previous_status: None,
        activation_date,
        usage_counters: BTreeMap::new(),
    }
}
