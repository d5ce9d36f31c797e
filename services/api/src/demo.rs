use crate::infra::{
    seed_demo_catalog, InMemoryAuditTrail, InMemoryOrderRepository, InMemoryPassRepository,
    InMemoryRefundRequestRepository, InMemoryUsageLedger,
};
use clap::Args;
use std::sync::Arc;
use tourpass::config::RefundPolicyConfig;
use tourpass::error::AppError;
use tourpass::workflows::refunds::{
    AdminId, AdminIdentity, CustomerId, CustomerIdentity, OrderId, OrderRepository,
    RefundReasonKind, RefundService, RefundSubmission, ReviewAction, ReviewCommand,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the rejection-and-reactivation scenario.
    #[arg(long)]
    pub(crate) skip_rejection: bool,
}

type DemoService = RefundService<
    InMemoryOrderRepository,
    InMemoryPassRepository,
    InMemoryRefundRequestRepository,
    InMemoryUsageLedger,
    InMemoryAuditTrail,
>;

struct DemoWorld {
    service: Arc<DemoService>,
    orders: Arc<InMemoryOrderRepository>,
    passes: Arc<InMemoryPassRepository>,
    audit: Arc<InMemoryAuditTrail>,
    seeded: Vec<OrderId>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let world = build_world();
    let customer = CustomerIdentity {
        customer_id: CustomerId("cust-1001".to_string()),
    };
    let admin = AdminIdentity {
        admin_id: AdminId("admin-ops-1".to_string()),
    };

    println!("Refund lifecycle demo");

    let clean_order = world.seeded[0].clone();
    let scanned_order = world.seeded[1].clone();

    println!("\nScenario 1: usage evidence blocks the request");
    match world.service.request_refund(
        &customer,
        submission(&scanned_order, "QR code kept failing at the aquarium", 4900),
    ) {
        Ok(_) => println!("  Unexpectedly accepted"),
        Err(err) => println!("  Rejected as expected: {err}"),
    }

    println!("\nScenario 2: clean order through approval and settlement");
    let outcome = match world.service.request_refund(
        &customer,
        submission(&clean_order, "Trip cancelled before activation", 9800),
    ) {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "  Created {} -> status {}",
        outcome.request.request_number,
        outcome.request.status.label()
    );
    println!(
        "  Suspended {} pass(es), skipped {}",
        outcome.suspension.updated.len(),
        outcome.suspension.skipped.len()
    );
    print_passes(&world, &clean_order);

    for (label, command) in [
        ("Assign", review(ReviewAction::Assign)),
        ("Approve", review(ReviewAction::Approve)),
        ("Complete", review(ReviewAction::MarkCompleted)),
    ] {
        match world.service.review(&admin, &outcome.request.id, command) {
            Ok(request) => println!("  {label} -> status {}", request.status.label()),
            Err(err) => {
                println!("  {label} failed: {err}");
                return Ok(());
            }
        }
    }
    print_passes(&world, &clean_order);

    match world.orders.fetch(&clean_order) {
        Ok(Some(order)) => println!(
            "  Order {} now {} / payment {}",
            order.id.0,
            order.status.label(),
            order.payment_status.label()
        ),
        Ok(None) => println!("  Order lookup returned no record"),
        Err(err) => println!("  Order lookup unavailable: {err}"),
    }

    match world.service.get(&outcome.request.id) {
        Ok(request) => match serde_json::to_string_pretty(&request.status_view()) {
            Ok(json) => println!("  Public status payload:\n{json}"),
            Err(err) => println!("  Public status payload unavailable: {err}"),
        },
        Err(err) => println!("  Status lookup unavailable: {err}"),
    }

    if !args.skip_rejection {
        run_rejection_scenario(&world, &admin)?;
    }

    println!("\nAudit trail");
    for entry in world.audit.entries() {
        println!(
            "  - {} by {} on {} ({})",
            entry.action, entry.actor, entry.order_id.0, entry.refund_request_id.0
        );
    }

    Ok(())
}

fn run_rejection_scenario(world: &DemoWorld, admin: &AdminIdentity) -> Result<(), AppError> {
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use tourpass::workflows::refunds::{
        Order, OrderStatus, Pass, PassId, PassStatus, PaymentStatus,
    };

    println!("\nScenario 3: rejection restores the passes");
    let customer = CustomerIdentity {
        customer_id: CustomerId("cust-2002".to_string()),
    };
    let order = Order {
        id: OrderId("ord-2002".to_string()),
        customer_id: customer.customer_id.clone(),
        status: OrderStatus::Completed,
        payment_status: PaymentStatus::Paid,
        total_amount: 7500,
        currency: "EUR".to_string(),
    };
    world.orders.seed(order.clone());
    world.passes.seed(Pass {
        id: PassId("ord-2002-pass-1".to_string()),
        order_id: order.id.clone(),
        customer_id: customer.customer_id.clone(),
        status: PassStatus::Active,
        usage_count: 0,
        previous_status: None,
        activation_date: NaiveDate::from_ymd_opt(2026, 8, 21),
        usage_counters: BTreeMap::new(),
    });

    let outcome = match world
        .service
        .request_refund(&customer, submission(&order.id, "Changed travel dates", 7500))
    {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    print_passes(world, &order.id);

    let mut reject = review(ReviewAction::Reject);
    reject.rejection_reason = Some("Date changes are handled by rebooking, not refund".to_string());
    match world.service.review(admin, &outcome.request.id, reject) {
        Ok(request) => println!("  Reject -> status {}", request.status.label()),
        Err(err) => println!("  Reject failed: {err}"),
    }
    print_passes(world, &order.id);

    Ok(())
}

fn build_world() -> DemoWorld {
    let orders = Arc::new(InMemoryOrderRepository::default());
    let passes = Arc::new(InMemoryPassRepository::default());
    let refunds = Arc::new(InMemoryRefundRequestRepository::default());
    let ledger = Arc::new(InMemoryUsageLedger::default());
    let audit = Arc::new(InMemoryAuditTrail::default());
    let seeded = seed_demo_catalog(&orders, &passes, &ledger);

    let service = Arc::new(RefundService::new(
        orders.clone(),
        passes.clone(),
        refunds,
        ledger,
        audit.clone(),
        RefundPolicyConfig::default(),
    ));

    DemoWorld {
        service,
        orders,
        passes,
        audit,
        seeded,
    }
}

fn submission(order_id: &OrderId, reason: &str, requested_amount: u32) -> RefundSubmission {
    RefundSubmission {
        order_id: order_id.clone(),
        reason_kind: RefundReasonKind::ChangedPlans,
        reason_text: reason.to_string(),
        requested_amount,
    }
}

fn review(action: ReviewAction) -> ReviewCommand {
    ReviewCommand {
        action,
        rejection_reason: None,
        refund_method: None,
        refund_amount: None,
        admin_notes: None,
    }
}

fn print_passes(world: &DemoWorld, order_id: &OrderId) {
    for pass in world.passes.snapshot_for_order(order_id) {
        println!("    pass {} -> {}", pass.id.0, pass.status.label());
    }
}
