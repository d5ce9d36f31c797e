use crate::cli::ServeArgs;
use crate::infra::{
    seed_demo_catalog, AppState, InMemoryOrderRepository, InMemoryPassRepository,
    InMemoryRefundRequestRepository, InMemoryUsageLedger,
};
use crate::routes::with_refund_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tourpass::config::AppConfig;
use tourpass::error::AppError;
use tourpass::telemetry;
use tourpass::workflows::refunds::{RefundService, TracingAuditRecorder};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let orders = Arc::new(InMemoryOrderRepository::default());
    let passes = Arc::new(InMemoryPassRepository::default());
    let refunds = Arc::new(InMemoryRefundRequestRepository::default());
    let ledger = Arc::new(InMemoryUsageLedger::default());
    let seeded = seed_demo_catalog(&orders, &passes, &ledger);

    let refund_service = Arc::new(RefundService::new(
        orders,
        passes,
        refunds,
        ledger,
        Arc::new(TracingAuditRecorder),
        config.refunds.clone(),
    ));

    let app = with_refund_routes(refund_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        seeded_orders = seeded.len(),
        "refund lifecycle service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
