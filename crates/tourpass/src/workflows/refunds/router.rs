use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::audit::AuditRecorder;
use super::domain::{
    AdminId, AdminIdentity, CustomerId, CustomerIdentity, RefundRequestId, RefundSubmission,
    ReviewCommand,
};
use super::eligibility::EligibilityError;
use super::repository::{
    OrderRepository, PassRepository, RefundRequestRepository, RepositoryError, UsageLedger,
};
use super::review::TransitionError;
use super::service::{RefundService, RefundServiceError};

/// Router builder exposing the two refund entry points plus a status read.
///
/// Caller identity arrives pre-resolved by the session layer as
/// `x-customer-id` / `x-admin-id` headers; requests without one are rejected
/// before the engine is touched.
pub fn refund_router<O, P, R, L, A>(service: Arc<RefundService<O, P, R, L, A>>) -> Router
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    R: RefundRequestRepository + 'static,
    L: UsageLedger + 'static,
    A: AuditRecorder + 'static,
{
    Router::new()
        .route("/api/v1/refunds", post(create_handler::<O, P, R, L, A>))
        .route(
            "/api/v1/refunds/:refund_request_id",
            get(status_handler::<O, P, R, L, A>),
        )
        .route(
            "/api/v1/refunds/:refund_request_id/review",
            post(review_handler::<O, P, R, L, A>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<O, P, R, L, A>(
    State(service): State<Arc<RefundService<O, P, R, L, A>>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<RefundSubmission>,
) -> Response
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    R: RefundRequestRepository + 'static,
    L: UsageLedger + 'static,
    A: AuditRecorder + 'static,
{
    let Some(caller) = customer_identity(&headers) else {
        return identity_required("x-customer-id");
    };

    match service.request_refund(&caller, submission) {
        Ok(outcome) => {
            let payload = json!({
                "refund_request": outcome.request.status_view(),
                "suspension": outcome.suspension,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<O, P, R, L, A>(
    State(service): State<Arc<RefundService<O, P, R, L, A>>>,
    Path(refund_request_id): Path<String>,
    headers: HeaderMap,
    axum::Json(command): axum::Json<ReviewCommand>,
) -> Response
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    R: RefundRequestRepository + 'static,
    L: UsageLedger + 'static,
    A: AuditRecorder + 'static,
{
    let Some(caller) = admin_identity(&headers) else {
        return identity_required("x-admin-id");
    };

    let id = RefundRequestId(refund_request_id);
    match service.review(&caller, &id, command) {
        Ok(request) => (StatusCode::OK, axum::Json(request.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<O, P, R, L, A>(
    State(service): State<Arc<RefundService<O, P, R, L, A>>>,
    Path(refund_request_id): Path<String>,
) -> Response
where
    O: OrderRepository + 'static,
    P: PassRepository + 'static,
    R: RefundRequestRepository + 'static,
    L: UsageLedger + 'static,
    A: AuditRecorder + 'static,
{
    let id = RefundRequestId(refund_request_id);
    match service.get(&id) {
        Ok(request) => (StatusCode::OK, axum::Json(request.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn customer_identity(headers: &HeaderMap) -> Option<CustomerIdentity> {
    let value = header_value(headers, "x-customer-id")?;
    Some(CustomerIdentity {
        customer_id: CustomerId(value),
    })
}

fn admin_identity(headers: &HeaderMap) -> Option<AdminIdentity> {
    let value = header_value(headers, "x-admin-id")?;
    Some(AdminIdentity {
        admin_id: AdminId(value),
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn identity_required(header: &str) -> Response {
    let payload = json!({ "error": format!("{header} header is required") });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

fn error_response(error: RefundServiceError) -> Response {
    let status = match &error {
        RefundServiceError::Eligibility(
            EligibilityError::OrderNotFound | EligibilityError::OrderNotOwned,
        ) => StatusCode::NOT_FOUND,
        RefundServiceError::Eligibility(EligibilityError::DuplicateInFlight { .. }) => {
            StatusCode::CONFLICT
        }
        RefundServiceError::Eligibility(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RefundServiceError::Transition(TransitionError::MissingRejectionReason) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RefundServiceError::Transition(_) => StatusCode::CONFLICT,
        RefundServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        RefundServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RefundServiceError::Repository(_) | RefundServiceError::Ledger(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
