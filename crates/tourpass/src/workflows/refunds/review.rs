use super::domain::{RefundStatus, ReviewAction};

/// Source states each review action may fire from.
///
/// `pending` may go straight to `approved`/`rejected` without an assignment.
/// `mark_completed` also accepts `completed` so a retry after a partial
/// failure re-confirms the terminal state instead of erroring.
pub const fn allowed_sources(action: ReviewAction) -> &'static [RefundStatus] {
    match action {
        ReviewAction::Assign => &[RefundStatus::Pending],
        ReviewAction::Approve | ReviewAction::Reject => {
            &[RefundStatus::Pending, RefundStatus::UnderReview]
        }
        ReviewAction::MarkCompleted => &[RefundStatus::Approved, RefundStatus::Completed],
    }
}

/// Precondition failures raised before any mutation occurs.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("action '{action}' requires the request to be {allowed}, found '{current}'")]
    InvalidSourceState {
        action: &'static str,
        current: &'static str,
        allowed: String,
    },
    #[error("a rejection reason is required to reject a refund request")]
    MissingRejectionReason,
}

/// Validate that `action` may fire from `current`.
pub fn ensure_transition(
    action: ReviewAction,
    current: RefundStatus,
) -> Result<(), TransitionError> {
    let allowed = allowed_sources(action);
    if allowed.contains(&current) {
        return Ok(());
    }

    let allowed = allowed
        .iter()
        .map(|status| format!("'{}'", status.label()))
        .collect::<Vec<_>>()
        .join(" or ");

    Err(TransitionError::InvalidSourceState {
        action: action.label(),
        current: current.label(),
        allowed,
    })
}
