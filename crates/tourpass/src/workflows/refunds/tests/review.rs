use crate::workflows::refunds::domain::{RefundStatus, ReviewAction};
use crate::workflows::refunds::review::{allowed_sources, ensure_transition, TransitionError};

#[test]
fn assign_fires_only_from_pending() {
    ensure_transition(ReviewAction::Assign, RefundStatus::Pending).expect("pending can be assigned");

    for status in [
        RefundStatus::UnderReview,
        RefundStatus::Approved,
        RefundStatus::Rejected,
        RefundStatus::Completed,
        RefundStatus::Cancelled,
    ] {
        assert!(
            ensure_transition(ReviewAction::Assign, status).is_err(),
            "assign should be rejected from {status:?}"
        );
    }
}

#[test]
fn approve_and_reject_fire_from_pending_or_under_review() {
    for action in [ReviewAction::Approve, ReviewAction::Reject] {
        ensure_transition(action, RefundStatus::Pending).expect("pending is a valid source");
        ensure_transition(action, RefundStatus::UnderReview)
            .expect("under_review is a valid source");
        assert!(ensure_transition(action, RefundStatus::Completed).is_err());
        assert!(ensure_transition(action, RefundStatus::Rejected).is_err());
    }
}

#[test]
fn mark_completed_fires_from_approved_or_completed() {
    ensure_transition(ReviewAction::MarkCompleted, RefundStatus::Approved)
        .expect("approved can complete");
    ensure_transition(ReviewAction::MarkCompleted, RefundStatus::Completed)
        .expect("completed re-confirms");
    assert!(ensure_transition(ReviewAction::MarkCompleted, RefundStatus::Pending).is_err());
    assert!(ensure_transition(ReviewAction::MarkCompleted, RefundStatus::UnderReview).is_err());
}

#[test]
fn invalid_source_error_names_the_required_states() {
    let err = ensure_transition(ReviewAction::MarkCompleted, RefundStatus::Pending)
        .expect_err("pending cannot complete");

    match &err {
        TransitionError::InvalidSourceState {
            action,
            current,
            allowed,
        } => {
            assert_eq!(*action, "mark_completed");
            assert_eq!(*current, "pending");
            assert!(allowed.contains("'approved'"));
        }
        other => panic!("expected invalid source state, got {other:?}"),
    }

    let message = err.to_string();
    assert!(message.contains("mark_completed"));
    assert!(message.contains("'approved'"));
    assert!(message.contains("'pending'"));
}

#[test]
fn allowed_sources_match_the_review_table() {
    assert_eq!(
        allowed_sources(ReviewAction::Assign),
        &[RefundStatus::Pending]
    );
    assert_eq!(
        allowed_sources(ReviewAction::Approve),
        &[RefundStatus::Pending, RefundStatus::UnderReview]
    );
    assert_eq!(
        allowed_sources(ReviewAction::Reject),
        &[RefundStatus::Pending, RefundStatus::UnderReview]
    );
    assert_eq!(
        allowed_sources(ReviewAction::MarkCompleted),
        &[RefundStatus::Approved, RefundStatus::Completed]
    );
}
