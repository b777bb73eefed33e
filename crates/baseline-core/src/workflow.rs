//! Pure workflow rules for the variation approval state machine.
//!
//! Every status transition the engine performs is gated by one of these
//! predicates, so the legal state machine lives in one place and can be
//! tested without a database.

use crate::models::{MilestoneImpact, Party, VariationStatus};

/// Only drafts can be submitted for approval.
pub fn can_submit(status: VariationStatus) -> bool {
    matches!(status, VariationStatus::Draft)
}

/// Signing is legal while the variation is in the approval pipeline.
pub fn can_sign(status: VariationStatus) -> bool {
    matches!(
        status,
        VariationStatus::Submitted
            | VariationStatus::AwaitingCustomer
            | VariationStatus::AwaitingSupplier
    )
}

/// Rejection is legal from any non-terminal state.
pub fn can_reject(status: VariationStatus) -> bool {
    !matches!(status, VariationStatus::Applied)
}

/// Only rejected variations can be reset back to draft.
pub fn can_reset(status: VariationStatus) -> bool {
    matches!(status, VariationStatus::Rejected)
}

/// Deletion is restricted to variations that never entered approval or
/// fell out of it.
pub fn can_delete(status: VariationStatus) -> bool {
    matches!(
        status,
        VariationStatus::Draft | VariationStatus::Submitted | VariationStatus::Rejected
    )
}

/// Impact rows may change until any signature exists.
pub fn can_edit_impacts(status: VariationStatus) -> bool {
    matches!(status, VariationStatus::Draft | VariationStatus::Submitted)
}

/// Applying requires dual approval.
pub fn can_apply(status: VariationStatus) -> bool {
    matches!(status, VariationStatus::Approved)
}

/// Form progress may only be saved while drafting.
pub fn can_save_draft(status: VariationStatus) -> bool {
    matches!(status, VariationStatus::Draft)
}

/// Applied is the single terminal state.
pub fn is_terminal(status: VariationStatus) -> bool {
    matches!(status, VariationStatus::Applied)
}

/// Status after `party` signs, given whether the other party already has.
pub fn status_after_sign(party: Party, other_signed: bool) -> VariationStatus {
    if other_signed {
        VariationStatus::Approved
    } else {
        match party {
            Party::Supplier => VariationStatus::AwaitingCustomer,
            Party::Customer => VariationStatus::AwaitingSupplier,
        }
    }
}

/// Aggregate cost and day totals over the impact rows of a variation.
///
/// The cost total sums `new_cost - original_cost`; the day total sums the
/// end-date deltas of rows where both end dates are present.
pub fn impact_totals(impacts: &[MilestoneImpact]) -> (f64, i64) {
    let cost = impacts.iter().map(MilestoneImpact::cost_delta).sum();
    let days = impacts.iter().filter_map(MilestoneImpact::days_delta).sum();
    (cost, days)
}
