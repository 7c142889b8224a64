//! Customer funnel transitions.
//!
//! Activities only ever move a customer forward: a strong signal (test drive,
//! cash offer) escalates toward `Hot Lead`, a purchase lands on the terminal
//! `Purchased`, and a weaker signal never downgrades whatever was already
//! reached.

use serde::{Deserialize, Serialize};

use crate::domain::activity::ActivityKind;
use crate::domain::customer::LeadStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleStep {
    pub should_update: bool,
    pub new_status: LeadStatus,
}

/// Status an activity kind pushes toward.
fn target_status(kind: ActivityKind) -> LeadStatus {
    match kind {
        ActivityKind::ViewDetail | ActivityKind::CreditSimulation => LeadStatus::Interested,
        ActivityKind::TestDrive | ActivityKind::CashOffer => LeadStatus::HotLead,
        ActivityKind::Purchase => LeadStatus::Purchased,
    }
}

/// Decide whether `kind` advances a customer currently at `current`.
///
/// Updates happen only when the activity's target strictly outranks the
/// current status; `Purchased` is terminal.
pub fn lifecycle_step(kind: ActivityKind, current: LeadStatus) -> LifecycleStep {
    if current == LeadStatus::Purchased {
        return LifecycleStep { should_update: false, new_status: current };
    }

    let target = target_status(kind);
    if target.rank() > current.rank() {
        LifecycleStep { should_update: true, new_status: target }
    } else {
        LifecycleStep { should_update: false, new_status: current }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::activity::ActivityKind;
    use crate::domain::customer::LeadStatus;

    use super::lifecycle_step;

    #[test]
    fn view_escalates_a_fresh_lead_to_interested() {
        let step = lifecycle_step(ActivityKind::ViewDetail, LeadStatus::BelumFollowUp);
        assert!(step.should_update);
        assert_eq!(step.new_status, LeadStatus::Interested);
    }

    #[test]
    fn test_drive_and_cash_offer_escalate_to_hot_lead() {
        for kind in [ActivityKind::TestDrive, ActivityKind::CashOffer] {
            let step = lifecycle_step(kind, LeadStatus::Interested);
            assert!(step.should_update);
            assert_eq!(step.new_status, LeadStatus::HotLead);
        }
    }

    #[test]
    fn weaker_activity_never_downgrades() {
        let step = lifecycle_step(ActivityKind::ViewDetail, LeadStatus::HotLead);
        assert!(!step.should_update);
        assert_eq!(step.new_status, LeadStatus::HotLead);
    }

    #[test]
    fn view_does_not_move_an_already_followed_up_lead_sideways() {
        // SudahFollowUp and Interested share a rank; a view must not flip one
        // into the other.
        let step = lifecycle_step(ActivityKind::ViewDetail, LeadStatus::SudahFollowUp);
        assert!(!step.should_update);
        assert_eq!(step.new_status, LeadStatus::SudahFollowUp);
    }

    #[test]
    fn purchased_is_terminal() {
        let step = lifecycle_step(ActivityKind::CashOffer, LeadStatus::Purchased);
        assert!(!step.should_update);
        assert_eq!(step.new_status, LeadStatus::Purchased);
    }

    #[test]
    fn purchase_completes_the_funnel() {
        let step = lifecycle_step(ActivityKind::Purchase, LeadStatus::HotLead);
        assert!(step.should_update);
        assert_eq!(step.new_status, LeadStatus::Purchased);
    }
}
