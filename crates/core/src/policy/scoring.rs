//! Engagement scoring, follow-up priority, and follow-up readiness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::activity::ActivityKind;
use crate::domain::customer::{InteractionEntry, LeadStatus, SummaryStats};

const VIEW_WEIGHT: u32 = 5;
const CREDIT_WEIGHT: u32 = 10;
const TEST_DRIVE_WEIGHT: u32 = 20;
const CASH_OFFER_WEIGHT: u32 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

fn kind_weight(kind: ActivityKind) -> u32 {
    match kind {
        ActivityKind::ViewDetail => VIEW_WEIGHT,
        ActivityKind::CreditSimulation => CREDIT_WEIGHT,
        ActivityKind::TestDrive => TEST_DRIVE_WEIGHT,
        // A purchase is at least as strong a signal as the offer behind it.
        ActivityKind::CashOffer | ActivityKind::Purchase => CASH_OFFER_WEIGHT,
    }
}

/// Weighted interaction count, capped at 100.
pub fn engagement_score(history: &[InteractionEntry]) -> u8 {
    let total: u32 = history.iter().map(|entry| kind_weight(entry.kind)).sum();
    total.min(100) as u8
}

fn summary_score(summary: &SummaryStats) -> u32 {
    let total = summary.views * VIEW_WEIGHT
        + summary.credit_requests * CREDIT_WEIGHT
        + summary.test_drives * TEST_DRIVE_WEIGHT
        + (summary.cash_offers + summary.purchases) * CASH_OFFER_WEIGHT;
    total.min(100)
}

/// Follow-up priority from engagement weight and recency decay.
///
/// A `Hot Lead` active within the last 24 hours is always `urgent`; purchased
/// customers need no chasing.
pub fn customer_priority(
    summary: &SummaryStats,
    last_activity: DateTime<Utc>,
    status: LeadStatus,
    now: DateTime<Utc>,
) -> Priority {
    if status == LeadStatus::Purchased {
        return Priority::Low;
    }

    let idle_hours = (now - last_activity).num_hours();
    let score = summary_score(summary);

    if status == LeadStatus::HotLead && idle_hours < 24 {
        return Priority::Urgent;
    }
    if status == LeadStatus::HotLead || (score >= 50 && idle_hours < 72) {
        return Priority::High;
    }
    if score >= 20 || idle_hours < 72 {
        return Priority::Medium;
    }
    Priority::Low
}

/// A lead is ready for follow-up while it still sits in the initial status and
/// has shown at least one substantive (non-view) activity.
pub fn is_ready_for_follow_up(history: &[InteractionEntry], status: LeadStatus) -> bool {
    status.rank() == LeadStatus::initial().rank()
        && history.iter().any(|entry| entry.kind.is_substantive())
}
