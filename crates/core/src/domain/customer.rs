use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::activity::{ActivityDetails, ActivityKind};
use crate::domain::vehicle::VehicleId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical phone number, the customer natural key.
///
/// Always the `62…` form produced by [`crate::policy::phone::normalize_phone`];
/// repeated activity from any raw variant of the same number lands on one
/// profile.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(pub String);

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Funnel stage, advanced only forward by qualifying activities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    BelumFollowUp,
    SudahFollowUp,
    Interested,
    HotLead,
    Purchased,
}

impl LeadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BelumFollowUp => "Belum Di Follow Up",
            Self::SudahFollowUp => "Sudah Di Follow Up",
            Self::Interested => "Interested",
            Self::HotLead => "Hot Lead",
            Self::Purchased => "Purchased",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Belum Di Follow Up" => Some(Self::BelumFollowUp),
            "Sudah Di Follow Up" => Some(Self::SudahFollowUp),
            "Interested" => Some(Self::Interested),
            "Hot Lead" => Some(Self::HotLead),
            "Purchased" => Some(Self::Purchased),
            _ => None,
        }
    }

    /// Funnel depth. `SudahFollowUp` and `Interested` share a rank: both sit
    /// one step past the initial state, reached by different paths.
    pub fn rank(&self) -> u8 {
        match self {
            Self::BelumFollowUp => 0,
            Self::SudahFollowUp | Self::Interested => 1,
            Self::HotLead => 2,
            Self::Purchased => 3,
        }
    }

    pub fn initial() -> Self {
        Self::BelumFollowUp
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Referenced vehicle at the moment of the activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub name: String,
    pub price: Decimal,
}

/// One append-only history row on a customer profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub vehicle: VehicleSnapshot,
    pub kind: ActivityKind,
    pub details: ActivityDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Rollups recomputed from the full history on every write.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryStats {
    pub views: u32,
    pub credit_requests: u32,
    pub test_drives: u32,
    pub cash_offers: u32,
    pub purchases: u32,
    pub best_discount_pct: Option<Decimal>,
    pub avg_discount_pct: Option<Decimal>,
    /// Vehicle names ordered by interaction count, most engaged first.
    pub favorite_vehicles: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: PhoneNumber,
    pub status: LeadStatus,
    pub last_activity: DateTime<Utc>,
    pub total_interactions: u32,
    pub history: Vec<InteractionEntry>,
    pub summary: SummaryStats,
    pub created_at: DateTime<Utc>,
}

impl SummaryStats {
    /// Full recompute from history. Deliberately not incremental so edits or
    /// replays of the history cannot drift the rollups.
    pub fn recompute(history: &[InteractionEntry]) -> Self {
        let mut stats = Self::default();
        let mut discounts: Vec<Decimal> = Vec::new();
        let mut per_vehicle: Vec<(String, u32)> = Vec::new();

        for entry in history {
            match entry.kind {
                ActivityKind::ViewDetail => stats.views += 1,
                ActivityKind::CreditSimulation => stats.credit_requests += 1,
                ActivityKind::TestDrive => stats.test_drives += 1,
                ActivityKind::CashOffer => stats.cash_offers += 1,
                ActivityKind::Purchase => stats.purchases += 1,
            }

            if let ActivityDetails::CashOffer { offered_price, .. } = &entry.details {
                if entry.vehicle.price > Decimal::ZERO {
                    let pct = (entry.vehicle.price - *offered_price) / entry.vehicle.price
                        * Decimal::ONE_HUNDRED;
                    discounts.push(pct.round_dp(2));
                }
            }

            match per_vehicle.iter_mut().find(|(name, _)| *name == entry.vehicle.name) {
                Some((_, count)) => *count += 1,
                None => per_vehicle.push((entry.vehicle.name.clone(), 1)),
            }
        }

        if !discounts.is_empty() {
            stats.best_discount_pct = discounts.iter().copied().max();
            let total: Decimal = discounts.iter().copied().sum();
            stats.avg_discount_pct = Some((total / Decimal::from(discounts.len())).round_dp(2));
        }

        per_vehicle.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        stats.favorite_vehicles = per_vehicle.into_iter().map(|(name, _)| name).collect();

        stats
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::domain::activity::{ActivityDetails, ActivityKind};
    use crate::domain::vehicle::VehicleId;

    use super::{InteractionEntry, LeadStatus, SummaryStats, VehicleSnapshot};

    fn entry(kind: ActivityKind, details: ActivityDetails, vehicle: &str) -> InteractionEntry {
        InteractionEntry {
            vehicle: VehicleSnapshot {
                id: VehicleId(format!("v-{vehicle}")),
                name: vehicle.to_string(),
                price: Decimal::new(200_000_000, 0),
            },
            kind,
            details,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn status_labels_round_trip() {
        for status in [
            LeadStatus::BelumFollowUp,
            LeadStatus::SudahFollowUp,
            LeadStatus::Interested,
            LeadStatus::HotLead,
            LeadStatus::Purchased,
        ] {
            assert_eq!(LeadStatus::parse(status.label()), Some(status));
        }
    }

    #[test]
    fn funnel_ranks_are_monotonic() {
        assert!(LeadStatus::BelumFollowUp.rank() < LeadStatus::Interested.rank());
        assert_eq!(LeadStatus::SudahFollowUp.rank(), LeadStatus::Interested.rank());
        assert!(LeadStatus::Interested.rank() < LeadStatus::HotLead.rank());
        assert!(LeadStatus::HotLead.rank() < LeadStatus::Purchased.rank());
    }

    #[test]
    fn recompute_counts_kinds_and_tracks_discounts() {
        let history = vec![
            entry(ActivityKind::ViewDetail, ActivityDetails::ViewDetail, "Avanza"),
            entry(ActivityKind::ViewDetail, ActivityDetails::ViewDetail, "Avanza"),
            entry(
                ActivityKind::CashOffer,
                ActivityDetails::CashOffer {
                    offered_price: Decimal::new(185_000_000, 0),
                    notes: None,
                },
                "Innova",
            ),
        ];

        let stats = SummaryStats::recompute(&history);
        assert_eq!(stats.views, 2);
        assert_eq!(stats.cash_offers, 1);
        assert_eq!(stats.best_discount_pct, Some(Decimal::new(750, 2)));
        assert_eq!(stats.avg_discount_pct, Some(Decimal::new(750, 2)));
        assert_eq!(stats.favorite_vehicles, vec!["Avanza".to_string(), "Innova".to_string()]);
    }
}
