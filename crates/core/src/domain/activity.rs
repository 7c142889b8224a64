use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Customer activity kinds, ordered from least to most substantive.
///
/// Wire tags match the legacy event collection so both representations of one
/// activity stay comparable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ViewDetail,
    #[serde(rename = "kredit_simulation")]
    CreditSimulation,
    TestDrive,
    #[serde(rename = "beli_cash")]
    CashOffer,
    Purchase,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 5] = [
        Self::ViewDetail,
        Self::CreditSimulation,
        Self::TestDrive,
        Self::CashOffer,
        Self::Purchase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewDetail => "view_detail",
            Self::CreditSimulation => "kredit_simulation",
            Self::TestDrive => "test_drive",
            Self::CashOffer => "beli_cash",
            Self::Purchase => "purchase",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "view_detail" => Some(Self::ViewDetail),
            "kredit_simulation" => Some(Self::CreditSimulation),
            "test_drive" => Some(Self::TestDrive),
            "beli_cash" => Some(Self::CashOffer),
            "purchase" => Some(Self::Purchase),
            _ => None,
        }
    }

    /// True for anything stronger than browsing a listing.
    pub fn is_substantive(&self) -> bool {
        !matches!(self, Self::ViewDetail)
    }

    /// Whether recording this kind also appends an entry to an embedded
    /// vehicle list. Views and purchases exist only as legacy events.
    pub fn has_embedded_mirror(&self) -> bool {
        !matches!(self, Self::ViewDetail | Self::Purchase)
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload captured with each activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityDetails {
    ViewDetail,
    CreditSimulation { down_payment: Decimal, tenor_months: u32 },
    TestDrive { scheduled_at: DateTime<Utc> },
    CashOffer { offered_price: Decimal, notes: Option<String> },
    Purchase,
}

impl ActivityDetails {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Self::ViewDetail => ActivityKind::ViewDetail,
            Self::CreditSimulation { .. } => ActivityKind::CreditSimulation,
            Self::TestDrive { .. } => ActivityKind::TestDrive,
            Self::CashOffer { .. } => ActivityKind::CashOffer,
            Self::Purchase => ActivityKind::Purchase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ActivityKind;

    #[test]
    fn wire_tags_round_trip() {
        for kind in [
            ActivityKind::ViewDetail,
            ActivityKind::CreditSimulation,
            ActivityKind::TestDrive,
            ActivityKind::CashOffer,
            ActivityKind::Purchase,
        ] {
            assert_eq!(ActivityKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn only_views_are_non_substantive() {
        assert!(!ActivityKind::ViewDetail.is_substantive());
        assert!(ActivityKind::CashOffer.is_substantive());
    }
}
