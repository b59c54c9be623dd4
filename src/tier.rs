use std::fmt;

use serde::{Deserialize, Serialize};

/// Performance bands in ascending order. The bands are deliberately uneven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerformanceTier {
    #[serde(rename = "tier_0_30")]
    Tier0To30,
    #[serde(rename = "tier_31_40")]
    Tier31To40,
    #[serde(rename = "tier_41_60")]
    Tier41To60,
    #[serde(rename = "tier_61_74")]
    Tier61To74,
    #[serde(rename = "tier_75_80")]
    Tier75To80,
    #[serde(rename = "tier_81_89")]
    Tier81To89,
    #[serde(rename = "tier_90_100")]
    Tier90To100,
}

impl PerformanceTier {
    pub const ALL: [PerformanceTier; 7] = [
        PerformanceTier::Tier0To30,
        PerformanceTier::Tier31To40,
        PerformanceTier::Tier41To60,
        PerformanceTier::Tier61To74,
        PerformanceTier::Tier75To80,
        PerformanceTier::Tier81To89,
        PerformanceTier::Tier90To100,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PerformanceTier::Tier0To30 => "tier_0_30",
            PerformanceTier::Tier31To40 => "tier_31_40",
            PerformanceTier::Tier41To60 => "tier_41_60",
            PerformanceTier::Tier61To74 => "tier_61_74",
            PerformanceTier::Tier75To80 => "tier_75_80",
            PerformanceTier::Tier81To89 => "tier_81_89",
            PerformanceTier::Tier90To100 => "tier_90_100",
        }
    }

    /// Translation key resolved by the presentation layer.
    pub fn label_key(self) -> &'static str {
        match self {
            PerformanceTier::Tier0To30 => "percentage_0_30",
            PerformanceTier::Tier31To40 => "percentage_31_40",
            PerformanceTier::Tier41To60 => "percentage_41_60",
            PerformanceTier::Tier61To74 => "percentage_61_74",
            PerformanceTier::Tier75To80 => "percentage_75_80",
            PerformanceTier::Tier81To89 => "percentage_81_89",
            PerformanceTier::Tier90To100 => "percentage_90_100",
        }
    }

    /// Inclusive upper bound of the band.
    pub fn upper_bound(self) -> f64 {
        match self {
            PerformanceTier::Tier0To30 => 30.0,
            PerformanceTier::Tier31To40 => 40.0,
            PerformanceTier::Tier41To60 => 60.0,
            PerformanceTier::Tier61To74 => 74.0,
            PerformanceTier::Tier75To80 => 80.0,
            PerformanceTier::Tier81To89 => 89.0,
            PerformanceTier::Tier90To100 => 100.0,
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// First band whose upper bound is `>= percentage`. Values above 100 land in the top
/// band; NaN lands in the bottom one.
pub fn classify(percentage: f64) -> PerformanceTier {
    if percentage.is_nan() {
        return PerformanceTier::Tier0To30;
    }

    PerformanceTier::ALL
        .into_iter()
        .find(|tier| percentage <= tier.upper_bound())
        .unwrap_or(PerformanceTier::Tier90To100)
}
