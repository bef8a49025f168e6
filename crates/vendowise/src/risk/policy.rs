use super::config::{RiskFactorConfig, ScoringMode};
use super::factor::RiskFactor;
use serde::{Deserialize, Serialize};

/// Overall risk tier for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Low,
    Medium,
    High,
}

impl Classification {
    pub const fn ordered() -> [Self; 3] {
        [Self::High, Self::Medium, Self::Low]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }
}

/// Combines the breached factors into a classification and the score behind it.
pub(crate) fn classify(config: &RiskFactorConfig, reasons: &[RiskFactor]) -> (Classification, f64) {
    let triggered = reasons.len();

    match &config.scoring_mode {
        ScoringMode::AnyTrigger => {
            let classification = if triggered > 0 {
                Classification::High
            } else {
                Classification::Low
            };
            (classification, triggered as f64)
        }
        ScoringMode::CountThreshold { min_count } => {
            let classification = if triggered >= *min_count {
                Classification::High
            } else {
                Classification::Low
            };
            (classification, triggered as f64)
        }
        ScoringMode::Weighted {
            high_cutoff,
            medium_cutoff,
            ..
        } => {
            let score: f64 = reasons
                .iter()
                .map(|factor| config.weight_for(*factor))
                .sum();
            let classification = if score > *high_cutoff {
                Classification::High
            } else if score > *medium_cutoff {
                Classification::Medium
            } else {
                Classification::Low
            };
            (classification, score)
        }
    }
}
