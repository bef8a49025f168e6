use super::factor::{RiskFactor, ThresholdKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Tunable policy: which factors are on, their thresholds, and how breaches combine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorConfig {
    pub enabled_factors: BTreeSet<RiskFactor>,
    pub thresholds: BTreeMap<ThresholdKey, f64>,
    #[serde(default)]
    pub scoring_mode: ScoringMode,
}

impl Default for RiskFactorConfig {
    /// Every factor enabled, any-trigger scoring, default thresholds.
    fn default() -> Self {
        Self {
            enabled_factors: RiskFactor::ordered().into_iter().collect(),
            thresholds: default_thresholds(),
            scoring_mode: ScoringMode::AnyTrigger,
        }
    }
}

impl RiskFactorConfig {
    pub fn new(
        enabled_factors: impl IntoIterator<Item = RiskFactor>,
        thresholds: impl IntoIterator<Item = (ThresholdKey, f64)>,
        scoring_mode: ScoringMode,
    ) -> Self {
        Self {
            enabled_factors: enabled_factors.into_iter().collect(),
            thresholds: thresholds.into_iter().collect(),
            scoring_mode,
        }
    }

    pub fn is_enabled(&self, factor: RiskFactor) -> bool {
        self.enabled_factors.contains(&factor)
    }

    pub fn threshold(&self, key: ThresholdKey) -> Option<f64> {
        self.thresholds.get(&key).copied()
    }

    /// Enabled factors in evaluation order.
    pub fn enabled_in_order(&self) -> impl Iterator<Item = RiskFactor> + '_ {
        RiskFactor::ordered()
            .into_iter()
            .filter(move |factor| self.is_enabled(*factor))
    }

    /// Weight a breach of `factor` contributes in weighted mode.
    pub fn weight_for(&self, factor: RiskFactor) -> f64 {
        match &self.scoring_mode {
            ScoringMode::Weighted { weights, .. } => weights
                .get(&factor)
                .copied()
                .unwrap_or_else(|| even_weight(self.enabled_factors.len())),
            _ => 1.0,
        }
    }

    /// Narrows the policy to `factors`, for subjects that can only observe some of them.
    ///
    /// Weights of dropped factors go away and a count threshold is capped at the
    /// number of factors left, so a valid policy stays valid.
    pub fn restricted_to(&self, factors: &[RiskFactor]) -> Self {
        let enabled_factors: BTreeSet<RiskFactor> = self
            .enabled_factors
            .iter()
            .copied()
            .filter(|factor| factors.contains(factor))
            .collect();

        let scoring_mode = match &self.scoring_mode {
            ScoringMode::CountThreshold { .. } if enabled_factors.is_empty() => {
                ScoringMode::AnyTrigger
            }
            ScoringMode::CountThreshold { min_count } => ScoringMode::CountThreshold {
                min_count: (*min_count).min(enabled_factors.len()),
            },
            ScoringMode::Weighted {
                weights,
                high_cutoff,
                medium_cutoff,
            } => ScoringMode::Weighted {
                weights: weights
                    .iter()
                    .filter(|(factor, _)| enabled_factors.contains(*factor))
                    .map(|(factor, weight)| (*factor, *weight))
                    .collect(),
                high_cutoff: *high_cutoff,
                medium_cutoff: *medium_cutoff,
            },
            ScoringMode::AnyTrigger => ScoringMode::AnyTrigger,
        };

        Self {
            enabled_factors,
            thresholds: self.thresholds.clone(),
            scoring_mode,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for factor in self.enabled_in_order() {
            let Some(key) = factor.threshold_key() else {
                continue;
            };
            match self.threshold(key) {
                None => return Err(ConfigurationError::MissingThreshold { factor, key }),
                Some(value) if !value.is_finite() => {
                    return Err(ConfigurationError::NonFiniteThreshold { key, value })
                }
                Some(_) => {}
            }
        }

        match &self.scoring_mode {
            ScoringMode::AnyTrigger => Ok(()),
            ScoringMode::CountThreshold { min_count } => {
                let enabled = self.enabled_factors.len();
                if *min_count == 0 || *min_count > enabled {
                    Err(ConfigurationError::InvalidMinCount {
                        min_count: *min_count,
                        enabled,
                    })
                } else {
                    Ok(())
                }
            }
            ScoringMode::Weighted {
                weights,
                high_cutoff,
                medium_cutoff,
            } => {
                for (factor, weight) in weights {
                    if !self.is_enabled(*factor) {
                        return Err(ConfigurationError::WeightForDisabledFactor(*factor));
                    }
                    if !weight.is_finite() || *weight < 0.0 {
                        return Err(ConfigurationError::InvalidWeight {
                            factor: *factor,
                            weight: *weight,
                        });
                    }
                }
                if !high_cutoff.is_finite() || !medium_cutoff.is_finite() {
                    return Err(ConfigurationError::NonFiniteCutoff);
                }
                if medium_cutoff > high_cutoff {
                    return Err(ConfigurationError::CutoffOrder {
                        high: *high_cutoff,
                        medium: *medium_cutoff,
                    });
                }
                Ok(())
            }
        }
    }
}

/// Policy governing how individual breaches combine into a classification.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScoringMode {
    #[default]
    AnyTrigger,
    CountThreshold {
        min_count: usize,
    },
    Weighted {
        #[serde(default)]
        weights: BTreeMap<RiskFactor, f64>,
        high_cutoff: f64,
        medium_cutoff: f64,
    },
}

impl ScoringMode {
    /// Required breach count, for count-threshold policies.
    pub fn min_count(&self) -> Option<usize> {
        match self {
            Self::CountThreshold { min_count } => Some(*min_count),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AnyTrigger => "any trigger",
            Self::CountThreshold { .. } => "count threshold",
            Self::Weighted { .. } => "weighted",
        }
    }
}

pub fn default_thresholds() -> BTreeMap<ThresholdKey, f64> {
    ThresholdKey::ordered()
        .into_iter()
        .map(|key| (key, key.default_value()))
        .collect()
}

fn even_weight(enabled: usize) -> f64 {
    if enabled == 0 {
        0.0
    } else {
        1.0 / enabled as f64
    }
}

/// Malformed or incomplete policy. Raised before any record is evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("factor `{factor}` is enabled but threshold `{key}` is missing")]
    MissingThreshold {
        factor: RiskFactor,
        key: ThresholdKey,
    },
    #[error("threshold `{key}` must be a finite number, got {value}")]
    NonFiniteThreshold { key: ThresholdKey, value: f64 },
    #[error("count threshold {min_count} must be between 1 and the {enabled} enabled factor(s)")]
    InvalidMinCount { min_count: usize, enabled: usize },
    #[error("weight for `{factor}` must be a non-negative finite number, got {weight}")]
    InvalidWeight { factor: RiskFactor, weight: f64 },
    #[error("weight configured for disabled factor `{0}`")]
    WeightForDisabledFactor(RiskFactor),
    #[error("weighted cutoffs must be finite numbers")]
    NonFiniteCutoff,
    #[error("medium cutoff {medium} exceeds high cutoff {high}")]
    CutoffOrder { high: f64, medium: f64 },
}
