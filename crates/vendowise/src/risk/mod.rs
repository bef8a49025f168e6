//! Multi-factor threshold evaluator.
//!
//! A [`RiskFactorConfig`] is validated once when a [`RiskEvaluator`] is built.
//! Each evaluation then walks the enabled factors in a fixed order, compares
//! the subject's observed values against the configured thresholds, and
//! combines the breaches according to the configured [`ScoringMode`].

mod config;
mod factor;
mod policy;
mod record;
mod rules;

#[cfg(test)]
mod tests;

pub use config::{default_thresholds, ConfigurationError, RiskFactorConfig, ScoringMode};
pub use factor::{Comparator, RiskFactor, ThresholdKey};
pub use policy::Classification;
pub use record::{
    InvalidRecordError, InventoryPosition, Observed, RiskSubject, SupplierPerformance,
    SupplierRecord,
};

use policy::classify;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-position result of a batch evaluation.
pub type RecordOutcome = Result<RiskVerdict, InvalidRecordError>;

/// Stateless evaluator holding a validated policy snapshot.
#[derive(Debug, Clone)]
pub struct RiskEvaluator {
    config: RiskFactorConfig,
}

impl RiskEvaluator {
    pub fn new(config: RiskFactorConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RiskFactorConfig {
        &self.config
    }

    pub fn evaluate<S>(&self, subject: &S) -> Result<RiskVerdict, InvalidRecordError>
    where
        S: RiskSubject + ?Sized,
    {
        let trail = rules::observe_factors(subject, &self.config)?;
        let (classification, score) = classify(&self.config, &trail.reasons);

        Ok(RiskVerdict {
            subject: subject.subject_id().to_string(),
            classification,
            reasons: trail.reasons,
            score,
            observations: trail.observations,
        })
    }

    /// Evaluates every record independently. Output position `i` belongs to input `i`.
    pub fn evaluate_all<S>(&self, subjects: &[S]) -> Vec<RecordOutcome>
    where
        S: RiskSubject + Sync,
    {
        let outcomes: Vec<RecordOutcome> = subjects
            .par_iter()
            .map(|subject| self.evaluate(subject))
            .collect();

        let invalid = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        let high = outcomes
            .iter()
            .filter(|outcome| {
                matches!(outcome, Ok(verdict) if verdict.classification == Classification::High)
            })
            .count();
        debug!(
            records = subjects.len(),
            high,
            invalid,
            mode = self.config.scoring_mode.label(),
            "evaluated risk batch"
        );

        outcomes
    }
}

/// Validates `config` and evaluates a single record.
pub fn evaluate<S>(subject: &S, config: &RiskFactorConfig) -> Result<RiskVerdict, RiskError>
where
    S: RiskSubject + ?Sized,
{
    let evaluator = RiskEvaluator::new(config.clone())?;
    Ok(evaluator.evaluate(subject)?)
}

/// Validates `config` once, then evaluates every record.
pub fn evaluate_all<S>(
    subjects: &[S],
    config: &RiskFactorConfig,
) -> Result<Vec<RecordOutcome>, ConfigurationError>
where
    S: RiskSubject + Sync,
{
    let evaluator = RiskEvaluator::new(config.clone())?;
    Ok(evaluator.evaluate_all(subjects))
}

/// Classification of one record with the reasons behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub subject: String,
    pub classification: Classification,
    pub reasons: Vec<RiskFactor>,
    pub score: f64,
    pub observations: Vec<FactorObservation>,
}

impl RiskVerdict {
    pub fn summary(&self) -> String {
        if self.reasons.is_empty() {
            return self.classification.label().to_string();
        }
        let reasons = self
            .reasons
            .iter()
            .map(|factor| factor.label())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} ({})", self.classification.label(), reasons)
    }
}

/// Audit entry for one enabled factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorObservation {
    pub factor: RiskFactor,
    pub observed: f64,
    pub threshold: Option<f64>,
    pub breached: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    InvalidRecord(#[from] InvalidRecordError),
}
