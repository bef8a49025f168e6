//! Batch-level rollups of evaluation outcomes.

use crate::risk::{Classification, RecordOutcome, RiskFactor, RiskVerdict};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationTotal {
    pub classification: Classification,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonCount {
    pub factor: RiskFactor,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedSubject {
    pub position: usize,
    pub subject: String,
    pub reasons: Vec<RiskFactor>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRecordView {
    pub position: usize,
    pub subject: String,
    pub message: String,
}

/// Counts and highlights for one evaluated batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSummary {
    pub records: usize,
    pub classifications: Vec<ClassificationTotal>,
    pub invalid: usize,
    /// Most frequent first; ties keep evaluation order.
    pub reason_frequency: Vec<ReasonCount>,
    pub high_risk: Vec<FlaggedSubject>,
    pub invalid_records: Vec<InvalidRecordView>,
}

impl RiskSummary {
    pub fn from_outcomes(outcomes: &[RecordOutcome]) -> Self {
        let mut tiers: BTreeMap<Classification, usize> = BTreeMap::new();
        let mut reasons: BTreeMap<RiskFactor, usize> = BTreeMap::new();
        let mut high_risk = Vec::new();
        let mut invalid_records = Vec::new();

        for (position, outcome) in outcomes.iter().enumerate() {
            match outcome {
                Ok(verdict) => {
                    *tiers.entry(verdict.classification).or_default() += 1;
                    for factor in &verdict.reasons {
                        *reasons.entry(*factor).or_default() += 1;
                    }
                    if verdict.classification == Classification::High {
                        high_risk.push(FlaggedSubject {
                            position,
                            subject: verdict.subject.clone(),
                            reasons: verdict.reasons.clone(),
                            summary: verdict.summary(),
                        });
                    }
                }
                Err(err) => invalid_records.push(InvalidRecordView {
                    position,
                    subject: err.subject().to_string(),
                    message: err.to_string(),
                }),
            }
        }

        let classifications = Classification::ordered()
            .into_iter()
            .map(|classification| ClassificationTotal {
                classification,
                label: classification.label(),
                count: tiers.get(&classification).copied().unwrap_or(0),
            })
            .collect();

        // BTreeMap iteration is factor order, and the sort is stable.
        let mut reason_frequency: Vec<ReasonCount> = reasons
            .into_iter()
            .map(|(factor, count)| ReasonCount {
                factor,
                label: factor.label(),
                count,
            })
            .collect();
        reason_frequency.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            records: outcomes.len(),
            classifications,
            invalid: invalid_records.len(),
            reason_frequency,
            high_risk,
            invalid_records,
        }
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.classifications
            .iter()
            .find(|total| total.classification == classification)
            .map(|total| total.count)
            .unwrap_or(0)
    }
}

/// JSON shape of one batch position: either a verdict or the reason it has none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeView {
    pub position: usize,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<RiskVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutcomeView {
    pub fn from_outcomes(outcomes: &[RecordOutcome]) -> Vec<Self> {
        outcomes
            .iter()
            .enumerate()
            .map(|(position, outcome)| match outcome {
                Ok(verdict) => Self {
                    position,
                    subject: verdict.subject.clone(),
                    classification: Some(verdict.classification),
                    summary: Some(verdict.summary()),
                    verdict: Some(verdict.clone()),
                    error: None,
                },
                Err(err) => Self {
                    position,
                    subject: err.subject().to_string(),
                    classification: None,
                    summary: None,
                    verdict: None,
                    error: Some(err.to_string()),
                },
            })
            .collect()
    }
}
