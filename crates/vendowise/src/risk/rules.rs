use super::config::RiskFactorConfig;
use super::factor::RiskFactor;
use super::record::{InvalidRecordError, Observed, RiskSubject};
use super::FactorObservation;

pub(crate) struct FactorTrail {
    pub observations: Vec<FactorObservation>,
    pub reasons: Vec<RiskFactor>,
}

/// Walks the enabled factors in evaluation order and records each breach.
///
/// The config must already be validated: thresholds for enabled factors exist.
pub(crate) fn observe_factors<S>(
    subject: &S,
    config: &RiskFactorConfig,
) -> Result<FactorTrail, InvalidRecordError>
where
    S: RiskSubject + ?Sized,
{
    let mut observations = Vec::new();
    let mut reasons = Vec::new();

    for factor in config.enabled_in_order() {
        let threshold = factor
            .threshold_key()
            .and_then(|key| config.threshold(key));

        let observation = match (subject.observe(factor)?, threshold) {
            (Observed::Flag(flag), _) => FactorObservation {
                factor,
                observed: if flag { 1.0 } else { 0.0 },
                threshold: None,
                breached: flag,
                notes: if flag {
                    format!("{} triggered", factor.label())
                } else {
                    format!("no {}", factor.label().to_ascii_lowercase())
                },
            },
            (Observed::Measure(value), Some(limit)) => {
                let comparator = factor.comparator();
                let breached = comparator.breached(value, limit);
                let notes = if breached {
                    format!("{} {value} {} threshold {limit}", factor.key(), comparator.symbol())
                } else {
                    format!("{} {value} within threshold {limit}", factor.key())
                };
                FactorObservation {
                    factor,
                    observed: value,
                    threshold: Some(limit),
                    breached,
                    notes,
                }
            }
            (Observed::Measure(value), None) => FactorObservation {
                factor,
                observed: value,
                threshold: None,
                breached: false,
                notes: format!("{} {value} has no threshold", factor.key()),
            },
        };

        if observation.breached {
            reasons.push(factor);
        }
        observations.push(observation);
    }

    Ok(FactorTrail {
        observations,
        reasons,
    })
}
