use super::common::*;
use crate::risk::{
    evaluate, Classification, ConfigurationError, InvalidRecordError, RiskError, RiskEvaluator,
    RiskFactor, RiskFactorConfig, ScoringMode, SupplierRecord, ThresholdKey,
};

#[test]
fn delay_only_policy_flags_late_delivery() {
    let config = only(
        &[RiskFactor::Delay],
        &[(ThresholdKey::DelayDays, 5.0)],
        ScoringMode::AnyTrigger,
    );

    let verdict = evaluate(&late_supplier(), &config).expect("evaluates");

    assert_eq!(verdict.classification, Classification::High);
    assert_eq!(verdict.reasons, vec![RiskFactor::Delay]);
    assert_eq!(verdict.score, 1.0);
    assert_eq!(verdict.subject, "Delta");
}

#[test]
fn count_threshold_of_two_reports_both_reasons() {
    let config = only(
        &[RiskFactor::Delay, RiskFactor::RejectionRate],
        &[
            (ThresholdKey::DelayDays, 5.0),
            (ThresholdKey::RejectionRate, 0.05),
        ],
        ScoringMode::CountThreshold { min_count: 2 },
    );

    let verdict = evaluate(&late_supplier(), &config).expect("evaluates");

    assert_eq!(verdict.classification, Classification::High);
    assert_eq!(
        verdict.reasons,
        vec![RiskFactor::Delay, RiskFactor::RejectionRate]
    );
    assert_eq!(verdict.score, 2.0);
}

#[test]
fn low_stock_buffer_is_a_breach() {
    let mut record = SupplierRecord::new("Delta");
    record.stock_buffer_days = Some(3.0);
    let config = only(
        &[RiskFactor::StockBuffer],
        &[(ThresholdKey::MinStockBufferDays, 7.0)],
        ScoringMode::AnyTrigger,
    );

    let verdict = evaluate(&record, &config).expect("evaluates");

    assert_eq!(verdict.classification, Classification::High);
    assert_eq!(verdict.reasons, vec![RiskFactor::StockBuffer]);
    let observation = &verdict.observations[0];
    assert_eq!(observation.observed, 3.0);
    assert_eq!(observation.threshold, Some(7.0));
    assert!(observation.breached);
}

#[test]
fn zero_ordered_quantity_never_breaches_rejection_rate() {
    let mut record = SupplierRecord::new("Echo");
    record.ordered_qty = Some(0.0);
    record.rejected_qty = Some(0.0);
    let config = only(
        &[RiskFactor::RejectionRate],
        &[(ThresholdKey::RejectionRate, 0.05)],
        ScoringMode::AnyTrigger,
    );

    let verdict = evaluate(&record, &config).expect("zero ordered is not an error");

    assert_eq!(verdict.classification, Classification::Low);
    assert!(verdict.reasons.is_empty());
}

#[test]
fn missing_threshold_fails_before_evaluation() {
    let config = only(&[RiskFactor::LocationRisk], &[], ScoringMode::AnyTrigger);

    let error = evaluate(&late_supplier(), &config).expect_err("config rejected");
    assert_eq!(
        error,
        RiskError::Configuration(ConfigurationError::MissingThreshold {
            factor: RiskFactor::LocationRisk,
            key: ThresholdKey::MaxLocationRisk,
        })
    );

    // Configuration errors win even when the record itself is unusable.
    let error = evaluate(&SupplierRecord::new("empty"), &config).expect_err("config rejected");
    assert!(matches!(error, RiskError::Configuration(_)));
}

#[test]
fn all_factors_disabled_is_always_low() {
    let evaluator = RiskEvaluator::new(all_disabled()).expect("valid config");

    for record in [late_supplier(), reliable_supplier(), SupplierRecord::new("blank")] {
        let verdict = evaluator.evaluate(&record).expect("nothing to observe");
        assert_eq!(verdict.classification, Classification::Low);
        assert!(verdict.reasons.is_empty());
        assert!(verdict.observations.is_empty());
        assert_eq!(verdict.score, 0.0);
    }
}

#[test]
fn default_policy_reports_reasons_in_evaluation_order() {
    let evaluator = RiskEvaluator::new(RiskFactorConfig::default()).expect("valid config");

    let verdict = evaluator.evaluate(&late_supplier()).expect("evaluates");

    assert_eq!(
        verdict.reasons,
        vec![
            RiskFactor::Delay,
            RiskFactor::RejectionRate,
            RiskFactor::PartialDelivery,
            RiskFactor::StockBuffer,
            RiskFactor::LocationRisk,
        ]
    );
    assert_eq!(verdict.observations.len(), 7);
    assert_eq!(
        verdict.summary(),
        "High Risk (Delay, Rejection, Partial Delivery, Low Stock Buffer, Location Risk)"
    );

    let verdict = evaluator.evaluate(&reliable_supplier()).expect("evaluates");
    assert_eq!(verdict.classification, Classification::Low);
    assert_eq!(verdict.summary(), "Low Risk");
}

#[test]
fn reasons_never_include_disabled_factors() {
    let subsets: [&[RiskFactor]; 4] = [
        &[RiskFactor::Delay],
        &[RiskFactor::PartialDelivery, RiskFactor::FreightCost],
        &[RiskFactor::StockBuffer, RiskFactor::LocationRisk],
        &[
            RiskFactor::RejectionRate,
            RiskFactor::PaymentTerms,
            RiskFactor::LocationRisk,
        ],
    ];

    for subset in subsets {
        let config = RiskFactorConfig {
            enabled_factors: subset.iter().copied().collect(),
            ..RiskFactorConfig::default()
        };
        let evaluator = RiskEvaluator::new(config).expect("valid config");
        let verdict = evaluator.evaluate(&late_supplier()).expect("evaluates");
        assert!(
            verdict.reasons.iter().all(|factor| subset.contains(factor)),
            "{:?} leaked outside {:?}",
            verdict.reasons,
            subset
        );
    }
}

#[test]
fn evaluation_is_deterministic() {
    let evaluator = RiskEvaluator::new(RiskFactorConfig::default()).expect("valid config");
    let record = late_supplier();

    let first = evaluator.evaluate(&record).expect("evaluates");
    let second = evaluator.evaluate(&record).expect("evaluates");

    assert_eq!(first, second);
}

#[test]
fn disabled_factors_do_not_require_fields() {
    let mut record = SupplierRecord::new("Charlie");
    record.payment_terms_days = Some(90.0);
    let config = only(
        &[RiskFactor::PaymentTerms],
        &[(ThresholdKey::PaymentTermsDays, 60.0)],
        ScoringMode::AnyTrigger,
    );

    let verdict = evaluate(&record, &config).expect("only payment terms needed");
    assert_eq!(verdict.reasons, vec![RiskFactor::PaymentTerms]);
}

#[test]
fn missing_field_for_enabled_factor_is_invalid_record() {
    let mut record = late_supplier();
    record.actual_delivery_date = None;

    let error = evaluate(&record, &RiskFactorConfig::default()).expect_err("record rejected");

    assert_eq!(
        error,
        RiskError::InvalidRecord(InvalidRecordError::MissingField {
            subject: "Delta".to_string(),
            field: "actual_delivery_date",
        })
    );
}

#[test]
fn evaluation_does_not_mutate_inputs() {
    let config = RiskFactorConfig::default();
    let record = late_supplier();
    let config_before = config.clone();
    let record_before = record.clone();

    let _ = evaluate(&record, &config).expect("evaluates");

    assert_eq!(config, config_before);
    assert_eq!(record, record_before);
}
