use chrono::{Duration, NaiveDate};

use crate::risk::{RiskFactor, RiskFactorConfig, ScoringMode, SupplierRecord, ThresholdKey};

pub(super) fn expected_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 16).expect("valid date")
}

/// Delta from the sample data: 10 days late, 30 of 300 rejected, 250 received.
pub(super) fn late_supplier() -> SupplierRecord {
    SupplierRecord {
        supplier: "Delta".to_string(),
        item_code: None,
        ordered_qty: Some(300.0),
        received_qty: Some(250.0),
        rejected_qty: Some(30.0),
        expected_delivery_date: Some(expected_date()),
        actual_delivery_date: Some(expected_date() + Duration::days(10)),
        payment_terms_days: Some(60.0),
        stock_buffer_days: Some(3.0),
        location_risk: Some(7.0),
        freight_cost: Some(8_500.0),
    }
}

/// Alpha-like supplier that breaches nothing under the default policy.
pub(super) fn reliable_supplier() -> SupplierRecord {
    SupplierRecord {
        supplier: "Alpha".to_string(),
        item_code: Some("ITM-100".to_string()),
        ordered_qty: Some(100.0),
        received_qty: Some(100.0),
        rejected_qty: Some(0.0),
        expected_delivery_date: Some(expected_date()),
        actual_delivery_date: Some(expected_date() + Duration::days(2)),
        payment_terms_days: Some(45.0),
        stock_buffer_days: Some(10.0),
        location_risk: Some(2.0),
        freight_cost: Some(1_200.0),
    }
}

pub(super) fn only(
    factors: &[RiskFactor],
    thresholds: &[(ThresholdKey, f64)],
    scoring_mode: ScoringMode,
) -> RiskFactorConfig {
    RiskFactorConfig::new(
        factors.iter().copied(),
        thresholds.iter().copied(),
        scoring_mode,
    )
}

pub(super) fn all_disabled() -> RiskFactorConfig {
    RiskFactorConfig {
        enabled_factors: Default::default(),
        ..RiskFactorConfig::default()
    }
}
