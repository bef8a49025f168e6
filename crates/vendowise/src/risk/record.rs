use super::factor::RiskFactor;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Value a subject exposes for one factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observed {
    Measure(f64),
    Flag(bool),
}

/// Anything the evaluator can classify.
///
/// Implementations derive each factor's value from raw fields on every call,
/// so a verdict never reflects stale derived state.
pub trait RiskSubject {
    fn subject_id(&self) -> &str;

    fn observe(&self, factor: RiskFactor) -> Result<Observed, InvalidRecordError>;
}

/// A specific record could not be evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidRecordError {
    #[error("record `{subject}` is missing required field `{field}`")]
    MissingField {
        subject: String,
        field: &'static str,
    },
    #[error("record `{subject}` has non-numeric `{field}` ({value})")]
    NonNumeric {
        subject: String,
        field: &'static str,
        value: f64,
    },
    #[error("record `{subject}` has negative `{field}` ({value})")]
    Negative {
        subject: String,
        field: &'static str,
        value: f64,
    },
}

impl InvalidRecordError {
    pub fn subject(&self) -> &str {
        match self {
            Self::MissingField { subject, .. }
            | Self::NonNumeric { subject, .. }
            | Self::Negative { subject, .. } => subject,
        }
    }
}

/// One supplier delivery with raw observed quantities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierRecord {
    pub supplier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    #[serde(default)]
    pub ordered_qty: Option<f64>,
    #[serde(default)]
    pub received_qty: Option<f64>,
    #[serde(default)]
    pub rejected_qty: Option<f64>,
    #[serde(default)]
    pub expected_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_terms_days: Option<f64>,
    #[serde(default)]
    pub stock_buffer_days: Option<f64>,
    #[serde(default)]
    pub location_risk: Option<f64>,
    #[serde(default)]
    pub freight_cost: Option<f64>,
}

impl SupplierRecord {
    pub fn new(supplier: impl Into<String>) -> Self {
        Self {
            supplier: supplier.into(),
            ..Self::default()
        }
    }

    /// Days late, floored at zero. Early delivery is not negative risk.
    pub fn delay_days(&self) -> Result<f64, InvalidRecordError> {
        let expected = self.require_date(self.expected_delivery_date, "expected_delivery_date")?;
        let actual = self.require_date(self.actual_delivery_date, "actual_delivery_date")?;
        Ok((actual - expected).num_days().max(0) as f64)
    }

    /// Rejected over ordered. Zero when nothing was ordered.
    pub fn rejection_rate(&self) -> Result<f64, InvalidRecordError> {
        let ordered = self.require_quantity(self.ordered_qty, "ordered_qty")?;
        let rejected = self.require_quantity(self.rejected_qty, "rejected_qty")?;
        if ordered == 0.0 {
            return Ok(0.0);
        }
        Ok(rejected / ordered)
    }

    pub fn partial_delivery(&self) -> Result<bool, InvalidRecordError> {
        let ordered = self.require_quantity(self.ordered_qty, "ordered_qty")?;
        let received = self.require_quantity(self.received_qty, "received_qty")?;
        Ok(received < ordered)
    }

    fn require_date(
        &self,
        value: Option<NaiveDate>,
        field: &'static str,
    ) -> Result<NaiveDate, InvalidRecordError> {
        value.ok_or_else(|| InvalidRecordError::MissingField {
            subject: self.supplier.clone(),
            field,
        })
    }

    fn require_quantity(
        &self,
        value: Option<f64>,
        field: &'static str,
    ) -> Result<f64, InvalidRecordError> {
        require_quantity(&self.supplier, value, field)
    }
}

impl RiskSubject for SupplierRecord {
    fn subject_id(&self) -> &str {
        &self.supplier
    }

    fn observe(&self, factor: RiskFactor) -> Result<Observed, InvalidRecordError> {
        let subject = &self.supplier;
        match factor {
            RiskFactor::Delay => self.delay_days().map(Observed::Measure),
            RiskFactor::RejectionRate => self.rejection_rate().map(Observed::Measure),
            RiskFactor::PartialDelivery => self.partial_delivery().map(Observed::Flag),
            RiskFactor::PaymentTerms => {
                require_number(subject, self.payment_terms_days, "payment_terms_days")
                    .map(Observed::Measure)
            }
            RiskFactor::StockBuffer => {
                require_number(subject, self.stock_buffer_days, "stock_buffer_days")
                    .map(Observed::Measure)
            }
            RiskFactor::LocationRisk => {
                require_number(subject, self.location_risk, "location_risk").map(Observed::Measure)
            }
            RiskFactor::FreightCost => {
                require_number(subject, self.freight_cost, "freight_cost").map(Observed::Measure)
            }
        }
    }
}

/// Purchase-order history aggregated per supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierPerformance {
    pub supplier: String,
    pub average_delay_days: f64,
    pub average_rejection_rate: f64,
    pub historical_orders: usize,
}

impl RiskSubject for SupplierPerformance {
    fn subject_id(&self) -> &str {
        &self.supplier
    }

    fn observe(&self, factor: RiskFactor) -> Result<Observed, InvalidRecordError> {
        let subject = &self.supplier;
        match factor {
            RiskFactor::Delay => {
                require_number(subject, Some(self.average_delay_days), "average_delay_days")
                    .map(|delay| Observed::Measure(delay.max(0.0)))
            }
            RiskFactor::RejectionRate => require_number(
                subject,
                Some(self.average_rejection_rate),
                "average_rejection_rate",
            )
            .map(Observed::Measure),
            other => Err(InvalidRecordError::MissingField {
                subject: subject.clone(),
                field: source_field(other),
            }),
        }
    }
}

/// Stocked item awaiting replenishment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryPosition {
    pub item_code: String,
    pub current_stock_qty: f64,
    pub daily_avg_consumption: f64,
    pub expected_delay_days: f64,
}

impl InventoryPosition {
    /// Days of stock left at the average consumption rate. Unbounded when nothing is consumed.
    pub fn days_of_stock(&self) -> Result<f64, InvalidRecordError> {
        let stock = require_quantity(
            &self.item_code,
            Some(self.current_stock_qty),
            "current_stock_qty",
        )?;
        let daily = require_quantity(
            &self.item_code,
            Some(self.daily_avg_consumption),
            "daily_avg_consumption",
        )?;
        if daily == 0.0 {
            return Ok(f64::INFINITY);
        }
        Ok(stock / daily)
    }
}

impl RiskSubject for InventoryPosition {
    fn subject_id(&self) -> &str {
        &self.item_code
    }

    fn observe(&self, factor: RiskFactor) -> Result<Observed, InvalidRecordError> {
        match factor {
            RiskFactor::StockBuffer => self.days_of_stock().map(Observed::Measure),
            RiskFactor::Delay => require_number(
                &self.item_code,
                Some(self.expected_delay_days),
                "expected_delay_days",
            )
            .map(|delay| Observed::Measure(delay.max(0.0))),
            other => Err(InvalidRecordError::MissingField {
                subject: self.item_code.clone(),
                field: source_field(other),
            }),
        }
    }
}

fn require_number(
    subject: &str,
    value: Option<f64>,
    field: &'static str,
) -> Result<f64, InvalidRecordError> {
    match value {
        None => Err(InvalidRecordError::MissingField {
            subject: subject.to_string(),
            field,
        }),
        Some(value) if !value.is_finite() => Err(InvalidRecordError::NonNumeric {
            subject: subject.to_string(),
            field,
            value,
        }),
        Some(value) => Ok(value),
    }
}

fn require_quantity(
    subject: &str,
    value: Option<f64>,
    field: &'static str,
) -> Result<f64, InvalidRecordError> {
    let value = require_number(subject, value, field)?;
    if value < 0.0 {
        return Err(InvalidRecordError::Negative {
            subject: subject.to_string(),
            field,
            value,
        });
    }
    Ok(value)
}

fn source_field(factor: RiskFactor) -> &'static str {
    match factor {
        RiskFactor::Delay => "delay_days",
        RiskFactor::RejectionRate => "rejection_rate",
        RiskFactor::PartialDelivery => "received_qty",
        RiskFactor::PaymentTerms => "payment_terms_days",
        RiskFactor::StockBuffer => "stock_buffer_days",
        RiskFactor::LocationRisk => "location_risk",
        RiskFactor::FreightCost => "freight_cost",
    }
}
