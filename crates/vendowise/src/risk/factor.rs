use serde::{Deserialize, Serialize};
use std::fmt;

/// Independently togglable risk dimension.
///
/// Variant order is the evaluation order, so `Ord` and [`RiskFactor::ordered`]
/// agree and reason lists come out deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Delay,
    RejectionRate,
    PartialDelivery,
    PaymentTerms,
    StockBuffer,
    LocationRisk,
    FreightCost,
}

impl RiskFactor {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Delay,
            Self::RejectionRate,
            Self::PartialDelivery,
            Self::PaymentTerms,
            Self::StockBuffer,
            Self::LocationRisk,
            Self::FreightCost,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Delay => "delay",
            Self::RejectionRate => "rejection_rate",
            Self::PartialDelivery => "partial_delivery",
            Self::PaymentTerms => "payment_terms",
            Self::StockBuffer => "stock_buffer",
            Self::LocationRisk => "location_risk",
            Self::FreightCost => "freight_cost",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Delay => "Delay",
            Self::RejectionRate => "Rejection",
            Self::PartialDelivery => "Partial Delivery",
            Self::PaymentTerms => "Payment Terms",
            Self::StockBuffer => "Low Stock Buffer",
            Self::LocationRisk => "Location Risk",
            Self::FreightCost => "Freight Cost",
        }
    }

    /// Threshold consulted by this factor. `PartialDelivery` is a plain boolean check.
    pub const fn threshold_key(self) -> Option<ThresholdKey> {
        match self {
            Self::Delay => Some(ThresholdKey::DelayDays),
            Self::RejectionRate => Some(ThresholdKey::RejectionRate),
            Self::PartialDelivery => None,
            Self::PaymentTerms => Some(ThresholdKey::PaymentTermsDays),
            Self::StockBuffer => Some(ThresholdKey::MinStockBufferDays),
            Self::LocationRisk => Some(ThresholdKey::MaxLocationRisk),
            Self::FreightCost => Some(ThresholdKey::FreightCostLimit),
        }
    }

    pub const fn comparator(self) -> Comparator {
        match self {
            Self::StockBuffer => Comparator::Below,
            _ => Comparator::Above,
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Named threshold slot in a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKey {
    DelayDays,
    RejectionRate,
    PaymentTermsDays,
    MinStockBufferDays,
    MaxLocationRisk,
    #[serde(alias = "freight_cost")]
    FreightCostLimit,
}

impl ThresholdKey {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::DelayDays,
            Self::RejectionRate,
            Self::PaymentTermsDays,
            Self::MinStockBufferDays,
            Self::MaxLocationRisk,
            Self::FreightCostLimit,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::DelayDays => "delay_days",
            Self::RejectionRate => "rejection_rate",
            Self::PaymentTermsDays => "payment_terms_days",
            Self::MinStockBufferDays => "min_stock_buffer_days",
            Self::MaxLocationRisk => "max_location_risk",
            Self::FreightCostLimit => "freight_cost_limit",
        }
    }

    /// Looks up a key by name, accepting the `freight_cost` spelling as well.
    pub fn from_key(name: &str) -> Option<Self> {
        match name.trim() {
            "freight_cost" => Some(Self::FreightCostLimit),
            name => Self::ordered().into_iter().find(|key| key.key() == name),
        }
    }

    pub const fn default_value(self) -> f64 {
        match self {
            Self::DelayDays => 5.0,
            Self::RejectionRate => 0.05,
            Self::PaymentTermsDays => 60.0,
            Self::MinStockBufferDays => 7.0,
            Self::MaxLocationRisk => 5.0,
            Self::FreightCostLimit => 10_000.0,
        }
    }
}

impl fmt::Display for ThresholdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Direction in which an observed value becomes risky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Above,
    Below,
}

impl Comparator {
    pub fn breached(self, observed: f64, threshold: f64) -> bool {
        match self {
            Self::Above => observed > threshold,
            Self::Below => observed < threshold,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Above => ">",
            Self::Below => "<",
        }
    }
}
