//! CSV importers for supplier deliveries, purchase orders and inventory snapshots.

mod mapping;
mod normalizer;
mod parser;
mod purchase_orders;

pub use mapping::Column;
pub use purchase_orders::{summarize_purchase_orders, PurchaseOrderLine};

use crate::risk::{
    ConfigurationError, InventoryPosition, RecordOutcome, RiskEvaluator, RiskFactor,
    RiskFactorConfig, SupplierPerformance, SupplierRecord,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read CSV input: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row}: column `{column}` has unparseable value `{value}`")]
    InvalidCell {
        row: u64,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: column `{column}` is empty")]
    MissingValue { row: u64, column: &'static str },
}

/// Per-delivery supplier rows.
pub struct SupplierCsvImporter;

impl SupplierCsvImporter {
    const REQUIRED: [Column; 4] = [
        Column::Supplier,
        Column::ExpectedDeliveryDate,
        Column::ActualDeliveryDate,
        Column::OrderedQty,
    ];

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<SupplierRecord>, IngestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<SupplierRecord>, IngestError> {
        let table = parser::read_table(reader, &Self::REQUIRED)?;
        let mut records = Vec::new();

        for row in table.rows() {
            records.push(SupplierRecord {
                supplier: row.required_text(Column::Supplier)?,
                item_code: row.text(Column::ItemCode).map(str::to_string),
                ordered_qty: row.number(Column::OrderedQty)?,
                received_qty: row.number(Column::ReceivedQty)?,
                rejected_qty: row.number(Column::RejectedQty)?,
                expected_delivery_date: row.date(Column::ExpectedDeliveryDate)?,
                actual_delivery_date: row.date(Column::ActualDeliveryDate)?,
                payment_terms_days: row.number(Column::PaymentTermsDays)?,
                stock_buffer_days: row.number(Column::StockBufferDays)?,
                location_risk: row.number(Column::LocationRisk)?,
                freight_cost: row.number(Column::FreightCost)?,
            });
        }

        debug!(records = records.len(), "imported supplier deliveries");
        Ok(records)
    }
}

/// JDE purchase order lines, aggregated to one performance row per supplier.
pub struct PurchaseOrderImporter;

impl PurchaseOrderImporter {
    const REQUIRED: [Column; 6] = [
        Column::Supplier,
        Column::PoNumber,
        Column::ExpectedDeliveryDate,
        Column::ActualDeliveryDate,
        Column::OrderedQty,
        Column::RejectedQty,
    ];

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<SupplierPerformance>, IngestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<SupplierPerformance>, IngestError> {
        let lines = Self::lines_from_reader(reader)?;
        let summary = summarize_purchase_orders(&lines);
        debug!(
            lines = lines.len(),
            suppliers = summary.len(),
            "aggregated purchase orders"
        );
        Ok(summary)
    }

    /// Raw lines without aggregation.
    pub fn lines_from_reader<R: Read>(reader: R) -> Result<Vec<PurchaseOrderLine>, IngestError> {
        let table = parser::read_table(reader, &Self::REQUIRED)?;
        let mut lines = Vec::new();

        for row in table.rows() {
            lines.push(PurchaseOrderLine {
                supplier: row.required_text(Column::Supplier)?,
                po_number: row.required_text(Column::PoNumber)?,
                promised_date: row.required_date(Column::ExpectedDeliveryDate)?,
                received_date: row.required_date(Column::ActualDeliveryDate)?,
                ordered_qty: row.required_quantity(Column::OrderedQty)?,
                rejected_qty: row.quantity(Column::RejectedQty)?.unwrap_or(0.0),
            });
        }

        Ok(lines)
    }
}

/// Inventory snapshot with stock and consumption per item.
pub struct InventoryCsvImporter;

impl InventoryCsvImporter {
    const REQUIRED: [Column; 4] = [
        Column::ItemCode,
        Column::CurrentStockQty,
        Column::DailyAvgConsumption,
        Column::ExpectedDelayDays,
    ];

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<InventoryPosition>, IngestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<InventoryPosition>, IngestError> {
        let table = parser::read_table(reader, &Self::REQUIRED)?;
        let mut positions = Vec::new();

        for row in table.rows() {
            positions.push(InventoryPosition {
                item_code: row.required_text(Column::ItemCode)?,
                current_stock_qty: row.required_number(Column::CurrentStockQty)?,
                daily_avg_consumption: row.required_number(Column::DailyAvgConsumption)?,
                expected_delay_days: row.number(Column::ExpectedDelayDays)?.unwrap_or(0.0),
            });
        }

        debug!(positions = positions.len(), "imported inventory snapshot");
        Ok(positions)
    }
}

/// Which importer a CSV body goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    #[default]
    Supplier,
    PurchaseOrders,
    Inventory,
}

impl DatasetKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::Supplier, Self::PurchaseOrders, Self::Inventory]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Supplier => "supplier",
            Self::PurchaseOrders => "purchase_orders",
            Self::Inventory => "inventory",
        }
    }

    /// Factors rows of this kind carry data for.
    pub fn observable_factors(self) -> &'static [RiskFactor] {
        static SUPPLIER: [RiskFactor; 7] = RiskFactor::ordered();
        match self {
            Self::Supplier => &SUPPLIER,
            Self::PurchaseOrders => &[RiskFactor::Delay, RiskFactor::RejectionRate],
            Self::Inventory => &[RiskFactor::Delay, RiskFactor::StockBuffer],
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "supplier" | "suppliers" => Ok(Self::Supplier),
            "purchase_orders" | "po" | "jde" => Ok(Self::PurchaseOrders),
            "inventory" => Ok(Self::Inventory),
            _ => Err(format!(
                "unknown dataset kind `{value}` (expected supplier, purchase-orders or inventory)"
            )),
        }
    }
}

/// Imported rows of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Suppliers(Vec<SupplierRecord>),
    Performance(Vec<SupplierPerformance>),
    Inventory(Vec<InventoryPosition>),
}

impl Dataset {
    pub fn from_reader<R: Read>(kind: DatasetKind, reader: R) -> Result<Self, IngestError> {
        Ok(match kind {
            DatasetKind::Supplier => Self::Suppliers(SupplierCsvImporter::from_reader(reader)?),
            DatasetKind::PurchaseOrders => {
                Self::Performance(PurchaseOrderImporter::from_reader(reader)?)
            }
            DatasetKind::Inventory => Self::Inventory(InventoryCsvImporter::from_reader(reader)?),
        })
    }

    pub fn from_path<P: AsRef<Path>>(kind: DatasetKind, path: P) -> Result<Self, IngestError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(kind, file)
    }

    pub fn kind(&self) -> DatasetKind {
        match self {
            Self::Suppliers(_) => DatasetKind::Supplier,
            Self::Performance(_) => DatasetKind::PurchaseOrders,
            Self::Inventory(_) => DatasetKind::Inventory,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Suppliers(rows) => rows.len(),
            Self::Performance(rows) => rows.len(),
            Self::Inventory(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluates every row with the policy narrowed to what this kind can observe.
    pub fn evaluate(
        &self,
        evaluator: &RiskEvaluator,
    ) -> Result<Vec<RecordOutcome>, ConfigurationError> {
        let kind = self.kind();
        let configured = evaluator.config();
        let narrowed = configured.restricted_to(kind.observable_factors());
        if narrowed.enabled_factors.len() < configured.enabled_factors.len() {
            debug!(
                kind = kind.key(),
                factors = narrowed.enabled_factors.len(),
                "policy narrowed to observable factors"
            );
        }
        if let Some((from, to)) = lowered_min_count(configured, &narrowed) {
            warn!(
                kind = kind.key(),
                configured = from,
                applied = to,
                "count threshold lowered to the factors this dataset can observe"
            );
        }
        let evaluator = RiskEvaluator::new(narrowed)?;

        Ok(match self {
            Self::Suppliers(rows) => evaluator.evaluate_all(rows),
            Self::Performance(rows) => evaluator.evaluate_all(rows),
            Self::Inventory(rows) => evaluator.evaluate_all(rows),
        })
    }
}

/// `(configured, applied)` when narrowing made a count threshold easier to reach.
fn lowered_min_count(
    configured: &RiskFactorConfig,
    narrowed: &RiskFactorConfig,
) -> Option<(usize, usize)> {
    let from = configured.scoring_mode.min_count()?;
    let to = narrowed.scoring_mode.min_count().unwrap_or(1);
    (to < from).then_some((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn supplier_rows_map_aliases_and_blank_cells() {
        let csv = "\u{feff}Vendor,Item Code,Qty_Ordered,Qty_Received,Qty_Rejected,Promised_Date,Received_Date,Payment_Terms,Location Risk Index\n\
Delta,SKU-1,300,250,30,2024-03-01,2024-03-11,60,7\n\
Alpha,SKU-2,100,,,2024/03/01,2024-03-01T08:00:00Z,,\n";

        let records = SupplierCsvImporter::from_reader(csv.as_bytes()).expect("import succeeds");
        assert_eq!(records.len(), 2);

        let delta = &records[0];
        assert_eq!(delta.supplier, "Delta");
        assert_eq!(delta.item_code.as_deref(), Some("SKU-1"));
        assert_eq!(delta.rejected_qty, Some(30.0));
        assert_eq!(delta.location_risk, Some(7.0));
        assert_eq!(delta.delay_days().expect("dates present"), 10.0);

        let alpha = &records[1];
        assert_eq!(alpha.received_qty, None);
        assert_eq!(alpha.payment_terms_days, None);
        assert_eq!(
            alpha.actual_delivery_date,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn supplier_import_rejects_bad_quantities() {
        let csv = "supplier,expected_delivery_date,actual_delivery_date,ordered_qty\n\
Delta,2024-03-01,2024-03-02,lots\n";
        let error = SupplierCsvImporter::from_reader(csv.as_bytes()).expect_err("bad cell");
        assert!(matches!(
            error,
            IngestError::InvalidCell { row: 2, column: "ordered_qty", .. }
        ));
    }

    #[test]
    fn inventory_requires_consumption_values() {
        let csv = "Item Code,Current Stock (Qty),Daily Avg Consumption,Expected Delay (days)\n\
BOLT-8,120,,3\n";
        let error = InventoryCsvImporter::from_reader(csv.as_bytes()).expect_err("blank usage");
        assert!(matches!(
            error,
            IngestError::MissingValue { row: 2, column: "daily_avg_consumption" }
        ));
    }

    #[test]
    fn dataset_kind_parses_cli_spellings() {
        assert_eq!(
            "purchase-orders".parse::<DatasetKind>(),
            Ok(DatasetKind::PurchaseOrders)
        );
        assert_eq!("Inventory".parse::<DatasetKind>(), Ok(DatasetKind::Inventory));
        assert!("ledger".parse::<DatasetKind>().is_err());
        for kind in DatasetKind::ordered() {
            assert_eq!(kind.key().parse::<DatasetKind>(), Ok(kind));
        }
    }

    #[test]
    fn dataset_dispatches_on_kind() {
        let csv = "Item Code,Current Stock (Qty),Daily Avg Consumption,Expected Delay (days)\n\
BOLT-8,120,40,3\nNUT-2,900,30,0\n";
        let dataset =
            Dataset::from_reader(DatasetKind::Inventory, csv.as_bytes()).expect("import succeeds");
        assert_eq!(dataset.kind(), DatasetKind::Inventory);
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.is_empty());

        let evaluator = RiskEvaluator::new(crate::risk::RiskFactorConfig::default())
            .expect("default policy");
        let outcomes = dataset.evaluate(&evaluator).expect("narrowed policy is valid");
        let bolt = outcomes[0].as_ref().expect("bolt evaluates");
        assert_eq!(bolt.reasons, vec![RiskFactor::StockBuffer]);
        let nut = outcomes[1].as_ref().expect("nut evaluates");
        assert!(nut.reasons.is_empty());
    }

    #[test]
    fn purchase_orders_reject_negative_quantities() {
        let csv = "Supplier,PO_Number,Promised_Date,Received_Date,Qty_Ordered,Qty_Rejected\n\
Delta,PO-1,2024-03-01,2024-03-04,100,-50\n";
        let error = PurchaseOrderImporter::from_reader(csv.as_bytes()).expect_err("negative cell");
        assert!(matches!(
            error,
            IngestError::InvalidCell { row: 2, column: "rejected_qty", .. }
        ));

        let csv = "Supplier,PO_Number,Promised_Date,Received_Date,Qty_Ordered,Qty_Rejected\n\
Delta,PO-1,2024-03-01,2024-03-04,-100,5\n";
        let error = PurchaseOrderImporter::from_reader(csv.as_bytes()).expect_err("negative cell");
        assert!(matches!(
            error,
            IngestError::InvalidCell { row: 2, column: "ordered_qty", .. }
        ));
    }

    #[test]
    fn narrowing_reports_a_lowered_count_threshold() {
        let mut configured = RiskFactorConfig::default();
        configured.scoring_mode = crate::risk::ScoringMode::CountThreshold { min_count: 3 };

        let narrowed =
            configured.restricted_to(DatasetKind::PurchaseOrders.observable_factors());
        assert_eq!(lowered_min_count(&configured, &narrowed), Some((3, 2)));

        let unchanged = configured.restricted_to(DatasetKind::Supplier.observable_factors());
        assert_eq!(lowered_min_count(&configured, &unchanged), None);
        assert_eq!(
            lowered_min_count(&RiskFactorConfig::default(), &narrowed),
            None
        );
    }
}
