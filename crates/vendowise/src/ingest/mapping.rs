use super::normalizer::normalize_header;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Canonical column names the importers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Supplier,
    ItemCode,
    PoNumber,
    OrderedQty,
    ReceivedQty,
    RejectedQty,
    ExpectedDeliveryDate,
    ActualDeliveryDate,
    PaymentTermsDays,
    StockBufferDays,
    LocationRisk,
    FreightCost,
    CurrentStockQty,
    DailyAvgConsumption,
    ExpectedDelayDays,
}

impl Column {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Supplier => "supplier",
            Self::ItemCode => "item_code",
            Self::PoNumber => "po_number",
            Self::OrderedQty => "ordered_qty",
            Self::ReceivedQty => "received_qty",
            Self::RejectedQty => "rejected_qty",
            Self::ExpectedDeliveryDate => "expected_delivery_date",
            Self::ActualDeliveryDate => "actual_delivery_date",
            Self::PaymentTermsDays => "payment_terms_days",
            Self::StockBufferDays => "stock_buffer_days",
            Self::LocationRisk => "location_risk",
            Self::FreightCost => "freight_cost",
            Self::CurrentStockQty => "current_stock_qty",
            Self::DailyAvgConsumption => "daily_avg_consumption",
            Self::ExpectedDelayDays => "expected_delay_days",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static HEADER_ALIASES: OnceLock<HashMap<String, Column>> = OnceLock::new();

pub(crate) fn column_for_header(raw: &str) -> Option<Column> {
    header_aliases().get(&normalize_header(raw)).copied()
}

fn header_aliases() -> &'static HashMap<String, Column> {
    HEADER_ALIASES.get_or_init(|| {
        const ALIASES: &[(&str, Column)] = &[
            // Identity
            ("Supplier", Column::Supplier),
            ("Supplier Name", Column::Supplier),
            ("Vendor", Column::Supplier),
            ("vendor_name", Column::Supplier),
            ("Item Code", Column::ItemCode),
            ("Item", Column::ItemCode),
            ("SKU", Column::ItemCode),
            ("PO_Number", Column::PoNumber),
            ("PO", Column::PoNumber),
            ("PO No", Column::PoNumber),
            // Quantities
            ("ordered_qty", Column::OrderedQty),
            ("Qty_Ordered", Column::OrderedQty),
            ("Order Qty", Column::OrderedQty),
            ("Ordered Quantity", Column::OrderedQty),
            ("received_qty", Column::ReceivedQty),
            ("Qty_Received", Column::ReceivedQty),
            ("Received Quantity", Column::ReceivedQty),
            ("rejected_qty", Column::RejectedQty),
            ("Qty_Rejected", Column::RejectedQty),
            ("Rejected Quantity", Column::RejectedQty),
            // Delivery dates
            ("expected_delivery_date", Column::ExpectedDeliveryDate),
            ("Promised_Date", Column::ExpectedDeliveryDate),
            ("Expected Date", Column::ExpectedDeliveryDate),
            ("actual_delivery_date", Column::ActualDeliveryDate),
            ("Received_Date", Column::ActualDeliveryDate),
            ("Delivery Date", Column::ActualDeliveryDate),
            // Commercial terms
            ("payment_terms_days", Column::PaymentTermsDays),
            ("Payment_Terms", Column::PaymentTermsDays),
            ("stock_buffer_days", Column::StockBufferDays),
            ("Stock_Buffer", Column::StockBufferDays),
            ("location_risk", Column::LocationRisk),
            ("Location Risk Index", Column::LocationRisk),
            ("freight_cost", Column::FreightCost),
            ("Freight", Column::FreightCost),
            // Inventory snapshot
            ("Current Stock (Qty)", Column::CurrentStockQty),
            ("current_stock_qty", Column::CurrentStockQty),
            ("Daily Avg Consumption", Column::DailyAvgConsumption),
            ("Daily Usage", Column::DailyAvgConsumption),
            ("Daily Consumption", Column::DailyAvgConsumption),
            ("Expected Delay (days)", Column::ExpectedDelayDays),
            ("expected_delay_days", Column::ExpectedDelayDays),
        ];

        ALIASES
            .iter()
            .map(|(header, column)| (normalize_header(header), *column))
            .collect()
    })
}

#[cfg(test)]
pub(crate) fn lookup_for_tests(raw: &str) -> Option<Column> {
    column_for_header(raw)
}
