use crate::risk::SupplierPerformance;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One purchase order line as exported from JDE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub supplier: String,
    pub po_number: String,
    pub promised_date: NaiveDate,
    pub received_date: NaiveDate,
    pub ordered_qty: f64,
    pub rejected_qty: f64,
}

impl PurchaseOrderLine {
    /// Signed: early receipts count negative here, clamping happens at evaluation.
    pub fn delay_days(&self) -> f64 {
        (self.received_date - self.promised_date).num_days() as f64
    }

    pub fn rejection_rate(&self) -> f64 {
        if self.ordered_qty > 0.0 {
            self.rejected_qty / self.ordered_qty
        } else {
            0.0
        }
    }
}

#[derive(Default)]
struct Accumulator {
    delay_total: f64,
    rejection_total: f64,
    orders: usize,
}

/// Per-supplier means, in the order suppliers first appear.
pub fn summarize_purchase_orders(lines: &[PurchaseOrderLine]) -> Vec<SupplierPerformance> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, Accumulator> = HashMap::new();

    for line in lines {
        let entry = totals.entry(line.supplier.as_str()).or_insert_with(|| {
            order.push(line.supplier.as_str());
            Accumulator::default()
        });
        entry.delay_total += line.delay_days();
        entry.rejection_total += line.rejection_rate();
        entry.orders += 1;
    }

    order
        .into_iter()
        .filter_map(|supplier| {
            let totals = totals.get(supplier)?;
            let count = totals.orders as f64;
            Some(SupplierPerformance {
                supplier: supplier.to_string(),
                average_delay_days: totals.delay_total / count,
                average_rejection_rate: totals.rejection_total / count,
                historical_orders: totals.orders,
            })
        })
        .collect()
}
