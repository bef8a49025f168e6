//! Supplier and inventory risk classification.
//!
//! The [`risk`] module holds the evaluator. Everything else feeds it
//! (ingestion, the policy store) or surfaces its results (summary, error
//! mapping, telemetry).

pub mod config;
pub mod error;
pub mod ingest;
pub mod policy_store;
pub mod report;
pub mod risk;
pub mod telemetry;

pub use error::AppError;
pub use ingest::{Dataset, DatasetKind, IngestError};
pub use policy_store::{PolicyStore, PolicyStoreError};
pub use report::RiskSummary;
pub use risk::{
    evaluate, evaluate_all, Classification, ConfigurationError, InvalidRecordError,
    InventoryPosition, RecordOutcome, RiskError, RiskEvaluator, RiskFactor, RiskFactorConfig,
    RiskVerdict, ScoringMode, SupplierPerformance, SupplierRecord, ThresholdKey,
};
