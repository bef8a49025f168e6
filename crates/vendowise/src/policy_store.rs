//! Durable storage for the risk policy.
//!
//! The document on disk is forgiving: every key is optional and falls back to
//! the defaults of [`RiskFactorConfig::default`]. Documents written by the
//! older dashboards (`use_*` toggles, flat threshold keys) are still read.
//! Whatever is loaded is validated before it is handed out.

use crate::risk::{
    default_thresholds, ConfigurationError, RiskFactor, RiskFactorConfig, ScoringMode,
    ThresholdKey,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PolicyStoreError {
    #[error("failed to access policy file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("policy file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid risk policy: {0}")]
    Invalid(#[from] ConfigurationError),
}

/// Loads and saves the policy document at a fixed path.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    path: PathBuf,
}

impl PolicyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the policy, falling back to the complete default when the file is absent.
    pub fn load(&self) -> Result<RiskFactorConfig, PolicyStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let document: PolicyDocument =
                    serde_json::from_str(&raw).map_err(|source| PolicyStoreError::Parse {
                        path: self.path.clone(),
                        source,
                    })?;
                let config = document.into_config()?;
                info!(path = %self.path.display(), factors = config.enabled_factors.len(), "loaded risk policy");
                Ok(config)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no risk policy on disk, using defaults");
                Ok(RiskFactorConfig::default())
            }
            Err(source) => Err(PolicyStoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Like [`PolicyStore::load`], but writes the default document on first use.
    pub fn load_or_init(&self) -> Result<RiskFactorConfig, PolicyStoreError> {
        if !self.path.exists() {
            let config = RiskFactorConfig::default();
            self.save(&config)?;
            return Ok(config);
        }
        self.load()
    }

    /// Validates and writes the policy. The previous file is replaced atomically.
    pub fn save(&self, config: &RiskFactorConfig) -> Result<(), PolicyStoreError> {
        config.validate()?;

        let io_error = |source| PolicyStoreError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(io_error)?;

        let mut body = serde_json::to_string_pretty(config).map_err(|source| {
            PolicyStoreError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        body.push('\n');

        // Each save stages in its own file, so concurrent saves never share one.
        let mut staging = NamedTempFile::new_in(parent).map_err(io_error)?;
        staging.write_all(body.as_bytes()).map_err(io_error)?;
        staging.as_file().sync_all().map_err(io_error)?;
        staging
            .persist(&self.path)
            .map_err(|err| io_error(err.error))?;

        info!(path = %self.path.display(), mode = config.scoring_mode.label(), "saved risk policy");
        Ok(())
    }
}

/// Loosely shaped policy as stored on disk or sent by clients.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_factors: Option<BTreeSet<RiskFactor>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub thresholds: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_mode: Option<ScoringMode>,
    #[serde(flatten)]
    pub legacy: LegacyToggles,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// `use_*` switches from the dashboard era. Delay was always on there.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LegacyToggles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_rejected_qty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_payment_terms: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_stock_buffer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_location_risk: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_partial_delivery: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_freight_cost: Option<bool>,
}

impl LegacyToggles {
    fn any_set(&self) -> bool {
        [
            self.use_rejected_qty,
            self.use_payment_terms,
            self.use_stock_buffer,
            self.use_location_risk,
            self.use_partial_delivery,
            self.use_freight_cost,
        ]
        .iter()
        .any(Option::is_some)
    }

    fn enabled_factors(&self) -> BTreeSet<RiskFactor> {
        let toggles = [
            (RiskFactor::RejectionRate, self.use_rejected_qty.unwrap_or(true)),
            (RiskFactor::PaymentTerms, self.use_payment_terms.unwrap_or(true)),
            (RiskFactor::StockBuffer, self.use_stock_buffer.unwrap_or(true)),
            (RiskFactor::LocationRisk, self.use_location_risk.unwrap_or(true)),
            (
                RiskFactor::PartialDelivery,
                self.use_partial_delivery.unwrap_or(false),
            ),
            (RiskFactor::FreightCost, self.use_freight_cost.unwrap_or(false)),
        ];

        std::iter::once(RiskFactor::Delay)
            .chain(
                toggles
                    .into_iter()
                    .filter(|(_, enabled)| *enabled)
                    .map(|(factor, _)| factor),
            )
            .collect()
    }
}

impl PolicyDocument {
    /// Fills defaults, folds legacy keys in, and validates the result.
    pub fn into_config(self) -> Result<RiskFactorConfig, ConfigurationError> {
        let enabled_factors = match self.enabled_factors {
            Some(factors) => factors,
            None if self.legacy.any_set() => self.legacy.enabled_factors(),
            None => RiskFactor::ordered().into_iter().collect(),
        };

        let mut thresholds = default_thresholds();
        for (name, value) in &self.extra {
            if let (Some(key), Some(number)) = (ThresholdKey::from_key(name), value.as_f64()) {
                thresholds.insert(key, number);
            }
        }
        for (name, value) in &self.thresholds {
            match ThresholdKey::from_key(name) {
                Some(key) => {
                    thresholds.insert(key, *value);
                }
                None => warn!(threshold = %name, "ignoring unknown threshold key"),
            }
        }

        let config = RiskFactorConfig {
            enabled_factors,
            thresholds,
            scoring_mode: self.scoring_mode.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<&RiskFactorConfig> for PolicyDocument {
    fn from(config: &RiskFactorConfig) -> Self {
        Self {
            enabled_factors: Some(config.enabled_factors.clone()),
            thresholds: config
                .thresholds
                .iter()
                .map(|(key, value)| (key.key().to_string(), *value))
                .collect(),
            scoring_mode: Some(config.scoring_mode.clone()),
            legacy: LegacyToggles::default(),
            extra: BTreeMap::new(),
        }
    }
}
