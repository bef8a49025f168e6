use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;
use vendowise::error::AppError;
use vendowise::{PolicyStore, RiskFactorConfig};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Active risk policy plus the store it is persisted to.
#[derive(Clone)]
pub(crate) struct PolicyState {
    active: Arc<RwLock<RiskFactorConfig>>,
    store: Arc<PolicyStore>,
}

impl PolicyState {
    pub(crate) fn new(store: PolicyStore, config: RiskFactorConfig) -> Self {
        Self {
            active: Arc::new(RwLock::new(config)),
            store: Arc::new(store),
        }
    }

    /// Copy of the active policy. Requests evaluate against this, never the live lock.
    pub(crate) fn snapshot(&self) -> RiskFactorConfig {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persists `config` and makes it active. The active policy is untouched if saving fails.
    ///
    /// The write lock is held across the save, so the file on disk always matches
    /// the last policy made active. Blocks on file I/O.
    pub(crate) fn replace(&self, config: RiskFactorConfig) -> Result<RiskFactorConfig, AppError> {
        let mut guard = self.active.write().unwrap_or_else(PoisonError::into_inner);
        self.store.save(&config)?;
        *guard = config.clone();
        drop(guard);
        info!(
            path = %self.store.path().display(),
            factors = config.enabled_factors.len(),
            "risk policy replaced"
        );
        Ok(config)
    }
}
