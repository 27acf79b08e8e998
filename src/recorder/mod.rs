//! Publishing of metrics to the configured backends.
//!
//! [`MetricsRecorder`] fans a record and its derived metrics out to every
//! registered [`Backend`]. Recording is best-effort: a failing backend is
//! logged and skipped, and nothing is ever returned to the caller, since
//! the request being measured has already completed.
//!
//! Two backends ship with the crate:
//!
//! - [`DistributionBackend`] emits labeled histograms, counters and gauges
//!   through the `metrics` facade, for scraping and alerting.
//! - [`LightweightBackend`] keeps per-(model, endpoint) scalars in a
//!   [`VarRegistry`] for quick runtime inspection.

mod distribution;
mod lightweight;

use std::sync::Arc;

use tracing::{debug, warn};

pub use distribution::DistributionBackend;
pub use lightweight::LightweightBackend;

use crate::Result;
use crate::config::Config;
use crate::types::{DerivedMetrics, MetricsRecord};
use crate::vars::VarRegistry;

/// A destination for recorded metrics.
pub trait Backend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Publish one call's record and derived metrics.
    fn record(&self, record: &MetricsRecord, derived: &DerivedMetrics) -> Result<()>;
}

/// Records metrics into a set of backends.
pub struct MetricsRecorder {
    backends: Vec<Arc<dyn Backend>>,
    vars: Option<Arc<VarRegistry>>,
}

impl MetricsRecorder {
    /// Create a recorder with the distribution and lightweight backends.
    ///
    /// Distribution instruments are described against the recorder that is
    /// current at this point, so install an exporter first.
    pub fn new(config: &Config) -> Result<Self> {
        let vars = Arc::new(VarRegistry::new());
        let lightweight = LightweightBackend::new(Arc::clone(&vars), &config.service)?;

        let mut recorder = Self::empty();
        recorder.add_backend(Arc::new(DistributionBackend::new()));
        recorder.add_backend(Arc::new(lightweight));
        recorder.vars = Some(vars);
        Ok(recorder)
    }

    /// Create a recorder without any backends.
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
            vars: None,
        }
    }

    /// Register an additional backend. Backends are called in insertion order.
    pub fn add_backend(&mut self, backend: Arc<dyn Backend>) {
        self.backends.push(backend);
    }

    /// Names of the registered backends.
    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    /// Registry behind the lightweight backend, if this recorder owns one.
    pub fn vars(&self) -> Option<&Arc<VarRegistry>> {
        self.vars.as_ref()
    }

    /// Publish a record to every backend.
    pub fn record(&self, record: &MetricsRecord, derived: &DerivedMetrics) {
        for backend in &self.backends {
            match backend.record(record, derived) {
                Ok(()) => debug!(
                    backend = backend.name(),
                    model = %record.model,
                    endpoint = %record.endpoint,
                    "recorded metrics"
                ),
                Err(e) => warn!(
                    backend = backend.name(),
                    model = %record.model,
                    endpoint = %record.endpoint,
                    error = %e,
                    "failed to record metrics"
                ),
            }
        }
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("backends", &self.backend_names())
            .finish_non_exhaustive()
    }
}
