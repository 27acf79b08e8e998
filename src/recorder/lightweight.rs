//! Per-(model, endpoint) scalars in a [`VarRegistry`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::ServiceConfig;
use crate::recorder::Backend;
use crate::types::{DerivedMetric, DerivedMetrics, MetricsRecord};
use crate::vars::{FloatVar, IntVar, Var, VarRegistry};
use crate::Result;

const BACKEND: &str = "lightweight";

/// Variables published for one composite key.
#[derive(Debug, Clone)]
struct KeyVars {
    requests: IntVar,
    errors: IntVar,
    avg_latency: FloatVar,
    avg_ttft: FloatVar,
}

impl KeyVars {
    /// Publish all four variables for `key`, or none of them.
    fn publish(vars: &VarRegistry, key: &str) -> Result<Self> {
        let key_vars = Self {
            requests: IntVar::default(),
            errors: IntVar::default(),
            avg_latency: FloatVar::default(),
            avg_ttft: FloatVar::default(),
        };
        vars.publish_all(vec![
            (format!("requests_{key}"), Var::Int(key_vars.requests.clone())),
            (format!("errors_{key}"), Var::Int(key_vars.errors.clone())),
            (format!("avg_latency_{key}"), Var::Float(key_vars.avg_latency.clone())),
            (format!("avg_ttft_{key}"), Var::Float(key_vars.avg_ttft.clone())),
        ])?;
        Ok(key_vars)
    }
}

/// Request/error counters and latency gauges per model and endpoint.
///
/// Variables for a key are published on first sight of that key. The
/// `avg_*` gauges hold the value of the most recent call, not a mean.
#[derive(Debug)]
pub struct LightweightBackend {
    vars: Arc<VarRegistry>,
    keys: Mutex<HashMap<String, KeyVars>>,
}

impl LightweightBackend {
    /// Create the backend and publish the static `service` and `version`
    /// identity variables.
    pub fn new(vars: Arc<VarRegistry>, service: &ServiceConfig) -> Result<Self> {
        vars.new_string("service")?.set(service.name.as_str())?;
        vars.new_string("version")?.set(service.version.as_str())?;
        Ok(Self {
            vars,
            keys: Mutex::new(HashMap::new()),
        })
    }

    /// The registry this backend publishes into.
    pub fn vars(&self) -> &Arc<VarRegistry> {
        &self.vars
    }
}

impl Backend for LightweightBackend {
    fn name(&self) -> &str {
        BACKEND
    }

    fn record(&self, record: &MetricsRecord, derived: &DerivedMetrics) -> Result<()> {
        // One lock for the whole map: creation and updates must not race.
        // The map only holds handles, so a poisoned lock is still consistent.
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);

        let key_vars = match keys.entry(record.composite_key()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let key_vars = KeyVars::publish(&self.vars, entry.key())?;
                entry.insert(key_vars)
            }
        };

        key_vars.requests.add(1);
        if record.is_error() {
            key_vars.errors.add(1);
        }
        if let Some(latency) = derived.get(DerivedMetric::ApiLatencyMs) {
            key_vars.avg_latency.set(latency);
        }
        if let Some(ttft) = derived.get(DerivedMetric::TimeToFirstTokenMs) {
            key_vars.avg_ttft.set(ttft);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate;
    use crate::types::EndpointKind;

    #[test]
    fn poisoned_lock_still_records() {
        let backend = Arc::new(
            LightweightBackend::new(Arc::new(VarRegistry::new()), &ServiceConfig::default())
                .unwrap(),
        );

        let poisoner = Arc::clone(&backend);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.keys.lock().unwrap();
            panic!("poison the key map");
        })
        .join();
        assert!(joined.is_err());
        assert!(backend.keys.is_poisoned());

        let mut record = MetricsRecord::new(EndpointKind::Completions);
        record.model = "gpt-4".to_string();
        backend.record(&record, &calculate(&record)).unwrap();
        backend.record(&record, &calculate(&record)).unwrap();

        match backend.vars().get("requests_gpt-4_completions") {
            Some(Var::Int(var)) => assert_eq!(var.value(), 2),
            other => panic!("expected request counter, got {other:?}"),
        }
    }
}
