//! Prometheus exporter for the distribution backend.
//!
//! Latency histograms (`*_milliseconds`) and size histograms
//! (`*_size_bytes`) get the bucket boundaries from [`HistogramConfig`];
//! everything else uses the exporter defaults (summaries for other
//! histograms, plain counters and gauges).

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use crate::config::HistogramConfig;
use crate::telemetry;
use crate::{Result, TokenmeterError};

fn builder(config: &HistogramConfig) -> Result<PrometheusBuilder> {
    config.validate()?;
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix(telemetry::LATENCY_SUFFIX.to_string()),
            &config.latency_ms,
        )
        .and_then(|builder| {
            builder.set_buckets_for_metric(
                Matcher::Suffix(telemetry::SIZE_SUFFIX.to_string()),
                &config.size_bytes,
            )
        })
        .map_err(|e| TokenmeterError::Configuration(format!("invalid histogram buckets: {e}")))
}

/// Build a Prometheus recorder without installing it globally.
pub fn build(config: &HistogramConfig) -> Result<PrometheusRecorder> {
    Ok(builder(config)?.build_recorder())
}

/// Install a Prometheus recorder as the global `metrics` recorder.
///
/// Call before constructing a [`MetricsRecorder`](crate::MetricsRecorder)
/// so instrument descriptions reach the exporter. The returned handle
/// renders the scrape payload.
pub fn install(config: &HistogramConfig) -> Result<PrometheusHandle> {
    builder(config)?.install_recorder().map_err(|e| TokenmeterError::Backend {
        backend: "prometheus".to_string(),
        message: format!("failed to install recorder: {e}"),
    })
}
