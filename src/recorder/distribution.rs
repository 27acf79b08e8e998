//! Labeled instruments through the `metrics` facade.

use crate::Result;
use crate::recorder::Backend;
use crate::telemetry;
use crate::types::{DerivedMetric, DerivedMetrics, MetricsRecord};

/// Emits histograms, counters and gauges labeled by model and endpoint.
#[derive(Debug, Default)]
pub struct DistributionBackend;

impl DistributionBackend {
    /// Create the backend and describe its instruments to the current
    /// recorder.
    pub fn new() -> Self {
        telemetry::describe();
        Self
    }

    /// Histogram fed by a derived metric, if any.
    fn histogram_for(metric: DerivedMetric) -> Option<&'static str> {
        match metric {
            DerivedMetric::ApiLatencyMs => Some(telemetry::API_LATENCY_MILLISECONDS),
            DerivedMetric::TimeToFirstTokenMs => Some(telemetry::TIME_TO_FIRST_TOKEN_MILLISECONDS),
            DerivedMetric::PromptProcessingTimeMs => {
                Some(telemetry::PROMPT_PROCESSING_MILLISECONDS)
            }
            DerivedMetric::TokenGenerationTimeMs => Some(telemetry::TOKEN_GENERATION_MILLISECONDS),
            DerivedMetric::RequestSizeBytes => Some(telemetry::REQUEST_SIZE_BYTES),
            DerivedMetric::ResponseSizeBytes => Some(telemetry::RESPONSE_SIZE_BYTES),
            DerivedMetric::TokensPerSecond
            | DerivedMetric::PromptTokens
            | DerivedMetric::CompletionTokens
            | DerivedMetric::TotalTokens => None,
        }
    }

    fn record_tokens(record: &MetricsRecord, kind: &'static str, count: u64) {
        if count == 0 {
            return;
        }
        metrics::counter!(telemetry::TOKENS_TOTAL,
            "model" => record.model.clone(),
            "endpoint" => record.endpoint.as_str(),
            "type" => kind,
        )
        .increment(count);
    }
}

impl Backend for DistributionBackend {
    fn name(&self) -> &str {
        "distribution"
    }

    fn record(&self, record: &MetricsRecord, derived: &DerivedMetrics) -> Result<()> {
        let endpoint = record.endpoint.as_str();

        for (metric, value) in derived.iter() {
            if let Some(name) = Self::histogram_for(metric) {
                metrics::histogram!(name,
                    "model" => record.model.clone(),
                    "endpoint" => endpoint,
                )
                .record(value);
            }
        }

        if let Some(tps) = derived.get(DerivedMetric::TokensPerSecond) {
            metrics::gauge!(telemetry::TOKENS_PER_SECOND,
                "model" => record.model.clone(),
                "endpoint" => endpoint,
            )
            .set(tps);
        }

        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "model" => record.model.clone(),
            "endpoint" => endpoint,
            "status" => record.status_code.to_string(),
        )
        .increment(1);

        Self::record_tokens(record, "prompt", record.prompt_tokens);
        Self::record_tokens(record, "completion", record.completion_tokens);

        Ok(())
    }
}
