//! Derived metric calculation.

use std::time::Instant;

use crate::types::{DerivedMetric, DerivedMetrics, MetricsRecord};

/// Compute derived metrics from a record.
///
/// Durations are only emitted when both of their timestamps are set.
/// `token_generation_time_ms` and `tokens_per_second` additionally need
/// completion tokens; `tokens_per_second` is omitted when the generation
/// window is not positive. Token counts and sizes are always present.
pub fn calculate(record: &MetricsRecord) -> DerivedMetrics {
    let mut derived = DerivedMetrics::new();

    if let (Some(start), Some(end)) = (record.request_start, record.response_end) {
        derived.insert(DerivedMetric::ApiLatencyMs, elapsed_ms(start, end));
    }

    if let (Some(start), Some(first)) = (record.request_start, record.first_token) {
        derived.insert(DerivedMetric::TimeToFirstTokenMs, elapsed_ms(start, first));
    }

    if let (Some(start), Some(response)) = (record.request_start, record.response_start) {
        derived.insert(
            DerivedMetric::PromptProcessingTimeMs,
            elapsed_ms(start, response),
        );
    }

    if let (Some(first), Some(end)) = (record.first_token, record.response_end)
        && record.completion_tokens > 0
    {
        let generation_ms = elapsed_ms(first, end);
        derived.insert(DerivedMetric::TokenGenerationTimeMs, generation_ms);
        if generation_ms > 0.0 {
            derived.insert(
                DerivedMetric::TokensPerSecond,
                record.completion_tokens as f64 / (generation_ms / 1e3),
            );
        }
    }

    derived.insert(DerivedMetric::PromptTokens, record.prompt_tokens as f64);
    derived.insert(DerivedMetric::CompletionTokens, record.completion_tokens as f64);
    derived.insert(DerivedMetric::TotalTokens, record.total_tokens as f64);
    derived.insert(DerivedMetric::RequestSizeBytes, record.request_size_bytes as f64);
    derived.insert(DerivedMetric::ResponseSizeBytes, record.response_size_bytes as f64);

    derived
}

/// Milliseconds from `from` to `to`; negative if `to` precedes `from`.
fn elapsed_ms(from: Instant, to: Instant) -> f64 {
    match to.checked_duration_since(from) {
        Some(elapsed) => elapsed.as_nanos() as f64 / 1e6,
        None => -(from.duration_since(to).as_nanos() as f64 / 1e6),
    }
}
