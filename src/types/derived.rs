//! Derived metrics produced by [`calculate`](crate::calculate::calculate).

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Fixed vocabulary of derived metric keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedMetric {
    ApiLatencyMs,
    TimeToFirstTokenMs,
    PromptProcessingTimeMs,
    TokenGenerationTimeMs,
    TokensPerSecond,
    PromptTokens,
    CompletionTokens,
    TotalTokens,
    RequestSizeBytes,
    ResponseSizeBytes,
}

impl DerivedMetric {
    pub const ALL: [DerivedMetric; 10] = [
        DerivedMetric::ApiLatencyMs,
        DerivedMetric::TimeToFirstTokenMs,
        DerivedMetric::PromptProcessingTimeMs,
        DerivedMetric::TokenGenerationTimeMs,
        DerivedMetric::TokensPerSecond,
        DerivedMetric::PromptTokens,
        DerivedMetric::CompletionTokens,
        DerivedMetric::TotalTokens,
        DerivedMetric::RequestSizeBytes,
        DerivedMetric::ResponseSizeBytes,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            DerivedMetric::ApiLatencyMs => "api_latency_ms",
            DerivedMetric::TimeToFirstTokenMs => "time_to_first_token_ms",
            DerivedMetric::PromptProcessingTimeMs => "prompt_processing_time_ms",
            DerivedMetric::TokenGenerationTimeMs => "token_generation_time_ms",
            DerivedMetric::TokensPerSecond => "tokens_per_second",
            DerivedMetric::PromptTokens => "prompt_tokens",
            DerivedMetric::CompletionTokens => "completion_tokens",
            DerivedMetric::TotalTokens => "total_tokens",
            DerivedMetric::RequestSizeBytes => "request_size_bytes",
            DerivedMetric::ResponseSizeBytes => "response_size_bytes",
        }
    }
}

impl fmt::Display for DerivedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping of derived metric to value. A key is present only when its
/// inputs were available.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DerivedMetrics {
    values: BTreeMap<DerivedMetric, f64>,
}

impl DerivedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: DerivedMetric, value: f64) {
        self.values.insert(metric, value);
    }

    pub fn get(&self, metric: DerivedMetric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn contains(&self, metric: DerivedMetric) -> bool {
        self.values.contains_key(&metric)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = (DerivedMetric, f64)> + '_ {
        self.values.iter().map(|(metric, value)| (*metric, *value))
    }

    /// Flatten into string keys, e.g. for display or logging.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.iter()
            .map(|(metric, value)| (metric.as_str(), value))
            .collect()
    }
}
