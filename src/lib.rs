//! Tokenmeter - performance metrics for LLM API responses
//!
//! Derives latency, time-to-first-token and token throughput from
//! OpenAI-compatible chat-completion and embedding responses, and publishes
//! them to two backends:
//!
//! - a distribution backend (histograms, counters, gauges labeled by model
//!   and endpoint) through the `metrics` facade, for dashboards and alerts;
//! - a lightweight backend of named per-(model, endpoint) scalars in a
//!   [`VarRegistry`], for quick runtime inspection.
//!
//! The pipeline for one call is extraction ([`extract`]), calculation
//! ([`calculate`]) and recording ([`MetricsRecorder`]), tied together by
//! [`MetricsCalculator`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tokenmeter::{Config, EndpointKind, MetricsCalculator, MetricsRecord, MetricsRecorder};
//!
//! # fn main() -> tokenmeter::Result<()> {
//! let recorder = Arc::new(MetricsRecorder::new(&Config::default())?);
//! let calculator = MetricsCalculator::with_recorder(Arc::clone(&recorder));
//!
//! // Captured by the code that forwards the request upstream.
//! let mut record = MetricsRecord::begin(EndpointKind::Embeddings);
//! record.mark_response_start();
//! let body = br#"{"model":"text-embedding-3-small","data":[],
//!                 "usage":{"prompt_tokens":8,"total_tokens":8}}"#;
//! record.status_code = 200;
//! record.mark_response_end();
//!
//! let calculation = calculator.observe(record, body);
//! assert!(calculation.error.is_none());
//!
//! let vars = recorder.vars().expect("lightweight backend").snapshot()?;
//! assert_eq!(vars["requests_text-embedding-3-small_embeddings"], 1);
//! # Ok(())
//! # }
//! ```

pub mod calculate;
pub mod calculator;
pub mod config;
pub mod error;
#[cfg(feature = "prometheus")]
pub mod exporter;
pub mod extract;
pub mod recorder;
pub mod telemetry;
pub mod types;
pub mod vars;
mod version;

// Re-export main types at crate root
pub use calculate::calculate;
pub use calculator::{CalculateOptions, Calculation, MetricsCalculator};
pub use config::{Config, HistogramConfig, ServiceConfig};
pub use error::{Result, TokenmeterError};
pub use extract::{
    ChatCompletionExtractor, EmbeddingExtractor, ResponseExtractor, extract,
    is_streaming_content_type, is_streaming_response,
};
pub use recorder::{Backend, DistributionBackend, LightweightBackend, MetricsRecorder};
pub use vars::{Var, VarRegistry};
pub use version::{PKG_VERSION, version_string};

// Re-export all types
pub use types::{
    ChatCompletionChoice, ChatCompletionMessage, ChatCompletionResponse, CompletionTokensDetails,
    DerivedMetric, DerivedMetrics, EmbeddingData, EmbeddingResponse, EndpointKind, MetricsRecord,
    PromptTokensDetails, Usage,
};
