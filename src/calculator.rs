//! Calculation entry points.
//!
//! [`MetricsCalculator`] runs the whole pipeline for one call: extraction,
//! then calculation, then (when a recorder is attached) recording. Both
//! entry points return a [`Calculation`] carrying the populated record, the
//! derived metrics and the extraction error, if any. A parse error is never
//! fatal; the record keeps whatever the timestamps and sizes provide.
//!
//! ```rust
//! use std::time::Instant;
//! use tokenmeter::{CalculateOptions, EndpointKind, MetricsCalculator};
//!
//! let started = Instant::now();
//! let body = br#"{"model":"gpt-4","choices":[{"message":{"content":"hi"}}],
//!                 "usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#;
//!
//! let calculation = MetricsCalculator::new().calculate_metrics(
//!     body,
//!     &CalculateOptions::new()
//!         .request_start(started)
//!         .endpoint(EndpointKind::Completions),
//! );
//! assert!(calculation.error.is_none());
//! assert_eq!(calculation.record.model, "gpt-4");
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use crate::TokenmeterError;
use crate::calculate::calculate;
use crate::extract::extract;
use crate::recorder::MetricsRecorder;
use crate::types::{DerivedMetrics, EndpointKind, MetricsRecord};

/// Optional call-time parameters for
/// [`MetricsCalculator::calculate_metrics`].
///
/// ```rust
/// # use tokenmeter::{CalculateOptions, EndpointKind};
/// let options = CalculateOptions::new()
///     .endpoint(EndpointKind::Embeddings)
///     .request_size(512);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CalculateOptions {
    /// When the request started. Default: the time of the call.
    pub request_start: Option<Instant>,
    /// Response schema. Default: [`EndpointKind::Completions`].
    pub endpoint: Option<EndpointKind>,
    /// Request body size. Default: 0.
    pub request_size_bytes: Option<u64>,
    /// Upstream status code. Default: 200.
    pub status_code: Option<u16>,
}

impl CalculateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_start(mut self, at: Instant) -> Self {
        self.request_start = Some(at);
        self
    }

    pub fn endpoint(mut self, endpoint: EndpointKind) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn request_size(mut self, bytes: u64) -> Self {
        self.request_size_bytes = Some(bytes);
        self
    }

    pub fn status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }
}

/// Result of running the pipeline for one call.
#[derive(Debug)]
pub struct Calculation {
    /// The populated record.
    pub record: MetricsRecord,
    /// Metrics derived from `record`.
    pub derived: DerivedMetrics,
    /// Extraction error, if the body could not be decoded.
    pub error: Option<TokenmeterError>,
}

impl Calculation {
    /// Split into record, derived metrics and error.
    pub fn into_parts(self) -> (MetricsRecord, DerivedMetrics, Option<TokenmeterError>) {
        (self.record, self.derived, self.error)
    }
}

/// Extracts, calculates and optionally records metrics for API responses.
#[derive(Debug, Clone, Default)]
pub struct MetricsCalculator {
    recorder: Option<Arc<MetricsRecorder>>,
}

impl MetricsCalculator {
    /// A calculator that does not record anywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// A calculator that publishes every calculation to `recorder`.
    pub fn with_recorder(recorder: Arc<MetricsRecorder>) -> Self {
        Self {
            recorder: Some(recorder),
        }
    }

    pub fn recorder(&self) -> Option<&Arc<MetricsRecorder>> {
        self.recorder.as_ref()
    }

    /// Compute metrics for a response body that was just received.
    ///
    /// `response_start` and `response_end` are captured during this call.
    /// The first-token time defaults to `response_end` and is moved to
    /// `response_start` by extraction when the response carries content.
    pub fn calculate_metrics(&self, body: &[u8], options: &CalculateOptions) -> Calculation {
        let now = Instant::now();
        let mut record = MetricsRecord::new(options.endpoint.unwrap_or_default());
        record.request_start = Some(options.request_start.unwrap_or(now));
        record.response_start = Some(now);
        record.status_code = options.status_code.unwrap_or(200);
        record.request_size_bytes = options.request_size_bytes.unwrap_or(0);
        record.response_size_bytes = body.len() as u64;
        record.response_end = Some(Instant::now());
        record.first_token = record.response_end;

        let error = Self::extract_logged(body, &mut record);
        self.finish(record, error)
    }

    /// Compute metrics for a call whose timestamps, status and request size
    /// the caller captured. The response size is taken from `body`.
    pub fn observe(&self, mut record: MetricsRecord, body: &[u8]) -> Calculation {
        record.response_size_bytes = body.len() as u64;
        let error = Self::extract_logged(body, &mut record);
        self.finish(record, error)
    }

    fn extract_logged(body: &[u8], record: &mut MetricsRecord) -> Option<TokenmeterError> {
        let endpoint = record.endpoint;
        let error = extract(body, endpoint, record).err()?;
        warn!(%endpoint, error = %error, "failed to parse response body");
        Some(error)
    }

    fn finish(&self, record: MetricsRecord, error: Option<TokenmeterError>) -> Calculation {
        let derived = calculate(&record);
        if let Some(recorder) = &self.recorder {
            recorder.record(&record, &derived);
        }
        Calculation {
            record,
            derived,
            error,
        }
    }
}
