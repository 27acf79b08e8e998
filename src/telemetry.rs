//! Distribution-backend instrument names.
//!
//! Instruments are emitted through the `metrics` facade. Consumers install
//! their own recorder (e.g. prometheus, see the `prometheus` feature);
//! without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! Counters end in `_total`, histograms carry their unit
//! (`_milliseconds`, `_bytes`).
//!
//! # Common labels
//!
//! - `model`: model name reported by the upstream response
//! - `endpoint`: endpoint kind: "completions" or "embeddings"
//! - `status`: upstream HTTP status code
//! - `type`: token kind: "prompt" or "completion"

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};

/// End-to-end API latency.
///
/// Labels: `model`, `endpoint`.
pub const API_LATENCY_MILLISECONDS: &str = "api_latency_milliseconds";

/// Time from request start to the first generated token.
///
/// Labels: `model`, `endpoint`.
pub const TIME_TO_FIRST_TOKEN_MILLISECONDS: &str = "time_to_first_token_milliseconds";

/// Time from request start to the upstream call being issued.
///
/// Labels: `model`, `endpoint`.
pub const PROMPT_PROCESSING_MILLISECONDS: &str = "prompt_processing_milliseconds";

/// Time from first token to response end.
///
/// Labels: `model`, `endpoint`.
pub const TOKEN_GENERATION_MILLISECONDS: &str = "token_generation_milliseconds";

/// Completion tokens per second of the most recent call.
///
/// Labels: `model`, `endpoint`.
pub const TOKENS_PER_SECOND: &str = "tokens_per_second";

/// Total upstream requests.
///
/// Labels: `model`, `endpoint`, `status`.
pub const REQUESTS_TOTAL: &str = "requests_total";

/// Total tokens processed.
///
/// Labels: `model`, `endpoint`, `type` ("prompt" | "completion").
pub const TOKENS_TOTAL: &str = "tokens_total";

/// Request body size.
///
/// Labels: `model`, `endpoint`.
pub const REQUEST_SIZE_BYTES: &str = "request_size_bytes";

/// Response body size.
///
/// Labels: `model`, `endpoint`.
pub const RESPONSE_SIZE_BYTES: &str = "response_size_bytes";

/// Name suffix shared by all latency histograms.
pub const LATENCY_SUFFIX: &str = "_milliseconds";

/// Name suffix shared by both size histograms.
pub const SIZE_SUFFIX: &str = "_size_bytes";

/// Register units and help text for every instrument with the current
/// recorder.
pub fn describe() {
    describe_histogram!(
        API_LATENCY_MILLISECONDS,
        Unit::Milliseconds,
        "API latency in milliseconds"
    );
    describe_histogram!(
        TIME_TO_FIRST_TOKEN_MILLISECONDS,
        Unit::Milliseconds,
        "Time to first token in milliseconds"
    );
    describe_histogram!(
        PROMPT_PROCESSING_MILLISECONDS,
        Unit::Milliseconds,
        "Prompt processing time in milliseconds"
    );
    describe_histogram!(
        TOKEN_GENERATION_MILLISECONDS,
        Unit::Milliseconds,
        "Token generation time in milliseconds"
    );
    describe_gauge!(TOKENS_PER_SECOND, "Tokens generated per second");
    describe_counter!(REQUESTS_TOTAL, Unit::Count, "Total number of API requests");
    describe_counter!(TOKENS_TOTAL, Unit::Count, "Total number of tokens processed");
    describe_histogram!(REQUEST_SIZE_BYTES, Unit::Bytes, "Request size in bytes");
    describe_histogram!(RESPONSE_SIZE_BYTES, Unit::Bytes, "Response size in bytes");
}
