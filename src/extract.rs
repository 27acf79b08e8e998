//! Response extraction.
//!
//! A [`ResponseExtractor`] decodes an upstream response body against the
//! schema of one [`EndpointKind`] and copies model name and token usage
//! into a [`MetricsRecord`]. Extraction is all-or-nothing: the body is
//! fully decoded before any field of the record is touched, so a malformed
//! payload leaves the record exactly as it was.
//!
//! Only non-streaming responses are understood. For those the first token
//! arrives together with the response, so `first_token` is approximated by
//! `response_start`.

use reqwest::header::{CONTENT_TYPE, HeaderMap};

use crate::Result;
use crate::types::{ChatCompletionResponse, EmbeddingResponse, EndpointKind, MetricsRecord};

/// Content types that indicate a streamed response body.
const STREAMING_CONTENT_TYPES: &[&str] = &["text/event-stream", "application/x-ndjson"];

/// Decodes a response body for one endpoint kind into a metrics record.
pub trait ResponseExtractor: Send + Sync {
    /// The endpoint kind this extractor understands.
    fn kind(&self) -> EndpointKind;

    /// Decode `body` and fill model, token counts and first-token time.
    fn extract(&self, body: &[u8], record: &mut MetricsRecord) -> Result<()>;
}

/// Extractor for `/v1/chat/completions` responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatCompletionExtractor;

impl ResponseExtractor for ChatCompletionExtractor {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Completions
    }

    fn extract(&self, body: &[u8], record: &mut MetricsRecord) -> Result<()> {
        let response: ChatCompletionResponse = serde_json::from_slice(body)?;
        let has_content = response.has_content();

        record.model = response.model;
        record.prompt_tokens = response.usage.prompt_tokens;
        record.completion_tokens = response.usage.completion_tokens;
        record.total_tokens = response.usage.total_tokens;

        if has_content {
            record.first_token = record.response_start;
        }
        Ok(())
    }
}

/// Extractor for `/v1/embeddings` responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddingExtractor;

impl ResponseExtractor for EmbeddingExtractor {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Embeddings
    }

    fn extract(&self, body: &[u8], record: &mut MetricsRecord) -> Result<()> {
        let response: EmbeddingResponse = serde_json::from_slice(body)?;

        record.model = response.model;
        record.prompt_tokens = response.usage.prompt_tokens;
        record.total_tokens = response.usage.total_tokens;
        // Embeddings never generate tokens, whatever the payload claims.
        record.completion_tokens = 0;
        record.first_token = record.response_start;
        Ok(())
    }
}

impl EndpointKind {
    /// The extractor for this endpoint's response schema.
    pub fn extractor(self) -> &'static dyn ResponseExtractor {
        match self {
            EndpointKind::Completions => &ChatCompletionExtractor,
            EndpointKind::Embeddings => &EmbeddingExtractor,
        }
    }
}

/// Decode `body` as a response of `kind` into `record`.
pub fn extract(body: &[u8], kind: EndpointKind, record: &mut MetricsRecord) -> Result<()> {
    kind.extractor().extract(body, record)
}

/// Whether a `Content-Type` value denotes a streamed body (SSE or NDJSON).
///
/// Streaming responses are classified but not yet timed differently:
/// their first-token time still uses the non-streaming approximation.
pub fn is_streaming_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    STREAMING_CONTENT_TYPES
        .iter()
        .any(|streaming| content_type.contains(streaming))
}

/// Whether response headers denote a streamed body.
pub fn is_streaming_response(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_streaming_content_type)
}
