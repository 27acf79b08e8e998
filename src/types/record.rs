//! Per-call metrics record.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{Result, TokenmeterError};

/// The API surface a call was made against. Selects the extraction schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    #[default]
    Completions,
    Embeddings,
}

impl EndpointKind {
    /// All known endpoint kinds.
    pub const ALL: [EndpointKind; 2] = [EndpointKind::Completions, EndpointKind::Embeddings];

    /// Label value used by both metrics backends.
    pub const fn as_str(self) -> &'static str {
        match self {
            EndpointKind::Completions => "completions",
            EndpointKind::Embeddings => "embeddings",
        }
    }

    /// Upstream request path for this endpoint.
    pub const fn upstream_path(self) -> &'static str {
        match self {
            EndpointKind::Completions => "/v1/chat/completions",
            EndpointKind::Embeddings => "/v1/embeddings",
        }
    }

    /// Resolve an endpoint kind from an upstream request path.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| path.trim_end_matches('/') == kind.upstream_path())
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointKind {
    type Err = TokenmeterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "completions" => Ok(EndpointKind::Completions),
            "embeddings" => Ok(EndpointKind::Embeddings),
            other => Err(TokenmeterError::InvalidInput(format!(
                "unknown endpoint kind: {other}"
            ))),
        }
    }
}

/// Timing, size and usage data for a single upstream call.
///
/// Timestamps are `None` until captured. When set they are expected to be
/// ordered `request_start <= response_start <= first_token <= response_end`,
/// but nothing here enforces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsRecord {
    /// When the handler received the client request.
    pub request_start: Option<Instant>,
    /// When the upstream call was issued.
    pub response_start: Option<Instant>,
    /// When the first generated token became available.
    pub first_token: Option<Instant>,
    /// When the upstream response was fully read.
    pub response_end: Option<Instant>,
    pub model: String,
    pub endpoint: EndpointKind,
    pub status_code: u16,
    pub prompt_tokens: u64,
    /// Always 0 for embeddings.
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub request_size_bytes: u64,
    pub response_size_bytes: u64,
}

impl MetricsRecord {
    /// Create an empty record for the given endpoint.
    pub fn new(endpoint: EndpointKind) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    /// Create a record with `request_start` set to now.
    pub fn begin(endpoint: EndpointKind) -> Self {
        Self {
            request_start: Some(Instant::now()),
            ..Self::new(endpoint)
        }
    }

    /// Capture `response_start` as now.
    pub fn mark_response_start(&mut self) {
        self.response_start = Some(Instant::now());
    }

    /// Capture `response_end` as now.
    pub fn mark_response_end(&mut self) {
        self.response_end = Some(Instant::now());
    }

    /// Key indexing per-(model, endpoint) state in the lightweight backend.
    pub fn composite_key(&self) -> String {
        format!("{}_{}", self.model, self.endpoint)
    }

    /// Whether the upstream answered with an error status.
    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }
}
