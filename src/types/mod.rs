//! Public types for the Tokenmeter API.

mod derived;
mod openai;
mod record;

pub use derived::{DerivedMetric, DerivedMetrics};
pub use openai::{
    ChatCompletionChoice, ChatCompletionMessage, ChatCompletionResponse,
    CompletionTokensDetails, EmbeddingData, EmbeddingResponse, PromptTokensDetails, Usage,
};
pub use record::{EndpointKind, MetricsRecord};
