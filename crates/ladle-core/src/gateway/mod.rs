//! Outbound adapters: text generation and embedding providers.
//!
//! The lifecycle manager and search engine talk to these traits only; the
//! OpenAI-compatible HTTP client in [`openai`] is the production
//! implementation, and tests substitute scripted fakes.

pub mod openai;

use async_trait::async_trait;

use crate::error::CoreError;

pub use openai::{OpenAiConfig, OpenAiGateway};

/// A chat-completion text generator.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Provider name for log fields.
    fn name(&self) -> &str;

    /// Run one completion and return the raw assistant message text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, CoreError>;
}

/// A text-to-vector embedding provider.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one input text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError>;
}
