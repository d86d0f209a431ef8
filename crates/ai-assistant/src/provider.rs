//! LLM provider trait definition

use async_trait::async_trait;

use crate::{CompletionRequest, CompletionResponse, Result};

/// A chat-completion backend.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Provider name (e.g. "openai")
    fn name(&self) -> &str;
}
