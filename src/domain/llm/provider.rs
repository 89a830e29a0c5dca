use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Single request/response language model call
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
