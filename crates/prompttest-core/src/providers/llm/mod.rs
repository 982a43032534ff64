pub mod fake;
pub mod openrouter;

use crate::model::Message;
use async_trait::async_trait;

pub use fake::FakeClient;
pub use openrouter::OpenRouterClient;

/// The single external-model capability: send role-tagged messages to a
/// model, get its text reply. Used identically for generation and judging.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        temperature: f32,
    ) -> anyhow::Result<String>;

    fn provider_name(&self) -> &'static str;
}
