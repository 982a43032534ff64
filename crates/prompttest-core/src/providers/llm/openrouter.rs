use super::LlmClient;
use crate::errors::RunError;
use crate::model::Message;
use async_trait::async_trait;
use serde_json::json;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Chat-completions client for the OpenRouter API.
pub struct OpenRouterClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENROUTER_BASE_URL.to_string())
    }

    /// Point the client at a different endpoint (tests, proxies).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        temperature: f32,
    ) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": model,
            "messages": messages
                .iter()
                .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
                .collect::<Vec<_>>(),
            "temperature": temperature,
        });

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RunError::generation(None, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(RunError::generation(Some(status.as_u16()), error_text).into());
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RunError::generation(None, e.to_string()))?;

        // An empty or content-less reply is treated as an empty response,
        // not an error; the judge decides what to make of it.
        let text = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}
