use super::LlmClient;
use crate::errors::RunError;
use crate::model::Message;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

enum Rule {
    Reply(String),
    Fail(String),
}

/// Deterministic scripted client for tests. Rules are matched against the
/// flattened message content, first match wins; unmatched calls get the
/// default reply.
pub struct FakeClient {
    rules: Vec<(String, Rule)>,
    default_reply: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl Default for FakeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default_reply: "ok".to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Reply with `reply` whenever the request contains `marker`.
    pub fn replying_on(mut self, marker: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((marker.into(), Rule::Reply(reply.into())));
        self
    }

    /// Fail with a scripted provider error whenever the request contains
    /// `marker`.
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.rules.push((
            marker.into(),
            Rule::Fail("scripted provider error".to_string()),
        ));
        self
    }

    /// Sleep before every reply (timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(
        &self,
        messages: &[Message],
        _model: &str,
        _temperature: f32,
    ) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        for (marker, rule) in &self.rules {
            if content.contains(marker.as_str()) {
                return match rule {
                    Rule::Reply(reply) => Ok(reply.clone()),
                    Rule::Fail(detail) => {
                        Err(RunError::generation(Some(500), detail.clone()).into())
                    }
                };
            }
        }
        Ok(self.default_reply.clone())
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
