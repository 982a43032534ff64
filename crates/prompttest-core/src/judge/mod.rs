mod prompt;
pub mod verdict;

pub use verdict::{parse_verdict, Verdict};

use crate::cache::{completion_key, DiskCache};
use crate::providers::llm::LlmClient;
use std::sync::Arc;

/// Judge temperature is pinned so cached verdicts stay reproducible.
const JUDGE_TEMPERATURE: f32 = 0.0;

#[derive(Debug)]
pub struct JudgeOutcome {
    pub verdict: Verdict,
    pub cached: bool,
}

/// Grades a generated response against free-text criteria with a second
/// model call. Each evaluation is an independent request; no transport
/// state is shared between test cases.
#[derive(Clone)]
pub struct JudgeService {
    client: Arc<dyn LlmClient>,
    cache: Option<DiskCache>,
}

impl JudgeService {
    pub fn new(client: Arc<dyn LlmClient>, cache: Option<DiskCache>) -> Self {
        Self { client, cache }
    }

    pub async fn evaluate(
        &self,
        criteria: &str,
        response: &str,
        model: &str,
    ) -> anyhow::Result<JudgeOutcome> {
        let messages = prompt::build_grading_prompt(criteria, response);
        let key = completion_key("judge", model, JUDGE_TEMPERATURE, &messages);

        if let Some(cache) = &self.cache {
            if let Some(raw) = cache.get(&key) {
                return Ok(JudgeOutcome {
                    verdict: parse_verdict(&raw)?,
                    cached: true,
                });
            }
        }

        let raw = self
            .client
            .complete(&messages, model, JUDGE_TEMPERATURE)
            .await?;
        if let Some(cache) = &self.cache {
            cache.put(&key, &raw);
        }
        Ok(JudgeOutcome {
            verdict: parse_verdict(&raw)?,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{RunError, RunErrorKind};
    use crate::providers::llm::FakeClient;
    use tempfile::tempdir;

    #[tokio::test]
    async fn evaluates_and_caches_the_raw_reply() {
        let dir = tempdir().unwrap();
        let client = Arc::new(
            FakeClient::new().with_default_reply("EVALUATION: PASS - criteria satisfied."),
        );
        let judge = JudgeService::new(
            client.clone(),
            Some(DiskCache::new(dir.path().join("cache"))),
        );

        let first = judge.evaluate("be kind", "hello", "m/eval").await.unwrap();
        assert!(first.verdict.passed);
        assert!(!first.cached);

        let second = judge.evaluate("be kind", "hello", "m/eval").await.unwrap();
        assert!(second.cached);
        assert_eq!(second.verdict, first.verdict);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn ambiguous_reply_is_a_judge_parse_error() {
        let client = Arc::new(FakeClient::new().with_default_reply("hmm, hard to say"));
        let judge = JudgeService::new(client, None);
        let err = judge.evaluate("be kind", "hello", "m/eval").await.unwrap_err();
        assert_eq!(RunError::from_anyhow(&err).kind, RunErrorKind::JudgeParse);
    }

    #[tokio::test]
    async fn distinct_criteria_use_distinct_cache_entries() {
        let dir = tempdir().unwrap();
        let client =
            Arc::new(FakeClient::new().with_default_reply("EVALUATION: FAIL - too terse."));
        let judge = JudgeService::new(client.clone(), Some(DiskCache::new(dir.path().into())));

        judge.evaluate("be kind", "hi", "m/eval").await.unwrap();
        judge.evaluate("be formal", "hi", "m/eval").await.unwrap();
        assert_eq!(client.call_count(), 2);
    }
}
