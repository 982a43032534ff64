use crate::cache::{completion_key, DiskCache};
use crate::errors::RunError;
use crate::judge::JudgeService;
use crate::model::{Message, RunResult, RunSummary, Stage, TestCase, TestStatus, TestSuite};
use crate::providers::llm::LlmClient;
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::report::RunArtifacts;
use crate::template::flatten_messages;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Upper bound on test-case pipelines in flight at once.
    pub max_concurrency: usize,
    /// Per-network-call timeout (generation and judging separately).
    pub timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Runs every selected test case through render → generate → judge.
///
/// Pipelines are independent: they share no mutable state, run concurrently
/// under a semaphore, and one erroring never aborts the others. Stages
/// within a pipeline are strictly sequential.
#[derive(Clone)]
pub struct Runner {
    client: Arc<dyn LlmClient>,
    judge: JudgeService,
    cache: Option<DiskCache>,
    options: RunOptions,
    cancel: CancellationToken,
}

impl Runner {
    pub fn new(client: Arc<dyn LlmClient>, cache: Option<DiskCache>, options: RunOptions) -> Self {
        Self {
            judge: JudgeService::new(client.clone(), cache.clone()),
            client,
            cache,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Token the caller can trip (e.g. from a Ctrl-C handler) to stop
    /// dispatching new pipelines and abandon in-flight ones.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run all suites; results come back in suite-file order with tests in
    /// declaration order, regardless of completion order.
    pub async fn run_suites(
        &self,
        suites: &[TestSuite],
        progress: Option<ProgressSink>,
    ) -> anyhow::Result<RunArtifacts> {
        let started = Instant::now();
        let total: usize = suites.iter().map(|s| s.tests.len()).sum();

        let sem = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        let mut slots: Vec<Option<RunResult>> = Vec::new();
        let mut metas: Vec<(usize, usize)> = Vec::new();

        for (si, suite) in suites.iter().enumerate() {
            for (ti, tc) in suite.tests.iter().enumerate() {
                let idx = slots.len();
                slots.push(None);
                metas.push((si, ti));

                if self.cancel.is_cancelled() {
                    slots[idx] = Some(cancelled_before_start(suite, tc));
                    continue;
                }
                let permit = tokio::select! {
                    _ = self.cancel.cancelled() => {
                        slots[idx] = Some(cancelled_before_start(suite, tc));
                        continue;
                    }
                    permit = sem.clone().acquire_owned() => permit?,
                };

                let this = self.clone();
                let suite = suite.clone();
                let tc = tc.clone();
                join_set.spawn(async move {
                    let _permit = permit;
                    (idx, this.run_test(&suite, &tc).await)
                });
            }
        }

        let mut done = slots.iter().filter(|s| s.is_some()).count();
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok((idx, row)) => slots[idx] = Some(row),
                Err(e) => {
                    tracing::error!("test task failed to join: {}", e);
                }
            }
            done += 1;
            if let Some(sink) = &progress {
                sink(ProgressEvent {
                    done: done.min(total),
                    total,
                });
            }
        }

        let results: Vec<RunResult> = slots
            .into_iter()
            .zip(metas)
            .map(|(slot, (si, ti))| {
                slot.unwrap_or_else(|| {
                    // A panicked task leaves its slot empty; record it as an
                    // error outcome rather than dropping the test.
                    let suite = &suites[si];
                    let tc = &suite.tests[ti];
                    errored(suite, tc, None, RunError::other("task error"), None, None)
                })
            })
            .collect();

        let summary = RunSummary::from_results(&results);
        Ok(RunArtifacts {
            results,
            summary,
            elapsed: started.elapsed(),
        })
    }

    async fn run_test(&self, suite: &TestSuite, tc: &TestCase) -> RunResult {
        let start = Instant::now();

        // Rendering
        let messages = match suite.template.render(&tc.inputs) {
            Ok(m) => m,
            Err(e) => return errored(suite, tc, Some(Stage::Rendering), e, None, Some(start)),
        };
        let rendered = flatten_messages(&messages);

        // Generating
        let generation_model = match suite.config.generation_model.as_deref() {
            Some(m) => m,
            None => {
                return errored(
                    suite,
                    tc,
                    Some(Stage::Generating),
                    RunError::missing_config("`generation_model` is not defined"),
                    Some(rendered),
                    Some(start),
                )
            }
        };
        let (response, gen_cached) = match self
            .generate(&messages, generation_model, suite.config.temperature)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return errored(
                    suite,
                    tc,
                    Some(Stage::Generating),
                    RunError::from_anyhow(&e),
                    Some(rendered),
                    Some(start),
                )
            }
        };

        // Judging
        let evaluation_model = match suite.config.evaluation_model.as_deref() {
            Some(m) => m,
            None => {
                return errored(
                    suite,
                    tc,
                    Some(Stage::Judging),
                    RunError::missing_config("`evaluation_model` is not defined"),
                    Some(rendered),
                    Some(start),
                )
            }
        };
        let outcome = match self
            .bounded(self.judge.evaluate(&tc.criteria, &response, evaluation_model))
            .await
        {
            Ok(o) => o,
            Err(e) => {
                let mut row = errored(
                    suite,
                    tc,
                    Some(Stage::Judging),
                    RunError::from_anyhow(&e),
                    Some(rendered),
                    Some(start),
                );
                row.response = response;
                return row;
            }
        };

        RunResult {
            test_case: tc.clone(),
            suite_path: suite.file_path.clone(),
            prompt_name: suite.prompt_name.clone(),
            config: suite.config.clone(),
            status: if outcome.verdict.passed {
                TestStatus::Pass
            } else {
                TestStatus::Fail
            },
            rendered_prompt: rendered,
            response,
            evaluation: outcome.verdict.rationale,
            stage: None,
            error: None,
            duration_ms: Some(start.elapsed().as_millis() as u64),
            cached: gen_cached && outcome.cached,
        }
    }

    async fn generate(
        &self,
        messages: &[Message],
        model: &str,
        temperature: f32,
    ) -> anyhow::Result<(String, bool)> {
        let key = completion_key("generation", model, temperature, messages);
        if let Some(cache) = &self.cache {
            if let Some(text) = cache.get(&key) {
                return Ok((text, true));
            }
        }
        let text = self
            .bounded(self.client.complete(messages, model, temperature))
            .await?;
        if let Some(cache) = &self.cache {
            cache.put(&key, &text);
        }
        Ok((text, false))
    }

    /// Wrap a network stage with the configured timeout and the run's
    /// cancellation token.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(RunError::cancelled().into()),
            res = timeout(self.options.timeout, fut) => match res {
                Ok(inner) => inner,
                Err(_) => Err(RunError::timeout(self.options.timeout.as_secs()).into()),
            },
        }
    }
}

fn errored(
    suite: &TestSuite,
    tc: &TestCase,
    stage: Option<Stage>,
    error: RunError,
    rendered: Option<String>,
    start: Option<Instant>,
) -> RunResult {
    RunResult {
        test_case: tc.clone(),
        suite_path: suite.file_path.clone(),
        prompt_name: suite.prompt_name.clone(),
        config: suite.config.clone(),
        status: TestStatus::Error,
        rendered_prompt: rendered.unwrap_or_default(),
        response: String::new(),
        evaluation: String::new(),
        stage,
        error: Some(error),
        duration_ms: start.map(|s| s.elapsed().as_millis() as u64),
        cached: false,
    }
}

fn cancelled_before_start(suite: &TestSuite, tc: &TestCase) -> RunResult {
    errored(suite, tc, None, RunError::cancelled(), None, None)
}
