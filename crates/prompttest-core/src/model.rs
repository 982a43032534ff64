use crate::errors::RunError;
use crate::template::PromptTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Role tag of a prompt section / chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged message of a rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Resolved configuration for a suite after merging the shared config
/// hierarchy with the suite's own `config` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub prompt: Option<String>,
    pub generation_model: Option<String>,
    pub evaluation_model: Option<String>,
    pub temperature: f32,
}

/// One named combination of input values and a natural-language criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub id: String,
    pub inputs: BTreeMap<String, String>,
    pub criteria: String,
}

/// A parsed suite file: its resolved config, its tests, and the prompt
/// template they all render against.
#[derive(Debug, Clone)]
pub struct TestSuite {
    pub file_path: PathBuf,
    pub config: SuiteConfig,
    pub tests: Vec<TestCase>,
    pub prompt_name: String,
    pub template: PromptTemplate,
}

/// Pipeline stage a test case was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rendering,
    Generating,
    Judging,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Rendering => "Rendering",
            Stage::Generating => "Generating",
            Stage::Judging => "Judging",
        }
    }
}

/// Terminal status of one test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Pass,
    Fail,
    Error,
}

/// The recorded outcome of executing one test case's full pipeline.
///
/// Immutable after creation; owned by the run coordinator and handed to the
/// report layer as-is.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub test_case: TestCase,
    pub suite_path: PathBuf,
    pub prompt_name: String,
    pub config: SuiteConfig,
    pub status: TestStatus,
    /// Flattened rendered prompt (empty when rendering failed).
    pub rendered_prompt: String,
    pub response: String,
    /// Judge rationale (empty when the pipeline errored before judging).
    pub evaluation: String,
    /// Stage the pipeline was in when it errored. None for a completed test,
    /// or for a test cancelled before it was dispatched.
    pub stage: Option<Stage>,
    pub error: Option<RunError>,
    pub duration_ms: Option<u64>,
    pub cached: bool,
}

impl RunResult {
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Pass
    }
}

/// Aggregate counts over one invocation's results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn from_results(results: &[RunResult]) -> Self {
        let mut summary = Self::default();
        for r in results {
            match r.status {
                TestStatus::Pass => summary.passed += 1,
                TestStatus::Fail => summary.failed += 1,
                TestStatus::Error => summary.errored += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored
    }

    /// True when the invocation as a whole should report failure.
    pub fn is_failure(&self) -> bool {
        self.failed > 0 || self.errored > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(status: TestStatus) -> RunResult {
        RunResult {
            test_case: TestCase {
                id: "t".into(),
                inputs: BTreeMap::new(),
                criteria: "c".into(),
            },
            suite_path: PathBuf::from("prompttests/main.yml"),
            prompt_name: "p".into(),
            config: SuiteConfig::default(),
            status,
            rendered_prompt: String::new(),
            response: String::new(),
            evaluation: String::new(),
            stage: None,
            error: None,
            duration_ms: None,
            cached: false,
        }
    }

    #[test]
    fn summary_counts_by_status() {
        let results = vec![
            result_with(TestStatus::Pass),
            result_with(TestStatus::Pass),
            result_with(TestStatus::Fail),
            result_with(TestStatus::Error),
        ];
        let s = RunSummary::from_results(&results);
        assert_eq!(s.passed, 2);
        assert_eq!(s.failed, 1);
        assert_eq!(s.errored, 1);
        assert_eq!(s.total(), 4);
        assert!(s.is_failure());
    }

    #[test]
    fn summary_all_passed_is_not_failure() {
        let results = vec![result_with(TestStatus::Pass)];
        assert!(!RunSummary::from_results(&results).is_failure());
    }
}
