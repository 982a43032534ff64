use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunErrorKind {
    MalformedTemplate,
    MissingVariable,
    MalformedTestFile,
    DuplicateTestId,
    MissingConfig,
    Generation,
    JudgeParse,
    Timeout,
    Cancelled,
    Other,
}

impl RunErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunErrorKind::MalformedTemplate => "malformed_template",
            RunErrorKind::MissingVariable => "missing_variable",
            RunErrorKind::MalformedTestFile => "malformed_test_file",
            RunErrorKind::DuplicateTestId => "duplicate_test_id",
            RunErrorKind::MissingConfig => "missing_config",
            RunErrorKind::Generation => "generation",
            RunErrorKind::JudgeParse => "judge_parse",
            RunErrorKind::Timeout => "timeout",
            RunErrorKind::Cancelled => "cancelled",
            RunErrorKind::Other => "other",
        }
    }
}

/// Structured pipeline error: a stable kind plus contextual fields.
///
/// Kinds detected before any network call (template, loader) abort the
/// affected suite; provider kinds are per-test and isolated by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RunError {
    pub kind: RunErrorKind,
    pub message: String,
    pub path: Option<String>,
    pub status: Option<u16>,
    pub detail: Option<String>,
}

impl RunError {
    pub fn new(kind: RunErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            status: None,
            detail: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn malformed_template(tag: impl Display, path: impl Into<String>) -> Self {
        Self::new(
            RunErrorKind::MalformedTemplate,
            format!("malformed template: unknown section tag `{}`", tag),
        )
        .with_path(path)
    }

    pub fn missing_variable(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            RunErrorKind::MissingVariable,
            format!("missing variable `{}` for placeholder", name),
        )
        .with_detail(name)
    }

    pub fn malformed_test_file(path: impl Into<String>, detail: impl Into<String>) -> Self {
        let path = path.into();
        let detail = detail.into();
        Self::new(
            RunErrorKind::MalformedTestFile,
            format!("malformed test file {}: {}", path, detail),
        )
        .with_path(path)
        .with_detail(detail)
    }

    pub fn duplicate_test_id(id: impl Into<String>, path: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(
            RunErrorKind::DuplicateTestId,
            format!("duplicate test id `{}`", id),
        )
        .with_path(path)
        .with_detail(id)
    }

    pub fn missing_config(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(RunErrorKind::MissingConfig, detail.clone()).with_detail(detail)
    }

    pub fn generation(status: Option<u16>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let mut err = Self::new(
            RunErrorKind::Generation,
            format!("model call failed: {}", detail),
        )
        .with_detail(detail);
        if let Some(status) = status {
            err = err.with_status(status);
        }
        err
    }

    pub fn judge_parse(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(
            RunErrorKind::JudgeParse,
            format!("could not parse judge verdict: {}", detail),
        )
        .with_detail(detail)
    }

    pub fn timeout(seconds: u64) -> Self {
        Self::new(
            RunErrorKind::Timeout,
            format!("timed out after {}s", seconds),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(RunErrorKind::Cancelled, "cancelled")
    }

    pub fn other(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(RunErrorKind::Other, detail.clone()).with_detail(detail)
    }

    /// Recover the structured error from an `anyhow` chain, falling back to
    /// an `Other` wrapper around the rendered message.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(run_err) = err.downcast_ref::<RunError>() {
            return run_err.clone();
        }
        Self::other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{RunError, RunErrorKind};

    #[test]
    fn typed_constructors_capture_stable_fields() {
        let err = RunError::missing_variable("name");
        assert_eq!(err.kind, RunErrorKind::MissingVariable);
        assert_eq!(err.detail.as_deref(), Some("name"));
        assert!(err.message.contains("`name`"));

        let err = RunError::generation(Some(503), "upstream unavailable");
        assert_eq!(err.kind, RunErrorKind::Generation);
        assert_eq!(err.status, Some(503));

        let err = RunError::duplicate_test_id("check-greeting", "prompttests/main.yml");
        assert_eq!(err.kind, RunErrorKind::DuplicateTestId);
        assert_eq!(err.path.as_deref(), Some("prompttests/main.yml"));
    }

    #[test]
    fn from_anyhow_roundtrips_structured_errors() {
        let original = RunError::timeout(60);
        let chained: anyhow::Error = original.clone().into();
        assert_eq!(RunError::from_anyhow(&chained), original);
    }

    #[test]
    fn from_anyhow_wraps_free_form_errors() {
        let err = RunError::from_anyhow(&anyhow::anyhow!("boom"));
        assert_eq!(err.kind, RunErrorKind::Other);
        assert_eq!(err.message, "boom");
    }
}
