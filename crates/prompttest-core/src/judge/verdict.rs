use crate::errors::RunError;

/// A parsed judge verdict. An ambiguous judge reply is a `JudgeParse` error,
/// never a failing verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub rationale: String,
}

/// Interpret a raw judge reply. Pure and idempotent: the same reply always
/// yields the same verdict or the same error.
pub fn parse_verdict(text: &str) -> Result<Verdict, RunError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RunError::judge_parse("judge returned an empty reply"));
    }

    let last_line = trimmed.lines().last().unwrap_or_default();
    if last_line.contains("EVALUATION: PASS") {
        return Ok(Verdict {
            passed: true,
            rationale: last_line.replace("EVALUATION: PASS -", "").trim().to_string(),
        });
    }
    if last_line.contains("EVALUATION: FAIL") {
        return Ok(Verdict {
            passed: false,
            rationale: last_line.replace("EVALUATION: FAIL -", "").trim().to_string(),
        });
    }
    Err(RunError::judge_parse(format!(
        "no verdict line in reply: {}",
        trimmed
    )))
}
