use crate::model::{RunResult, RunSummary, TestStatus, TestSuite};
use crate::report::markdown::report_file_name;
use crate::suite::discovery::prompt_file_path;
use std::path::Path;
use std::time::Duration;

const MAX_FAILURE_LINES: usize = 3;

/// Truncate to `max_lines`, appending `[...]` when lines were dropped.
pub(crate) fn truncate_text(text: &str, max_lines: usize) -> String {
    let trimmed = text.trim();
    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() > max_lines {
        format!("{}\n[...]", lines[..max_lines].join("\n"))
    } else {
        trimmed.to_string()
    }
}

pub fn print_suite_header(suite: &TestSuite, base: &Path) {
    eprintln!();
    eprintln!("Test File:        {}", suite.file_path.display());
    eprintln!(
        "Prompt File:      {}",
        prompt_file_path(base, &suite.prompt_name).display()
    );
    eprintln!(
        "Generation Model: {}",
        suite.config.generation_model.as_deref().unwrap_or("N/A")
    );
    eprintln!(
        "Evaluation Model: {}",
        suite.config.evaluation_model.as_deref().unwrap_or("N/A")
    );
}

pub fn print_suite_results(results: &[RunResult]) {
    eprintln!();
    for r in results {
        let cached_tag = if r.cached { " (cached)" } else { "" };
        match r.status {
            TestStatus::Pass => eprintln!("✅ PASS: {}{}", r.test_case.id, cached_tag),
            TestStatus::Fail => eprintln!("❌ FAIL: {}{}", r.test_case.id, cached_tag),
            TestStatus::Error => {
                let cause = r
                    .error
                    .as_ref()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "unknown error".into());
                eprintln!("💥 ERROR: {}: {}", r.test_case.id, cause);
            }
        }
    }
}

/// One details block per non-passing test: criteria, response and rationale
/// truncated to a few lines, plus the path to the full report.
pub fn print_failures(results: &[RunResult], run_dir: &Path) {
    for r in results.iter().filter(|r| !r.passed()) {
        eprintln!();
        match r.status {
            TestStatus::Error => {
                let stage = r.stage.map(|s| s.as_str()).unwrap_or("Pending");
                let cause = r
                    .error
                    .as_ref()
                    .map(|e| e.message.clone())
                    .unwrap_or_default();
                eprintln!("💥 {}", r.test_case.id);
                eprintln!("    Stage:       {}", stage);
                eprintln!("    Cause:       {}", cause);
            }
            _ => {
                eprintln!("❌ {}", r.test_case.id);
                eprintln!(
                    "    Criteria:    {}",
                    truncate_text(&r.test_case.criteria, MAX_FAILURE_LINES)
                );
                eprintln!(
                    "    Response:    {}",
                    truncate_text(&r.response, MAX_FAILURE_LINES)
                );
                eprintln!(
                    "    Evaluation:  {}",
                    truncate_text(&r.evaluation, MAX_FAILURE_LINES)
                );
            }
        }
        eprintln!(
            "    Full Report: {}",
            run_dir.join(report_file_name(r)).display()
        );
    }
}

pub fn print_summary(summary: &RunSummary, elapsed: Duration) {
    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let errored = if summary.errored > 0 {
        format!(", {} errored", summary.errored)
    } else {
        String::new()
    };
    eprintln!(
        "{} failed, {} passed{} in {:.2}s",
        summary.failed,
        summary.passed,
        errored,
        elapsed.as_secs_f64()
    );
}
