use crate::model::{RunResult, TestStatus};
use crate::suite::discovery::prompt_file_path;
use chrono::Local;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const REPORTS_DIR: &str = ".prompttest_reports";

/// Create `<base>/.prompttest_reports/<timestamp>/` for this run.
pub fn create_run_directory(base: &Path) -> anyhow::Result<PathBuf> {
    let reports = base.join(REPORTS_DIR);
    fs::create_dir_all(&reports)?;
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let mut run_dir = reports.join(&timestamp);
    // Two runs inside the same second get a numeric suffix.
    let mut n = 1;
    while run_dir.exists() {
        run_dir = reports.join(format!("{}_{}", timestamp, n));
        n += 1;
    }
    fs::create_dir(&run_dir)?;
    Ok(run_dir)
}

/// Point `<reports>/latest` at the most recent run directory. Best-effort:
/// a symlink failure is a warning, not an error.
pub fn create_latest_symlink(base: &Path, run_dir: &Path) {
    let latest = base.join(REPORTS_DIR).join("latest");
    let _ = fs::remove_file(&latest);

    #[cfg(unix)]
    {
        if let Some(name) = run_dir.file_name() {
            if let Err(e) = std::os::unix::fs::symlink(name, &latest) {
                tracing::warn!(
                    "could not create latest symlink to {}: {}",
                    run_dir.display(),
                    e
                );
            }
        }
    }
    #[cfg(not(unix))]
    {
        tracing::warn!(
            "latest symlink not supported on this platform (run dir: {})",
            run_dir.display()
        );
    }
}

/// Lexical relative path from `start` to `target`, POSIX-style slashes, for
/// markdown links that open from the report directory.
fn md_rel_path(target: &Path, start: &Path) -> String {
    let t: Vec<Component<'_>> = target.components().collect();
    let s: Vec<Component<'_>> = start.components().collect();
    let common = t
        .iter()
        .zip(s.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<String> = vec!["..".to_string(); s.len() - common];
    parts.extend(t[common..].iter().map(|c| c.as_os_str().to_string_lossy().into_owned()));
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

pub fn report_file_name(result: &RunResult) -> String {
    let suite_stem = result
        .suite_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "suite".to_string());
    format!("{}-{}.md", suite_stem, result.test_case.id)
}

/// Write the detailed markdown artifact for a single test result.
pub fn write_report_file(result: &RunResult, run_dir: &Path, base: &Path) -> anyhow::Result<PathBuf> {
    let report_path = run_dir.join(report_file_name(result));

    let (status_emoji, status_text) = match result.status {
        TestStatus::Pass => ("✅", "Pass"),
        TestStatus::Fail => ("❌", "Failure"),
        TestStatus::Error => ("💥", "Error"),
    };

    let prompt_path = prompt_file_path(base, &result.prompt_name);
    let test_file_link = md_rel_path(&result.suite_path, run_dir);
    let prompt_file_link = md_rel_path(&prompt_path, run_dir);

    let mut content = format!(
        "# {status_emoji} Test {status_text} Report: `{id}`\n\
         \n\
         - **Test File**: [{suite}]({test_link})\n\
         - **Prompt File**: [{prompt}]({prompt_link})\n\
         - **Generation Model**: `{gen}`\n\
         - **Evaluation Model**: `{eval}`\n\
         \n\
         ## Request (Prompt + Values)\n\
         ```text\n\
         {rendered}\n\
         ```\n\
         \n\
         ## Criteria\n\
         > {criteria}\n\
         \n\
         ## Response\n\
         {response}\n\
         \n\
         ## Evaluation\n\
         > {evaluation}\n",
        id = result.test_case.id,
        suite = result.suite_path.display(),
        test_link = test_file_link,
        prompt = prompt_path.display(),
        prompt_link = prompt_file_link,
        gen = result.config.generation_model.as_deref().unwrap_or("N/A"),
        eval = result.config.evaluation_model.as_deref().unwrap_or("N/A"),
        rendered = result.rendered_prompt.trim(),
        criteria = result.test_case.criteria.trim(),
        response = result.response.trim(),
        evaluation = result.evaluation.trim(),
    );

    if let Some(error) = &result.error {
        let stage = result.stage.map(|s| s.as_str()).unwrap_or("Pending");
        content.push_str(&format!("\n## Error\n> {}: {}\n", stage, error));
    }

    fs::write(&report_path, content)?;
    Ok(report_path)
}
