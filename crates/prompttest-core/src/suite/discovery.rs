use super::{deep_merge, parse_tests};
use crate::errors::RunError;
use crate::model::{SuiteConfig, TestSuite};
use crate::template::PromptTemplate;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROMPTTESTS_DIR: &str = "prompttests";
pub const PROMPTS_DIR: &str = "prompts";
/// Reserved file name for shared config; never loaded as a suite.
pub const SHARED_CONFIG_FILE: &str = "prompttest.yml";

/// Discover every suite under `<base>/prompttests/`, resolve its config
/// against the shared config hierarchy, and parse its prompt template.
///
/// All loader and template errors surface here, before any network call.
pub fn discover_suites(base: &Path) -> anyhow::Result<Vec<TestSuite>> {
    let root = base.join(PROMPTTESTS_DIR);
    if !root.is_dir() {
        return Err(RunError::missing_config(format!(
            "directory `{}` not found",
            root.display()
        ))
        .into());
    }

    let mut suite_files = Vec::new();
    walk_suite_files(&root, &mut suite_files)?;

    let mut suites = Vec::new();
    for suite_file in suite_files {
        if let Some(suite) = load_suite(base, &root, &suite_file)? {
            suites.push(suite);
        }
    }
    Ok(suites)
}

fn walk_suite_files(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            walk_suite_files(&path, out)?;
        } else if is_yaml(&path)
            && path.file_name().and_then(|n| n.to_str()) != Some(SHARED_CONFIG_FILE)
        {
            out.push(path);
        }
    }
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// `prompttest.yml` files from the prompttests root down to the suite's own
/// directory, shallow first (deeper files override shallower ones).
fn shared_config_paths(root: &Path, suite_file: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut dir = suite_file.parent();
    while let Some(current) = dir {
        let candidate = current.join(SHARED_CONFIG_FILE);
        if candidate.is_file() {
            paths.push(candidate);
        }
        if current == root {
            break;
        }
        dir = current.parent();
    }
    paths.reverse();
    paths
}

fn indent_block(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("  {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_yaml(text: &str, path: &Path) -> Result<Value, RunError> {
    let mut value: Value = serde_yaml::from_str(text).map_err(|e| {
        RunError::malformed_test_file(path.display().to_string(), e.to_string())
    })?;
    value.apply_merge().map_err(|e| {
        RunError::malformed_test_file(path.display().to_string(), e.to_string())
    })?;
    Ok(value)
}

fn load_suite(base: &Path, root: &Path, suite_file: &Path) -> anyhow::Result<Option<TestSuite>> {
    let config_paths = shared_config_paths(root, suite_file);

    // Parse the suite as a single document with the shared config files
    // injected under a dummy key, so their anchors are available to the
    // suite's own entries.
    let mut prelude = String::from("__anchors__:\n");
    for config_path in &config_paths {
        let text = fs::read_to_string(config_path)?;
        prelude.push_str(&indent_block(&text));
        prelude.push('\n');
    }
    let suite_text = fs::read_to_string(suite_file)?;
    let combined = format!("{}\n{}", prelude, suite_text);
    let suite_doc = parse_yaml(&combined, suite_file)?;

    let tests = parse_tests(&suite_doc, suite_file)?;
    if tests.is_empty() {
        return Ok(None);
    }

    // Merge the config hierarchy: shallow configs first, the suite's own
    // block last, so each level overrides the one above it.
    let mut merged = Value::Mapping(Default::default());
    for config_path in &config_paths {
        let doc = parse_yaml(&fs::read_to_string(config_path)?, config_path)?;
        if let Some(block) = doc.get("config") {
            deep_merge(block, &mut merged);
        }
    }
    if let Some(block) = suite_doc.get("config") {
        deep_merge(block, &mut merged);
    }

    let config: SuiteConfig = serde_yaml::from_value(merged).map_err(|e| {
        RunError::malformed_test_file(
            suite_file.display().to_string(),
            format!("invalid config: {}", e),
        )
    })?;

    let prompt_name = config.prompt.clone().ok_or_else(|| {
        RunError::missing_config(format!(
            "suite `{}` is missing a `prompt` definition",
            suite_file.display()
        ))
    })?;

    let prompt_path = prompt_file_path(base, &prompt_name);
    if !prompt_path.exists() {
        return Err(RunError::missing_config(format!(
            "prompt file not found: {}",
            prompt_path.display()
        ))
        .with_path(prompt_path.display().to_string())
        .into());
    }
    let prompt_content = fs::read_to_string(&prompt_path)?;
    let template = PromptTemplate::parse(&prompt_content, &prompt_path.display().to_string())?;

    Ok(Some(TestSuite {
        file_path: suite_file.to_path_buf(),
        config,
        tests,
        prompt_name,
        template,
    }))
}

pub fn prompt_file_path(base: &Path, prompt_name: &str) -> PathBuf {
    base.join(PROMPTS_DIR).join(format!("{}.txt", prompt_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RunErrorKind;
    use tempfile::tempdir;

    fn write(base: &Path, rel: &str, content: &str) {
        let path = base.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scaffold(base: &Path) {
        write(base, "prompts/support.txt", "---[SYSTEM]---\nHelp {name}.");
        write(
            base,
            "prompttests/prompttest.yml",
            "config:\n  prompt: support\n  generation_model: m/gen\n  evaluation_model: m/eval\n",
        );
    }

    #[test]
    fn discovers_suites_and_merges_config_hierarchy() {
        let dir = tempdir().unwrap();
        scaffold(dir.path());
        write(
            dir.path(),
            "prompttests/main.yml",
            "tests:\n  - id: greet\n    inputs:\n      name: Jane\n    criteria: Be kind.\n",
        );
        write(
            dir.path(),
            "prompttests/sub/prompttest.yml",
            "config:\n  generation_model: m/override\n",
        );
        write(
            dir.path(),
            "prompttests/sub/extra.yml",
            "tests:\n  - id: other\n    inputs:\n      name: Kim\n    criteria: Be brief.\n",
        );

        let suites = discover_suites(dir.path()).unwrap();
        assert_eq!(suites.len(), 2);

        let main = suites
            .iter()
            .find(|s| s.file_path.ends_with("main.yml"))
            .unwrap();
        assert_eq!(main.config.generation_model.as_deref(), Some("m/gen"));
        assert_eq!(main.prompt_name, "support");

        let sub = suites
            .iter()
            .find(|s| s.file_path.ends_with("extra.yml"))
            .unwrap();
        assert_eq!(sub.config.generation_model.as_deref(), Some("m/override"));
        assert_eq!(sub.config.evaluation_model.as_deref(), Some("m/eval"));
    }

    #[test]
    fn suite_config_overrides_shared_config() {
        let dir = tempdir().unwrap();
        scaffold(dir.path());
        write(
            dir.path(),
            "prompttests/main.yml",
            "config:\n  generation_model: m/local\ntests:\n  - id: t\n    inputs:\n      name: J\n    criteria: c\n",
        );
        let suites = discover_suites(dir.path()).unwrap();
        assert_eq!(
            suites[0].config.generation_model.as_deref(),
            Some("m/local")
        );
    }

    #[test]
    fn shared_config_anchors_are_visible_to_suites() {
        let dir = tempdir().unwrap();
        write(dir.path(), "prompts/support.txt", "Help {name}.");
        write(
            dir.path(),
            "prompttests/prompttest.yml",
            "config:\n  prompt: support\n  generation_model: m/gen\n  evaluation_model: m/eval\nshared_name: &who Jane\n",
        );
        write(
            dir.path(),
            "prompttests/main.yml",
            "tests:\n  - id: t\n    inputs:\n      name: *who\n    criteria: c\n",
        );
        let suites = discover_suites(dir.path()).unwrap();
        assert_eq!(suites[0].tests[0].inputs["name"], "Jane");
    }

    #[test]
    fn missing_prompttests_directory_is_a_config_error() {
        let dir = tempdir().unwrap();
        let err = discover_suites(dir.path()).unwrap_err();
        let run_err = RunError::from_anyhow(&err);
        assert_eq!(run_err.kind, RunErrorKind::MissingConfig);
    }

    #[test]
    fn suite_without_prompt_definition_is_rejected() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "prompttests/main.yml",
            "tests:\n  - id: t\n    inputs: {}\n    criteria: c\n",
        );
        let err = discover_suites(dir.path()).unwrap_err();
        let run_err = RunError::from_anyhow(&err);
        assert_eq!(run_err.kind, RunErrorKind::MissingConfig);
        assert!(run_err.message.contains("`prompt`"));
    }

    #[test]
    fn missing_prompt_file_is_rejected() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "prompttests/main.yml",
            "config:\n  prompt: nope\ntests:\n  - id: t\n    inputs: {}\n    criteria: c\n",
        );
        let err = discover_suites(dir.path()).unwrap_err();
        let run_err = RunError::from_anyhow(&err);
        assert_eq!(run_err.kind, RunErrorKind::MissingConfig);
        assert!(run_err.message.contains("prompt file not found"));
    }

    #[test]
    fn malformed_template_surfaces_at_discovery_time() {
        let dir = tempdir().unwrap();
        write(dir.path(), "prompts/bad.txt", "---[ROBOT]---\nhi");
        write(
            dir.path(),
            "prompttests/main.yml",
            "config:\n  prompt: bad\ntests:\n  - id: t\n    inputs: {}\n    criteria: c\n",
        );
        let err = discover_suites(dir.path()).unwrap_err();
        assert_eq!(
            RunError::from_anyhow(&err).kind,
            RunErrorKind::MalformedTemplate
        );
    }

    #[test]
    fn empty_suites_and_shared_config_files_are_skipped() {
        let dir = tempdir().unwrap();
        scaffold(dir.path());
        write(dir.path(), "prompttests/empty.yml", "config: {}\n");
        let suites = discover_suites(dir.path()).unwrap();
        assert!(suites.is_empty());
    }
}
