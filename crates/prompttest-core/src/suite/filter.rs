use crate::model::TestSuite;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

/// Split positional CLI patterns into suite-file globs and test-id globs.
///
/// A token with a YAML extension is always a file glob. A bare token that
/// matches an existing suite file (with or without extension, at any depth)
/// selects that file; anything else is treated as a test-id glob.
pub fn classify_patterns(
    rel_files: &[PathBuf],
    patterns: &[String],
) -> anyhow::Result<(Vec<String>, Vec<String>)> {
    let mut file_globs = Vec::new();
    let mut id_globs = Vec::new();

    for token in patterns {
        let has_sep = token.contains('/') || token.contains('\\');
        let lower = token.to_lowercase();
        if lower.ends_with(".yml") || lower.ends_with(".yaml") {
            file_globs.push(token.clone());
            if !has_sep {
                file_globs.push(format!("**/{}", token));
            }
            continue;
        }

        let candidates = if has_sep {
            vec![
                token.clone(),
                format!("{}.yml", token),
                format!("{}.yaml", token),
            ]
        } else {
            vec![
                token.clone(),
                format!("**/{}.yml", token),
                format!("**/{}.yaml", token),
            ]
        };

        let mut matched = false;
        for candidate in &candidates {
            let glob = Glob::new(candidate)?.compile_matcher();
            if rel_files.iter().any(|f| glob.is_match(f)) {
                matched = true;
                break;
            }
        }

        if matched {
            if has_sep {
                file_globs.push(format!("{}.yml", token));
                file_globs.push(format!("{}.yaml", token));
            } else {
                file_globs.push(format!("**/{}.yml", token));
                file_globs.push(format!("**/{}.yaml", token));
            }
        } else {
            id_globs.push(token.clone());
        }
    }

    Ok((file_globs, id_globs))
}

/// Selection filter over discovered suites: file globs match the suite path
/// relative to the prompttests root, id globs match individual test ids.
pub struct SuiteFilter {
    files: Option<GlobSet>,
    ids: Option<GlobSet>,
}

impl SuiteFilter {
    pub fn new(file_globs: &[String], id_globs: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            files: build_set(file_globs)?,
            ids: build_set(id_globs)?,
        })
    }

    /// Keep matching suites and, within them, matching tests. Suites left
    /// with no tests are dropped.
    pub fn apply(&self, suites: Vec<TestSuite>, root: &Path) -> Vec<TestSuite> {
        suites
            .into_iter()
            .filter_map(|mut suite| {
                if let Some(files) = &self.files {
                    let rel = suite
                        .file_path
                        .strip_prefix(root)
                        .unwrap_or(&suite.file_path);
                    if !files.is_match(rel) {
                        return None;
                    }
                }
                if let Some(ids) = &self.ids {
                    suite.tests.retain(|t| ids.is_match(&t.id));
                }
                if suite.tests.is_empty() {
                    None
                } else {
                    Some(suite)
                }
            })
            .collect()
    }
}

fn build_set(globs: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if globs.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        builder.add(Glob::new(glob)?);
    }
    Ok(Some(builder.build()?))
}
