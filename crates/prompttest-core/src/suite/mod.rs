pub mod discovery;
pub mod filter;

use crate::errors::RunError;
use crate::model::TestCase;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Recursively merge `source` into `destination`; values from `source` win.
pub(crate) fn deep_merge(source: &Value, destination: &mut Value) {
    match (source, destination) {
        (Value::Mapping(src), Value::Mapping(dst)) => {
            for (key, value) in src {
                match dst.get_mut(key) {
                    Some(existing) if existing.is_mapping() && value.is_mapping() => {
                        deep_merge(value, existing);
                    }
                    _ => {
                        dst.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (src, dst) => *dst = src.clone(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract and validate the `tests` sequence of one suite document.
///
/// Each entry must carry `id`, `inputs` (mapping of scalars) and `criteria`;
/// ids must be unique within the file.
pub fn parse_tests(doc: &Value, path: &Path) -> Result<Vec<TestCase>, RunError> {
    let display = path.display().to_string();
    let entries = match doc.get("tests") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(seq)) => seq,
        Some(_) => {
            return Err(RunError::malformed_test_file(
                display,
                "`tests` must be a sequence",
            ))
        }
    };

    let mut seen = BTreeSet::new();
    let mut tests = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = entry
            .get("id")
            .and_then(scalar_to_string)
            .ok_or_else(|| {
                RunError::malformed_test_file(display.clone(), "test entry is missing `id`")
            })?;

        if !seen.insert(id.clone()) {
            return Err(RunError::duplicate_test_id(id, display));
        }

        let inputs_value = entry.get("inputs").ok_or_else(|| {
            RunError::malformed_test_file(
                display.clone(),
                format!("test `{}` is missing `inputs`", id),
            )
        })?;
        let mapping = inputs_value.as_mapping().ok_or_else(|| {
            RunError::malformed_test_file(
                display.clone(),
                format!("test `{}`: `inputs` must be a mapping", id),
            )
        })?;

        let mut inputs = BTreeMap::new();
        for (key, value) in mapping {
            let key = scalar_to_string(key).ok_or_else(|| {
                RunError::malformed_test_file(
                    display.clone(),
                    format!("test `{}`: input keys must be scalars", id),
                )
            })?;
            let value = scalar_to_string(value).ok_or_else(|| {
                RunError::malformed_test_file(
                    display.clone(),
                    format!("test `{}`: input `{}` must be a scalar", id, key),
                )
            })?;
            inputs.insert(key, value);
        }

        let criteria = entry
            .get("criteria")
            .and_then(scalar_to_string)
            .ok_or_else(|| {
                RunError::malformed_test_file(
                    display.clone(),
                    format!("test `{}` is missing `criteria`", id),
                )
            })?;

        tests.push(TestCase {
            id,
            inputs,
            criteria,
        });
    }
    Ok(tests)
}
