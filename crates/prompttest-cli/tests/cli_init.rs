use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn prompttest() -> Command {
    Command::cargo_bin("prompttest").expect("binary builds")
}

#[test]
fn init_scaffolds_an_example_project() {
    let dir = tempdir().unwrap();
    prompttest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    for path in [
        "prompts/customer_service.txt",
        "prompttests/prompttest.yml",
        "prompttests/main.yml",
        "prompttests/GUIDE.md",
        ".env",
        ".env.example",
        ".gitignore",
    ] {
        assert!(dir.path().join(path).exists(), "missing {}", path);
    }

    let gitignore = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert!(gitignore.contains(".prompttest_cache/"));
    assert!(gitignore.contains(".prompttest_reports/"));
    assert!(gitignore.contains(".env"));

    let prompt = fs::read_to_string(dir.path().join("prompts/customer_service.txt")).unwrap();
    assert!(prompt.contains("---[SYSTEM]---"));
    assert!(prompt.contains("{message}"));
}

#[test]
fn init_is_idempotent_and_non_destructive() {
    let dir = tempdir().unwrap();
    prompttest().current_dir(dir.path()).arg("init").assert().success();

    let suite_path = dir.path().join("prompttests/main.yml");
    fs::write(&suite_path, "# my edited suite\n").unwrap();

    prompttest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists, skipped"));

    assert_eq!(
        fs::read_to_string(&suite_path).unwrap(),
        "# my edited suite\n"
    );
}

#[test]
fn init_appends_only_missing_gitignore_entries() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".gitignore"), "node_modules/\n.env\n").unwrap();

    prompttest().current_dir(dir.path()).arg("init").assert().success();

    let gitignore = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert!(gitignore.starts_with("node_modules/\n.env\n"));
    assert!(gitignore.contains(".prompttest_cache/"));
    assert!(gitignore.contains(".prompttest_reports/"));
    assert_eq!(gitignore.matches(".env\n").count(), 1, "{:?}", gitignore);
}

#[test]
fn init_refuses_a_gitignore_directory() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join(".gitignore")).unwrap();

    prompttest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(".gitignore"));
}
