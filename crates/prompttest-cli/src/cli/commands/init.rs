use crate::cli::args::InitArgs;
use crate::exit_codes;
use crate::templates;
use std::fs;
use std::path::Path;

const GITIGNORE_ENTRIES: &[(&str, &str)] = &[
    ("# prompttest cache", ".prompttest_cache/"),
    ("# Test reports", ".prompttest_reports/"),
    ("# Environment variables", ".env"),
];

/// Scaffold an example project. Idempotent and non-destructive: existing
/// files are never overwritten, `.gitignore` only gains missing entries.
pub fn run(_args: InitArgs) -> anyhow::Result<i32> {
    let gitignore = Path::new(".gitignore");
    if gitignore.is_dir() {
        eprintln!(
            "Error: '.gitignore' exists but it is a directory. \
             Please remove or rename it and run init again."
        );
        return Ok(exit_codes::CONFIG_ERROR);
    }

    println!("Initializing prompttest project...");
    println!();

    let files: &[(&str, &str, &str)] = &[
        (
            "prompts/customer_service.txt",
            templates::PROMPT_CUSTOMER_SERVICE,
            "Example prompt template",
        ),
        (
            "prompttests/prompttest.yml",
            templates::GLOBAL_CONFIG_YML,
            "Global configuration",
        ),
        (
            "prompttests/main.yml",
            templates::MAIN_SUITE_YML,
            "Example test suite",
        ),
        (
            "prompttests/GUIDE.md",
            templates::GUIDE_MD,
            "Quick-start guide",
        ),
        (".env", templates::ENV_TEMPLATE, "Local environment (DO NOT COMMIT)"),
        (".env.example", templates::ENV_TEMPLATE, "Environment variable template"),
    ];

    for (path, content, description) in files {
        let status = write_file_if_missing(Path::new(path), content)?;
        println!("  - {:<32} {:<40} ({})", path, description, status);
    }

    let status = update_gitignore(gitignore)?;
    println!(
        "  - {:<32} {:<40} ({})",
        ".gitignore", "Files for Git to ignore", status
    );

    println!();
    println!("Next steps:");
    println!("  1. Get an OpenRouter API key: https://openrouter.ai/keys");
    println!("  2. Put it in .env as OPENROUTER_API_KEY=your_key_here");
    println!("  3. Run `prompttest` to see the example tests run.");
    println!("  4. See prompttests/GUIDE.md for details.");

    Ok(exit_codes::SUCCESS)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<&'static str> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok("exists, skipped")
    } else {
        fs::write(path, content)?;
        Ok("created")
    }
}

/// Append only the entries `.gitignore` is missing, preserving what's there.
fn update_gitignore(path: &Path) -> anyhow::Result<&'static str> {
    let was_new = !path.exists();
    let existing = if was_new {
        String::new()
    } else {
        fs::read_to_string(path)?
    };
    let existing_lines: std::collections::BTreeSet<&str> = existing.lines().collect();

    let mut blocks = Vec::new();
    for (comment, entry) in GITIGNORE_ENTRIES {
        if !existing_lines.contains(entry) {
            blocks.push(format!("{}\n{}", comment, entry));
        }
    }
    if blocks.is_empty() {
        return Ok("exists, skipped");
    }

    let mut out = existing.clone();
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push_str(if out.ends_with('\n') { "\n" } else { "\n\n" });
    }
    out.push_str(&blocks.join("\n\n"));
    out.push('\n');
    fs::write(path, out)?;

    Ok(if was_new { "created" } else { "updated" })
}
