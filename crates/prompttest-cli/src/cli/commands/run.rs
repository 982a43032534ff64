use crate::cli::args::RunArgs;
use crate::exit_codes;
use prompttest_core::cache::{DiskCache, CACHE_DIR};
use prompttest_core::engine::{RunOptions, Runner};
use prompttest_core::providers::llm::OpenRouterClient;
use prompttest_core::report::progress::default_progress_sink;
use prompttest_core::report::{console, markdown};
use prompttest_core::suite::discovery::{discover_suites, PROMPTTESTS_DIR};
use prompttest_core::suite::filter::{classify_patterns, SuiteFilter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub(crate) async fn run(args: RunArgs) -> anyhow::Result<i32> {
    dotenvy::dotenv().ok();
    let base = Path::new(".");

    let suites = match discover_suites(base) {
        Ok(suites) => suites,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    if suites.is_empty() {
        eprintln!("No tests found.");
        return Ok(exit_codes::SUCCESS);
    }

    let root = base.join(PROMPTTESTS_DIR);
    let rel_files: Vec<PathBuf> = suites
        .iter()
        .map(|s| {
            s.file_path
                .strip_prefix(&root)
                .unwrap_or(&s.file_path)
                .to_path_buf()
        })
        .collect();
    let (mut file_globs, mut id_globs) = classify_patterns(&rel_files, &args.patterns)?;
    file_globs.extend(args.test_file.iter().cloned());
    id_globs.extend(args.test_id.iter().cloned());
    let filter = SuiteFilter::new(&file_globs, &id_globs)?;
    let suites = filter.apply(suites, &root);
    if suites.is_empty() {
        eprintln!("No tests matched the given filters.");
        return Ok(exit_codes::SUCCESS);
    }

    let api_key = match std::env::var("OPENROUTER_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            eprintln!("Error: OPENROUTER_API_KEY not found. Please add it to your .env file.");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let client = Arc::new(OpenRouterClient::new(api_key));
    let cache = if args.no_cache {
        None
    } else {
        Some(DiskCache::new(base.join(CACHE_DIR)))
    };
    let mut options = RunOptions::default();
    if let Some(n) = args.max_concurrency {
        options.max_concurrency = n.max(1);
    }
    if let Some(secs) = args.timeout_seconds {
        options.timeout = Duration::from_secs(secs);
    }
    let runner = Runner::new(client, cache, options);

    let token = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted; abandoning in-flight tests...");
            token.cancel();
        }
    });

    let total: usize = suites.iter().map(|s| s.tests.len()).sum();
    eprintln!("Running {} tests...", total);
    let progress = default_progress_sink(total);
    let artifacts = runner.run_suites(&suites, progress).await?;

    let run_dir = markdown::create_run_directory(base)?;
    for result in &artifacts.results {
        markdown::write_report_file(result, &run_dir, base)?;
    }
    markdown::create_latest_symlink(base, &run_dir);

    for suite in &suites {
        console::print_suite_header(suite, base);
        let suite_results: Vec<_> = artifacts
            .results
            .iter()
            .filter(|r| r.suite_path == suite.file_path)
            .cloned()
            .collect();
        console::print_suite_results(&suite_results);
    }
    console::print_failures(&artifacts.results, &run_dir);
    console::print_summary(&artifacts.summary, artifacts.elapsed);

    Ok(if artifacts.summary.is_failure() {
        exit_codes::TEST_FAILURE
    } else {
        exit_codes::SUCCESS
    })
}
