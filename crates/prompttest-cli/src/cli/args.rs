use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "prompttest",
    version,
    about = "An automated testing framework for LLM prompts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// Bare invocation runs all discovered tests; leftover positional
    /// patterns behave like `run`'s.
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand)]
pub enum Command {
    /// Discover and run tests under `prompttests/`
    Run(RunArgs),
    /// Scaffold an example prompttest project in the current directory
    Init(InitArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Positional filters: suite-file globs (e.g. sub/*.yml) or test-id
    /// globs (e.g. check-*)
    pub patterns: Vec<String>,

    /// Filter suite files (globs) under `prompttests/`. Repeatable.
    #[arg(long)]
    pub test_file: Vec<String>,

    /// Filter test ids by glob. Repeatable.
    #[arg(long)]
    pub test_id: Vec<String>,

    /// Cap the number of test cases executed concurrently
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Per-network-call timeout in seconds
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Bypass the response cache for this run
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InitArgs {}
