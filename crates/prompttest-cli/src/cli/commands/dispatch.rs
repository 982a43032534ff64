use super::super::args::{Cli, Command};

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Some(Command::Init(args)) => super::init::run(args),
        Some(Command::Run(args)) => super::run::run(args).await,
        // No subcommand: run everything, forwarding positional patterns.
        None => super::run::run(cli.run).await,
    }
}
