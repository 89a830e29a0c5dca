use clap::Parser;
use regulation_rag_agent::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Ask(args) => cli::ask::run(args).await,
    }
}
