//! CLI module for the regulation agent
//!
//! - `serve`: HTTP API server
//! - `ask`: answer a single question and exit

pub mod ask;
pub mod serve;

use clap::{Parser, Subcommand};

/// Question answering over the Danish building regulations
#[derive(Parser)]
#[command(name = "regulation-rag-agent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Answer one question and print the result
    Ask(ask::AskArgs),
}
