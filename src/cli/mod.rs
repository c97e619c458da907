//! CLI module
//!
//! One subcommand for now: `serve`, which runs the HTTP API server.

pub mod serve;

use clap::{Parser, Subcommand};

/// Chainflow - chained AI workflow execution engine
#[derive(Parser)]
#[command(name = "chainflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,
}
