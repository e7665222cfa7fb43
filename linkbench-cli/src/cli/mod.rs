//! Command-line interface orchestration for the linkbench harness.
//!
//! Offers a single `run` command that measures the best-of-R latency of a
//! linkage variant over a condensed distance matrix drawn at random or
//! loaded once from a text file.

mod commands;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, FileArgs, MethodArg, RandomArgs, RunCommand,
    RunSource, render_summary, run_cli,
};

#[cfg(test)]
mod tests;
