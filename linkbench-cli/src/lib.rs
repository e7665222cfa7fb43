//! Support library for the linkbench CLI binary.
//!
//! Re-exports the CLI module so doctests and integration tests can exercise
//! the benchmark pipeline without forking a subprocess.

pub mod cli;
pub mod logging;
