//! Command implementations and argument parsing for the linkbench CLI.
//!
//! A run is strictly linear: configure, acquire input, dispatch, measure R
//! repeats, report. Any failure aborts the run and propagates unmodified.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use linkbench_core::{
    CondensedMatrix, DispatchError, MeasureError, SourceError, Variant, best_of, best_time_millis,
    render_best_time,
};
use rand::{SeedableRng, rngs::SmallRng};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

const DEFAULT_SIZE: usize = 100;
const DEFAULT_RANDOM_REPEATS: usize = 1_000;
const DEFAULT_FILE_REPEATS: usize = 10;
const DEFAULT_RULE: &str = "ward";

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "linkbench",
    about = "Measure best-case linkage latency over a pairwise distance matrix."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Execute one benchmark run and print the best time in milliseconds.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Number of timed repeats; the minimum over all repeats is reported.
    /// Defaults to 1000 for random input and 10 for file input.
    #[arg(long, env = "BENCH_REPEATS")]
    pub repeats: Option<usize>,

    /// Linkage rule forwarded to the clustering routine; ignored by `mst`.
    #[arg(long, env = "BENCH_RULE", default_value = DEFAULT_RULE)]
    pub rule: String,

    /// Algorithm variant computing the linkage.
    #[arg(long, env = "BENCH_METHOD", value_enum, default_value_t = MethodArg::Generic)]
    pub method: MethodArg,

    /// Seed for random matrix generation; fresh entropy when omitted.
    #[arg(long, env = "BENCH_SEED")]
    pub seed: Option<u64>,

    /// Distance-matrix source configuration.
    #[command(subcommand)]
    pub source: RunSource,
}

/// Distance-matrix sources supported by the harness.
#[derive(Debug, Subcommand, Clone)]
pub enum RunSource {
    /// Draw a fresh uniform random matrix before every timed repeat.
    Random(RandomArgs),
    /// Load one matrix from a text file and reuse it for every repeat.
    File(FileArgs),
}

/// Random-generation arguments.
#[derive(Debug, Args, Clone)]
pub struct RandomArgs {
    /// Number of observations being clustered.
    #[arg(long, env = "BENCH_SIZE", default_value_t = DEFAULT_SIZE)]
    pub size: usize,
}

/// File-input arguments.
#[derive(Debug, Args, Clone)]
pub struct FileArgs {
    /// Path to a file holding the observation count on its first line and
    /// whitespace-separated distances on the remaining lines.
    pub path: PathBuf,
}

/// Algorithm variants selectable on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    /// Minimum-spanning-tree single linkage.
    Mst,
    /// Nearest-neighbour-chain linkage.
    Chain,
    /// Generic priority-queue linkage.
    Generic,
}

impl MethodArg {
    const fn into_variant(self) -> Variant {
        match self {
            Self::Mst => Variant::Mst,
            Self::Chain => Variant::Chain,
            Self::Generic => Variant::Generic,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while opening the distance input.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Distance-matrix acquisition failed.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Variant or rule resolution failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// The timed execution loop failed.
    #[error(transparent)]
    Measure(#[from] MeasureError),
}

/// Summarises the outcome of one benchmark run.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Number of observations clustered per invocation.
    pub observations: usize,
    /// Number of timed repeats performed.
    pub repeats: usize,
    /// Variant that was measured.
    pub variant: Variant,
    /// Minimum observed invocation time.
    pub best: Duration,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when configuration, input acquisition, dispatch, or
/// measurement fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use linkbench_cli::cli::{Cli, Command, FileArgs, MethodArg, RunCommand, RunSource, run_cli};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "3\n0.1 0.2 0.3\n")?;
/// let cli = Cli {
///     command: Command::Run(RunCommand {
///         repeats: Some(2),
///         rule: "single".to_owned(),
///         method: MethodArg::Chain,
///         seed: None,
///         source: RunSource::File(FileArgs {
///             path: file.path().to_path_buf(),
///         }),
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.observations, 3);
/// assert_eq!(summary.repeats, 2);
/// # Ok(())
/// # }
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(method = field::Empty, rule = field::Empty, source = field::Empty),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let RunCommand {
        repeats,
        rule,
        method,
        seed,
        source,
    } = command;
    let variant = method.into_variant();
    let span = Span::current();
    span.record("method", field::display(variant));
    span.record("rule", field::display(&rule));

    let summary = match source {
        RunSource::Random(args) => {
            span.record("source", field::display("random"));
            run_random(
                &rule,
                variant,
                repeats.unwrap_or(DEFAULT_RANDOM_REPEATS),
                seed,
                args,
            )?
        }
        RunSource::File(args) => {
            span.record("source", field::display("file"));
            run_file(&rule, variant, repeats.unwrap_or(DEFAULT_FILE_REPEATS), args)?
        }
    };

    info!(
        observations = summary.observations,
        repeats = summary.repeats,
        variant = %summary.variant,
        best_ms = best_time_millis(summary.best),
        "benchmark completed"
    );
    Ok(summary)
}

#[instrument(
    name = "cli.run_random",
    err,
    skip_all,
    fields(observations = field::Empty, repeats = field::Empty),
)]
pub(super) fn run_random(
    rule: &str,
    variant: Variant,
    repeats: usize,
    seed: Option<u64>,
    args: RandomArgs,
) -> Result<ExecutionSummary, CliError> {
    let RandomArgs { size: observations } = args;
    let span = Span::current();
    span.record("observations", field::display(observations));
    span.record("repeats", field::display(repeats));

    let bound = variant.bind(rule)?;
    let mut rng = seed.map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);
    let best = best_of(
        repeats,
        || CondensedMatrix::generate(observations, &mut rng),
        |mut matrix| bound.invoke(matrix.values_mut(), observations),
    )?;
    Ok(ExecutionSummary {
        observations,
        repeats,
        variant,
        best,
    })
}

#[instrument(
    name = "cli.run_file",
    err,
    skip_all,
    fields(path = field::Empty, observations = field::Empty, repeats = field::Empty),
)]
pub(super) fn run_file(
    rule: &str,
    variant: Variant,
    repeats: usize,
    args: FileArgs,
) -> Result<ExecutionSummary, CliError> {
    let FileArgs { path } = args;
    let span = Span::current();
    span.record("path", field::display(path.display()));
    span.record("repeats", field::display(repeats));

    let reader = open_distance_reader(&path)?;
    let matrix = CondensedMatrix::from_reader(reader)?;
    let observations = matrix.observations();
    span.record("observations", field::display(observations));

    let bound = variant.bind(rule)?;
    // The collaborator reorders its input in place, so each repeat works on
    // a copy taken while the clock is stopped.
    let best = best_of(
        repeats,
        || Ok(matrix.clone()),
        |mut working| bound.invoke(working.values_mut(), observations),
    )?;
    Ok(ExecutionSummary {
        observations,
        repeats,
        variant,
        best,
    })
}

#[instrument(name = "cli.open_distance_reader", err, fields(path = field::Empty))]
pub(super) fn open_distance_reader(path: &Path) -> Result<BufReader<File>, CliError> {
    Span::current().record("path", field::display(path.display()));
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Renders `summary` as the single-line benchmark report: the best time in
/// milliseconds, fixed to six decimal places.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use std::time::Duration;
/// # use linkbench_cli::cli::{ExecutionSummary, render_summary};
/// # use linkbench_core::Variant;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     observations: 4,
///     repeats: 5,
///     variant: Variant::Mst,
///     best: Duration::from_micros(1_500),
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(String::from_utf8(buffer)?, "1.500000\n");
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, writer: impl Write) -> io::Result<()> {
    render_best_time(summary.best, writer)
}
