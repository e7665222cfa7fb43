//! Unit tests for the CLI commands and benchmark orchestration.

use super::{
    Cli, CliError, Command, ExecutionSummary, FileArgs, MethodArg, RandomArgs, RunCommand,
    RunSource, render_summary, run_cli,
};

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use linkbench_core::{DispatchError, MeasureError, SourceError, Variant};
use rstest::rstest;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn run_args(
    repeats: Option<usize>,
    rule: &str,
    method: MethodArg,
    source: RunSource,
) -> RunCommand {
    RunCommand {
        repeats,
        rule: rule.to_owned(),
        method,
        seed: Some(42),
        source,
    }
}

fn random_source(size: usize) -> RunSource {
    RunSource::Random(RandomArgs { size })
}

fn file_source(path: PathBuf) -> RunSource {
    RunSource::File(FileArgs { path })
}

#[rstest]
#[case::mst(MethodArg::Mst, Variant::Mst)]
#[case::chain(MethodArg::Chain, Variant::Chain)]
#[case::generic(MethodArg::Generic, Variant::Generic)]
fn run_random_measures_the_requested_variant(
    #[case] method: MethodArg,
    #[case] variant: Variant,
) -> TestResult {
    let cli = Cli {
        command: Command::Run(run_args(Some(5), "ward", method, random_source(4))),
    };
    let summary = run_cli(cli)?;
    assert_eq!(summary.observations, 4);
    assert_eq!(summary.repeats, 5);
    assert_eq!(summary.variant, variant);
    Ok(())
}

#[rstest]
fn run_file_loads_the_matrix_once_and_reuses_it() -> TestResult {
    let dir = temp_dir();
    let path = create_distance_file(&dir, "distances.txt", "3\n0.1 0.2 0.3\n")?;
    let cli = Cli {
        command: Command::Run(run_args(
            Some(2),
            "single",
            MethodArg::Chain,
            file_source(path),
        )),
    };
    let summary = run_cli(cli)?;
    assert_eq!(summary.observations, 3);
    assert_eq!(summary.repeats, 2);
    assert_eq!(summary.variant, Variant::Chain);
    Ok(())
}

#[rstest]
fn run_file_rejects_truncated_input() -> TestResult {
    let dir = temp_dir();
    let path = create_distance_file(&dir, "short.txt", "5\n0.1 0.2 0.3 0.4 0.5 0.6 0.7\n")?;
    let cli = Cli {
        command: Command::Run(run_args(Some(2), "ward", MethodArg::Generic, file_source(path))),
    };
    let err = run_cli_expecting_error(cli, "truncated input must fail");
    assert!(matches!(
        err,
        CliError::Source(SourceError::TooFewValues {
            expected: 10,
            actual: 7,
        })
    ));
    Ok(())
}

#[rstest]
#[case::chain(MethodArg::Chain)]
#[case::generic(MethodArg::Generic)]
fn rule_requiring_variants_reject_unknown_rules(#[case] method: MethodArg) {
    let cli = Cli {
        command: Command::Run(run_args(Some(2), "banana", method, random_source(4))),
    };
    let err = run_cli_expecting_error(cli, "unknown rule must fail");
    assert!(matches!(
        err,
        CliError::Dispatch(DispatchError::UnknownRule { .. })
    ));
}

#[rstest]
fn mst_accepts_an_unrecognised_rule() -> TestResult {
    let cli = Cli {
        command: Command::Run(run_args(Some(2), "banana", MethodArg::Mst, random_source(4))),
    };
    let summary = run_cli(cli)?;
    assert_eq!(summary.variant, Variant::Mst);
    Ok(())
}

#[rstest]
fn zero_repeats_is_rejected() {
    let cli = Cli {
        command: Command::Run(run_args(Some(0), "ward", MethodArg::Generic, random_source(4))),
    };
    let err = run_cli_expecting_error(cli, "zero repeats must fail");
    assert!(matches!(err, CliError::Measure(MeasureError::ZeroRepeats)));
}

#[rstest]
fn a_degenerate_observation_count_is_rejected() {
    let cli = Cli {
        command: Command::Run(run_args(Some(2), "ward", MethodArg::Generic, random_source(1))),
    };
    let err = run_cli_expecting_error(cli, "one observation must fail");
    assert!(matches!(
        err,
        CliError::Measure(MeasureError::Preparation {
            repeat: 0,
            source: SourceError::TooFewObservations { observations: 1 },
        })
    ));
}

#[rstest]
fn a_missing_file_is_reported_with_its_path() {
    let path = PathBuf::from("/nonexistent/distances.txt");
    let cli = Cli {
        command: Command::Run(run_args(
            Some(2),
            "ward",
            MethodArg::Generic,
            file_source(path.clone()),
        )),
    };
    let err = run_cli_expecting_error(cli, "a missing file must fail");
    assert!(matches!(err, CliError::Io { path: reported, .. } if reported == path));
}

#[rstest]
fn render_summary_emits_one_fixed_point_line() -> TestResult {
    let summary = ExecutionSummary {
        observations: 4,
        repeats: 5,
        variant: Variant::Mst,
        best: Duration::from_micros(1_500),
    };
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer)?;
    assert_eq!(String::from_utf8(buffer)?, "1.500000\n");
    Ok(())
}

#[rstest]
fn fixed_seeds_reproduce_the_same_generated_inputs() -> TestResult {
    // Timing still varies between runs, so only the configuration paths are
    // compared; both runs must succeed over identical matrices.
    for _ in 0..2 {
        let cli = Cli {
            command: Command::Run(run_args(Some(3), "ward", MethodArg::Generic, random_source(6))),
        };
        let summary = run_cli(cli)?;
        assert_eq!(summary.observations, 6);
    }
    Ok(())
}

#[rstest]
fn clap_parses_flags_and_subcommands() {
    let cli = Cli::try_parse_from([
        "linkbench", "run", "--repeats", "7", "--method", "mst", "random", "--size", "10",
    ])
    .expect("arguments must parse");
    let Command::Run(run) = cli.command;
    assert_eq!(run.repeats, Some(7));
    assert!(matches!(run.method, MethodArg::Mst));
    assert!(matches!(run.source, RunSource::Random(RandomArgs { size: 10 })));
}

#[rstest]
fn clap_applies_documented_defaults() {
    let cli = Cli::try_parse_from(["linkbench", "run", "random"]).expect("arguments must parse");
    let Command::Run(run) = cli.command;
    assert_eq!(run.repeats, None);
    assert_eq!(run.rule, "ward");
    assert!(matches!(run.method, MethodArg::Generic));
    assert!(matches!(run.source, RunSource::Random(RandomArgs { size: 100 })));
}

#[rstest]
fn clap_rejects_unknown_methods() {
    let result = Cli::try_parse_from(["linkbench", "run", "--method", "sorcery", "random"]);
    assert!(result.is_err());
}

fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

fn create_distance_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

/// Run CLI and expect an error, panicking with the given message if successful.
fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{}", panic_msg),
        Err(err) => err,
    }
}
