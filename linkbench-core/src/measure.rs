//! Best-of-R timed execution.
//!
//! Repeats a bound linkage invocation, timing each repeat with a monotonic
//! clock and folding the minimum observed duration. The minimum best
//! approximates the intrinsic cost of the invocation absent scheduling
//! jitter and cache warm-up. Input preparation runs with the clock stopped:
//! random mode draws a fresh matrix per repeat and file mode clones the
//! loaded matrix, because the collaborator reorders its input in place.

use std::time::{Duration, Instant};

use tracing::instrument;

use crate::dispatch::InvocationError;
use crate::source::SourceError;

/// Errors raised by the timed execution loop.
#[derive(Debug, thiserror::Error)]
pub enum MeasureError {
    /// A minimum over zero repeats is undefined.
    #[error("repeat count must be greater than zero")]
    ZeroRepeats,
    /// Untimed input preparation failed.
    #[error("input preparation failed on repeat {repeat}: {source}")]
    Preparation {
        /// Zero-based repeat index that failed.
        repeat: usize,
        /// Underlying source failure.
        #[source]
        source: SourceError,
    },
    /// A timed invocation failed; the run aborts rather than retry.
    #[error("timed invocation failed on repeat {repeat}: {source}")]
    Invocation {
        /// Zero-based repeat index that failed.
        repeat: usize,
        /// Underlying collaborator failure.
        #[source]
        source: InvocationError,
    },
}

/// Executes `invoke` once per repeat and returns the minimum elapsed time.
///
/// Each repeat first runs `prepare` with the clock stopped, then times a
/// single `invoke` over the prepared input, discarding its result. The
/// minimum is carried as a fold accumulator seeded with [`Duration::MAX`],
/// which the first repeat always replaces.
///
/// # Errors
/// Returns [`MeasureError`] when `repeats` is zero or either closure fails;
/// a failure aborts the remaining repeats immediately.
#[instrument(level = "debug", skip(prepare, invoke), err)]
pub fn best_of<T>(
    repeats: usize,
    mut prepare: impl FnMut() -> Result<T, SourceError>,
    mut invoke: impl FnMut(T) -> Result<(), InvocationError>,
) -> Result<Duration, MeasureError> {
    if repeats == 0 {
        return Err(MeasureError::ZeroRepeats);
    }
    (0..repeats).try_fold(Duration::MAX, |best, repeat| {
        let input = prepare().map_err(|source| MeasureError::Preparation { repeat, source })?;
        let started = Instant::now();
        invoke(input).map_err(|source| MeasureError::Invocation { repeat, source })?;
        let sample = started.elapsed();
        Ok(best.min(sample))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    fn no_preparation() -> Result<(), SourceError> {
        Ok(())
    }

    #[test]
    fn zero_repeats_is_rejected() {
        let err = best_of(0, no_preparation, |()| Ok(())).expect_err("zero repeats must fail");
        assert!(matches!(err, MeasureError::ZeroRepeats));
    }

    #[test]
    fn the_minimum_of_injected_delays_is_reported() {
        let delays = [
            Duration::from_millis(25),
            Duration::from_millis(5),
            Duration::from_millis(15),
        ];
        let mut remaining = delays.iter();
        let best = best_of(delays.len(), no_preparation, |()| {
            if let Some(delay) = remaining.next() {
                thread::sleep(*delay);
            }
            Ok(())
        })
        .expect("measurement must succeed");
        // Sleeps only guarantee a lower bound, so bracket the known 5ms
        // minimum instead of asserting exact equality.
        assert!(best >= Duration::from_millis(5));
        assert!(best < Duration::from_millis(15));
    }

    #[test]
    fn every_repeat_prepares_and_invokes_exactly_once() {
        let mut prepared = 0_usize;
        let mut invoked = 0_usize;
        best_of(
            7,
            || {
                prepared += 1;
                Ok(())
            },
            |()| {
                invoked += 1;
                Ok(())
            },
        )
        .expect("measurement must succeed");
        assert_eq!(prepared, 7);
        assert_eq!(invoked, 7);
    }

    #[test]
    fn the_prepared_input_reaches_the_invocation() {
        let mut seen = Vec::new();
        let mut next = 0_usize;
        best_of(
            3,
            || {
                next += 1;
                Ok(next)
            },
            |input| {
                seen.push(input);
                Ok(())
            },
        )
        .expect("measurement must succeed");
        assert_eq!(seen, [1, 2, 3]);
    }

    #[test]
    fn a_failing_invocation_aborts_the_run() {
        let mut invoked = 0_usize;
        let err = best_of(5, no_preparation, |()| {
            invoked += 1;
            if invoked == 2 {
                Err(InvocationError::Panicked {
                    variant: "generic",
                    message: "boom".to_owned(),
                })
            } else {
                Ok(())
            }
        })
        .expect_err("a failing repeat must abort the run");
        assert!(matches!(err, MeasureError::Invocation { repeat: 1, .. }));
        assert_eq!(invoked, 2);
    }

    #[test]
    fn a_failing_preparation_aborts_before_any_invocation() {
        let mut invoked = 0_usize;
        let err = best_of(
            3,
            || Err(SourceError::MissingHeader),
            |()| {
                invoked += 1;
                Ok(())
            },
        )
        .expect_err("a failing preparation must abort the run");
        assert!(matches!(err, MeasureError::Preparation { repeat: 0, .. }));
        assert_eq!(invoked, 0);
    }
}
