//! Condensed distance-matrix sources.
//!
//! A benchmark run drives the linkage collaborator with a condensed
//! (upper-triangular, diagonal-free) pairwise distance matrix, either drawn
//! uniformly at random for a requested observation count or parsed once from
//! a whitespace-delimited text file.

use std::io::BufRead;

use rand::{Rng, rngs::SmallRng};
use tracing::instrument;

/// Errors raised while producing a condensed distance matrix.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Fewer than two observations were requested; the condensed matrix
    /// would be empty and there would be nothing to measure.
    #[error("observation count must be at least 2 (got {observations})")]
    TooFewObservations {
        /// Observation count supplied by the caller.
        observations: usize,
    },
    /// The condensed length for the requested count overflowed `usize`.
    #[error("condensed length overflows usize for {observations} observations")]
    Overflow {
        /// Observation count that triggered the overflow.
        observations: usize,
    },
    /// The supplied values did not match the condensed length for the
    /// paired observation count.
    #[error("condensed matrix length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Condensed length required by the observation count.
        expected: usize,
        /// Number of values actually supplied.
        actual: usize,
    },
    /// The input ended before an observation-count header was read.
    #[error("input is missing the observation-count header line")]
    MissingHeader,
    /// The header line did not parse as a positive integer.
    #[error("invalid observation-count header `{value}`")]
    InvalidHeader {
        /// Raw header line content.
        value: String,
    },
    /// A distance token did not parse as a non-negative finite number.
    #[error("invalid distance value `{token}`")]
    InvalidValue {
        /// Raw token content.
        token: String,
    },
    /// The input held fewer distance values than the header requires.
    #[error("too few distance values: expected {expected}, got {actual}")]
    TooFewValues {
        /// Condensed length required by the header.
        expected: usize,
        /// Number of values found before the input ended.
        actual: usize,
    },
    /// Reading the input failed.
    #[error("I/O failure while reading distance input: {0}")]
    Io(#[from] std::io::Error),
}

/// Returns the condensed (upper-triangular, diagonal-free) length for
/// `observations` points.
///
/// # Errors
/// Returns [`SourceError`] when the count is below two or the length
/// overflows `usize`.
pub fn condensed_len(observations: usize) -> Result<usize, SourceError> {
    if observations < 2 {
        return Err(SourceError::TooFewObservations { observations });
    }
    observations
        .checked_mul(observations - 1)
        .map(halved)
        .ok_or(SourceError::Overflow { observations })
}

#[expect(
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "observations * (observations - 1) is always even, so halving is exact"
)]
const fn halved(product: usize) -> usize {
    product / 2
}

/// A condensed pairwise distance matrix paired with its observation count.
///
/// Row `i` of the notional symmetric matrix contributes its entries for all
/// columns `j > i`, flattened in row-major order. The value vector always
/// holds exactly `observations * (observations - 1) / 2` entries; every
/// constructor enforces the invariant, so a live matrix cannot violate it.
#[derive(Clone, Debug, PartialEq)]
pub struct CondensedMatrix {
    values: Vec<f64>,
    observations: usize,
}

impl CondensedMatrix {
    /// Draws a fresh matrix of uniform distances in `[0.0, 1.0)`.
    ///
    /// # Errors
    /// Returns [`SourceError`] when `observations` is below two or the
    /// condensed length overflows `usize`.
    pub fn generate(observations: usize, rng: &mut SmallRng) -> Result<Self, SourceError> {
        let total = condensed_len(observations)?;
        let values: Vec<f64> = (0..total)
            .map(|_| rng.gen_range(0.0_f64..1.0_f64))
            .collect();
        Self::from_parts(values, observations)
    }

    /// Parses a matrix from `reader`.
    ///
    /// The first line holds the observation count; the remaining lines hold
    /// whitespace-separated distance values consumed in file order. Exactly
    /// the condensed length is consumed and any trailing surplus is ignored.
    ///
    /// # Errors
    /// Returns [`SourceError`] when the header is missing or malformed, a
    /// token is not a non-negative finite number, the input holds too few
    /// values, or reading fails.
    #[instrument(name = "source.from_reader", level = "debug", skip(reader), err)]
    pub fn from_reader(mut reader: impl BufRead) -> Result<Self, SourceError> {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            return Err(SourceError::MissingHeader);
        }
        let raw = header.trim();
        let observations: usize = raw.parse().map_err(|_| SourceError::InvalidHeader {
            value: raw.to_owned(),
        })?;
        let expected = condensed_len(observations)?;

        let mut values = Vec::with_capacity(expected);
        'lines: for line in reader.lines() {
            for token in line?.split_whitespace() {
                if values.len() == expected {
                    break 'lines;
                }
                values.push(parse_distance(token)?);
            }
        }

        if values.len() < expected {
            return Err(SourceError::TooFewValues {
                expected,
                actual: values.len(),
            });
        }
        Self::from_parts(values, observations)
    }

    /// Builds a matrix from pre-existing parts, enforcing the length
    /// invariant.
    ///
    /// # Errors
    /// Returns [`SourceError`] when `observations` is below two or
    /// `values.len()` differs from the condensed length.
    pub fn from_parts(values: Vec<f64>, observations: usize) -> Result<Self, SourceError> {
        let expected = condensed_len(observations)?;
        if values.len() != expected {
            return Err(SourceError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            values,
            observations,
        })
    }

    /// Returns the observation count.
    #[must_use]
    #[rustfmt::skip]
    pub const fn observations(&self) -> usize { self.observations }

    /// Returns the number of stored distance values.
    #[must_use]
    #[rustfmt::skip]
    pub const fn len(&self) -> usize { self.values.len() }

    /// Returns `true` when no distance values are stored. The constructors
    /// require at least two observations, so this never holds for a
    /// constructed matrix.
    #[must_use]
    #[rustfmt::skip]
    pub const fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Returns the distance values in condensed row-major order.
    #[must_use]
    #[rustfmt::skip]
    pub fn values(&self) -> &[f64] { &self.values }

    /// Returns the distance values mutably; the linkage routines reorder
    /// their input in place.
    #[must_use]
    #[rustfmt::skip]
    pub fn values_mut(&mut self) -> &mut [f64] { &mut self.values }
}

fn parse_distance(token: &str) -> Result<f64, SourceError> {
    let invalid = || SourceError::InvalidValue {
        token: token.to_owned(),
    };
    let value: f64 = token.parse().map_err(|_| invalid())?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid())
    }
}
