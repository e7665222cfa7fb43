//! Best-time rendering.
//!
//! The harness emits exactly one line on standard output: the best observed
//! time converted to milliseconds with six decimal places, no units and no
//! trailing metadata. Downstream tooling parses that line, so diagnostics
//! must never share the stream.

use std::io::{self, Write};
use std::time::Duration;

/// Converts a best time into fractional milliseconds.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "unit conversion from seconds to milliseconds"
)]
pub fn best_time_millis(best: Duration) -> f64 {
    best.as_secs_f64() * 1_000.0
}

/// Writes the single-line benchmark report to `writer`.
///
/// # Errors
/// Returns [`io::Error`] when writing fails.
pub fn render_best_time(best: Duration, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "{:.6}", best_time_millis(best))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::sub_millisecond(Duration::from_micros(250), "0.250000\n")]
    #[case::whole_milliseconds(Duration::from_millis(3), "3.000000\n")]
    #[case::mixed(Duration::from_micros(1_500), "1.500000\n")]
    #[case::zero(Duration::ZERO, "0.000000\n")]
    fn renders_fixed_point_milliseconds(#[case] best: Duration, #[case] expected: &str) {
        let mut buffer = Vec::new();
        render_best_time(best, &mut buffer).expect("writing to a vector cannot fail");
        assert_eq!(
            String::from_utf8(buffer).expect("output is UTF-8"),
            expected
        );
    }

    #[test]
    fn conversion_scales_seconds_to_milliseconds() {
        assert_eq!(best_time_millis(Duration::from_secs(2)), 2_000.0);
    }

    #[test]
    fn the_report_is_a_single_line() {
        let mut buffer = Vec::new();
        render_best_time(Duration::from_micros(42), &mut buffer)
            .expect("writing to a vector cannot fail");
        let text = String::from_utf8(buffer).expect("output is UTF-8");
        assert_eq!(text.lines().count(), 1);
    }
}
