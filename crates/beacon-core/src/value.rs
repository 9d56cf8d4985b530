//! Rate string codec.
//!
//! Clients report values as display strings such as `$2.2M/s`. This
//! module converts them to an integer magnitude and back.
//!
//! The round trip is lossy: [`format_value`] keeps a single fractional
//! digit, so `parse_value(&format_value(2_345_678))` yields `2_300_000`.
//! Existing consumers rely on that exact rendering.

/// Currency symbol prefixed to formatted values.
pub const CURRENCY_SYMBOL: &str = "$";

/// Rate suffix appended to formatted values.
pub const RATE_SUFFIX: &str = "/s";

/// Magnitude suffixes, largest first.
const MAGNITUDES: [(char, u64); 3] = [
    ('B', 1_000_000_000),
    ('M', 1_000_000),
    ('K', 1_000),
];

/// Parse a rate string into an integer magnitude.
///
/// Accepts an optional leading `$`, an optional trailing `/s`, a decimal
/// number, and an optional `K`/`M`/`B` suffix (case-insensitive). The
/// product is floored. Anything else yields 0.
///
/// ```
/// use beacon_core::value::parse_value;
///
/// assert_eq!(parse_value("$2.2M/s"), 2_200_000);
/// assert_eq!(parse_value("750k"), 750_000);
/// assert_eq!(parse_value("garbage"), 0);
/// ```
pub fn parse_value(text: &str) -> u64 {
    let stripped = text.strip_prefix(CURRENCY_SYMBOL).unwrap_or(text);
    let stripped = stripped.strip_suffix(RATE_SUFFIX).unwrap_or(stripped);
    let cleaned = stripped.trim();

    let Some(last) = cleaned.chars().last() else {
        return 0;
    };

    let (number, multiplier) = if last.is_ascii_alphabetic() {
        let Some(multiplier) = multiplier_for(last) else {
            return 0;
        };
        (cleaned.strip_suffix(last).unwrap_or_default(), multiplier)
    } else {
        (cleaned, 1)
    };

    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return 0;
    }

    number
        .parse::<f64>()
        .map_or(0, |n| scale(n, multiplier))
}

/// Format an integer magnitude as a rate string.
///
/// Picks the largest suffix the value reaches and renders the `f64`
/// quotient with one fractional digit, rounding the exact binary value
/// of that quotient (ties away from zero). `1_150` therefore renders as
/// `$1.1K/s`, since `1.15` is stored just below the tie. Values below
/// 1000 are rendered whole.
///
/// ```
/// use beacon_core::value::format_value;
///
/// assert_eq!(format_value(2_500), "$2.5K/s");
/// assert_eq!(format_value(1_150), "$1.1K/s");
/// assert_eq!(format_value(0), "$0/s");
/// ```
#[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
pub fn format_value(value: u64) -> String {
    let Some((suffix, divisor)) = MAGNITUDES.iter().find(|(_, d)| value >= *d) else {
        return format!("{CURRENCY_SYMBOL}{value}{RATE_SUFFIX}");
    };

    let tenths = round_tenths(value as f64 / *divisor as f64);
    format!(
        "{CURRENCY_SYMBOL}{}.{}{suffix}{RATE_SUFFIX}",
        tenths / 10,
        tenths % 10
    )
}

/// `quotient * 10` rounded to the nearest integer, computed on the exact
/// value of the double. Requires a finite `quotient >= 1`.
#[allow(clippy::arithmetic_side_effects)]
fn round_tenths(quotient: f64) -> u128 {
    let bits = quotient.to_bits();
    let biased_exp = i32::try_from((bits >> 52) & 0x7ff).unwrap_or_default();
    let mantissa = u128::from((bits & ((1_u64 << 52) - 1)) | (1_u64 << 52));
    // quotient == mantissa * 2^exp exactly.
    let exp = biased_exp - 1_075;

    let scaled = mantissa * 10;
    if exp >= 0 {
        return scaled << exp.unsigned_abs();
    }
    let shift = exp.unsigned_abs().min(127);
    let whole = scaled >> shift;
    let remainder = scaled - (whole << shift);
    let half = 1_u128 << (shift - 1);
    if remainder >= half { whole + 1 } else { whole }
}

fn multiplier_for(suffix: char) -> Option<u64> {
    let upper = suffix.to_ascii_uppercase();
    MAGNITUDES
        .iter()
        .find(|(s, _)| *s == upper)
        .map(|(_, m)| *m)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scale(number: f64, multiplier: u64) -> u64 {
    let product = (number * multiplier as f64).floor();
    if !product.is_finite() || product <= 0.0 {
        return 0;
    }
    // `as` saturates at u64::MAX for out-of-range floats.
    product as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_rate_strings() {
        assert_eq!(parse_value("$2.2M/s"), 2_200_000);
        assert_eq!(parse_value("$500/s"), 500);
        assert_eq!(parse_value("$1.5B/s"), 1_500_000_000);
        assert_eq!(parse_value("$12.75K/s"), 12_750);
    }

    #[test]
    fn prefix_and_suffix_are_optional() {
        assert_eq!(parse_value("2.2M"), 2_200_000);
        assert_eq!(parse_value("$3k"), 3_000);
        assert_eq!(parse_value("42/s"), 42);
        assert_eq!(parse_value("  7m  "), 7_000_000);
    }

    #[test]
    fn floors_fractional_results() {
        assert_eq!(parse_value("$1.9999/s"), 1);
        assert_eq!(parse_value("0.0005K"), 0);
    }

    #[test]
    fn malformed_input_is_zero() {
        assert_eq!(parse_value(""), 0);
        assert_eq!(parse_value("$/s"), 0);
        assert_eq!(parse_value("garbage"), 0);
        assert_eq!(parse_value("$2.2X/s"), 0);
        assert_eq!(parse_value("-5K"), 0);
        assert_eq!(parse_value("1.2.3K"), 0);
        assert_eq!(parse_value("."), 0);
        assert_eq!(parse_value("M"), 0);
        assert_eq!(parse_value("$2.2M/s trailing"), 0);
    }

    #[test]
    fn formats_each_magnitude() {
        assert_eq!(format_value(0), "$0/s");
        assert_eq!(format_value(999), "$999/s");
        assert_eq!(format_value(1_000), "$1.0K/s");
        assert_eq!(format_value(2_500), "$2.5K/s");
        assert_eq!(format_value(2_200_000), "$2.2M/s");
        assert_eq!(format_value(3_000_000_000), "$3.0B/s");
    }

    #[test]
    fn formatting_rounds_half_up() {
        assert_eq!(format_value(2_250), "$2.3K/s");
        assert_eq!(format_value(2_249), "$2.2K/s");
        assert_eq!(format_value(999_950), "$1000.0K/s");
    }

    #[test]
    fn formatting_rounds_the_stored_double() {
        // 1.15 and 1150000 / 1e6 sit just below the tie, 1.35 and 8.15 just above.
        assert_eq!(format_value(1_150), "$1.1K/s");
        assert_eq!(format_value(1_150_000), "$1.1M/s");
        assert_eq!(format_value(1_350), "$1.4K/s");
        assert_eq!(format_value(8_150), "$8.2K/s");
        assert_eq!(format_value(1_050), "$1.1K/s");
        assert_eq!(format_value(1_000_000_000), "$1.0B/s");
    }

    #[test]
    fn formats_extremes_without_overflow() {
        assert_eq!(format_value(u64::MAX), "$18446744073.7B/s");
    }

    #[test]
    fn round_trip_is_lossy() {
        let formatted = format_value(2_345_678);
        assert_eq!(formatted, "$2.3M/s");
        assert_eq!(parse_value(&formatted), 2_300_000);
    }
}
