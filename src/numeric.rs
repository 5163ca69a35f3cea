//! Numeric literal checks and coercion
//!
//! Downstream inventory readers convert coordinates and rates with a plain
//! float parser, so "numeric" here means a finite decimal literal: optional
//! sign, digits with an optional fraction, optional exponent. Special values
//! such as `nan` or `inf` are not accepted.

use once_cell::sync::Lazy;
use regex::Regex;

static FLOAT_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$").unwrap()
});

/// Default written for any coordinate or orientation that is not numeric
pub const DEFAULT_NUMERIC: &str = "0.0";

/// Check if `text` is a decimal floating-point literal (surrounding whitespace ignored)
pub fn is_float(text: &str) -> bool {
    FLOAT_LITERAL.is_match(text.trim())
}

/// Parse `text` when it is a decimal literal
pub fn parse_float(text: &str) -> Option<f64> {
    if is_float(text) {
        text.trim().parse::<f64>().ok()
    } else {
        None
    }
}

/// Return `text` unchanged if it is numeric, otherwise `default`.
///
/// This never fails; every input maps to a numeric string.
pub fn coerce_or_default(text: &str, default: &str) -> String {
    if is_float(text) {
        text.to_string()
    } else {
        default.to_string()
    }
}

/// Format a sample rate the way it is written back to `sampleRate`
pub fn format_rate(rate: f64) -> String {
    format!("{:.6}", rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_float_accepts_common_forms() {
        assert!(is_float("52.3"));
        assert!(is_float("-13.25"));
        assert!(is_float("+7"));
        assert!(is_float("100."));
        assert!(is_float(".5"));
        assert!(is_float("1e3"));
        assert!(is_float("-2.5E-4"));
        assert!(is_float("  12.0  "));
    }

    #[test]
    fn test_is_float_rejects_text() {
        assert!(!is_float(""));
        assert!(!is_float("N/A"));
        assert!(!is_float("."));
        assert!(!is_float("1,5"));
        assert!(!is_float("12 m"));
        assert!(!is_float("e5"));
        assert!(!is_float("1e"));
        assert!(!is_float("nan"));
        assert!(!is_float("inf"));
        assert!(!is_float("-Infinity"));
        assert!(!is_float("0x1A"));
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(" 100 "), Some(100.0));
        assert_eq!(parse_float("2.5e1"), Some(25.0));
        assert_eq!(parse_float("unknown"), None);
    }

    #[test]
    fn test_coerce_or_default() {
        assert_eq!(coerce_or_default("45.1", DEFAULT_NUMERIC), "45.1");
        assert_eq!(coerce_or_default("N/A", DEFAULT_NUMERIC), "0.0");
        assert_eq!(coerce_or_default("", "1.0"), "1.0");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(100.0), "100.000000");
        assert_eq!(format_rate(0.1), "0.100000");
        assert_eq!(format_rate(40.0 / 3.0), "13.333333");
    }
}
