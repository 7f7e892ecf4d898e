//! Locale-formatted magnitude text to integers.
//!
//! Feed labels look like `"1.1만명"` or `"1,234명"`. Digits and the first
//! decimal separator survive filtering; a `만` anywhere in the text scales
//! the value by ten thousand before truncation.

use crate::error::MalformedNumber;

/// Korean ten-thousand unit marker.
pub const TEN_THOUSAND_MARKER: char = '만';

const DECIMAL_SEPARATOR: char = '.';
const TEN_THOUSAND: u64 = 10_000;
/// Number of fractional digits that survive a ten-thousand scale.
const SCALE_DIGITS: usize = 4;

/// Parse a magnitude label into an integer.
///
/// The arithmetic is exact: the fractional part is scaled digit by digit
/// rather than through a float, so `"0.29만"` yields `2900`.
pub fn normalize(text: &str) -> Result<u64, MalformedNumber> {
    let malformed = || MalformedNumber {
        input: text.to_string(),
    };

    let mut whole = String::new();
    let mut fraction = String::new();
    let mut seen_separator = false;
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            if seen_separator {
                fraction.push(ch);
            } else {
                whole.push(ch);
            }
        } else if ch == DECIMAL_SEPARATOR {
            seen_separator = true;
        }
    }

    if whole.is_empty() && fraction.is_empty() {
        return Err(malformed());
    }

    let whole_value = parse_digits(&whole).ok_or_else(malformed)?;

    if !text.contains(TEN_THOUSAND_MARKER) {
        return Ok(whole_value);
    }

    // Pad or cut the fraction to exactly SCALE_DIGITS places.
    let scaled_fraction: String = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(SCALE_DIGITS)
        .collect();
    let fraction_value = parse_digits(&scaled_fraction).ok_or_else(malformed)?;

    whole_value
        .checked_mul(TEN_THOUSAND)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(malformed)
}

/// Fold ASCII digits into a `u64`; empty input is zero, overflow is `None`.
fn parse_digits(digits: &str) -> Option<u64> {
    digits.bytes().try_fold(0u64, |acc, b| {
        acc.checked_mul(10)?.checked_add(u64::from(b - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ten_thousand_with_fraction() {
        assert_eq!(normalize("1.1만명"), Ok(11000));
    }

    #[test]
    fn test_normalize_grouped_digits() {
        assert_eq!(normalize("1,234명"), Ok(1234));
    }

    #[test]
    fn test_normalize_ten_thousand_whole() {
        assert_eq!(normalize("532만"), Ok(5_320_000));
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(normalize("0명"), Ok(0));
    }

    #[test]
    fn test_normalize_unit_only_is_malformed() {
        let err = normalize("명").unwrap_err();
        assert_eq!(err.input, "명");
    }

    #[test]
    fn test_normalize_separator_only_is_malformed() {
        assert!(normalize(".만").is_err());
    }

    #[test]
    fn test_normalize_exact_fraction_scaling() {
        // 0.29 * 10000 in f64 is 2899.9999...
        assert_eq!(normalize("0.29만"), Ok(2900));
        assert_eq!(normalize("12.34567만"), Ok(123_456));
    }

    #[test]
    fn test_normalize_truncates_without_marker() {
        assert_eq!(normalize("980.7명"), Ok(980));
        assert_eq!(normalize(".5"), Ok(0));
    }

    #[test]
    fn test_normalize_keeps_first_separator_only() {
        assert_eq!(normalize("1.2.3만"), Ok(12300));
    }

    #[test]
    fn test_normalize_overflow_is_malformed() {
        assert!(normalize("99999999999999999999").is_err());
        assert!(normalize("9999999999999999만").is_err());
    }
}
