//! Exact decimal frequencies.
//!
//! A [`Frequency`] keeps the integer part as a `u64` and every supplied
//! fractional digit as text, so nothing is rounded when the value is parsed.
//! Binary floating point only enters at synthesis time, and then only for the
//! sub-hertz part (see [`Frequency::fractional_part_f64`]).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ToneError, ToneResult};

/// A strictly positive frequency in hertz with arbitrary fractional precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency {
    integer: u64,
    fraction: String,
    fraction_value: f64,
}

/// Parses a textual frequency.
///
/// Shorthand for [`Frequency::from_str`].
pub fn parse_frequency(text: &str) -> ToneResult<Frequency> {
    text.parse()
}

impl Frequency {
    /// Integer part in hertz.
    pub fn integer_part(&self) -> u64 {
        self.integer
    }

    /// Fractional digits exactly as supplied (trailing zeros included).
    pub fn fraction_digits(&self) -> &str {
        &self.fraction
    }

    /// Number of fractional digits.
    pub fn fractional_digits(&self) -> usize {
        self.fraction.len()
    }

    /// Fractional part as the nearest `f64` in [0, 1).
    pub fn fractional_part_f64(&self) -> f64 {
        self.fraction_value
    }

    /// Nearest `f64` to the whole value.
    pub fn to_f64(&self) -> f64 {
        self.integer as f64 + self.fraction_value
    }

    /// Formats the value with exactly `digits` fractional digits.
    ///
    /// Extra digits are zero padded; dropped digits round half up.
    pub fn format_fixed(&self, digits: usize) -> String {
        if digits >= self.fraction.len() {
            let mut out = format!("{}", self.integer);
            if digits > 0 {
                out.push('.');
                out.push_str(&self.fraction);
                out.extend(std::iter::repeat('0').take(digits - self.fraction.len()));
            }
            return out;
        }

        let mut kept: Vec<u8> = self.fraction.as_bytes()[..digits].to_vec();
        let round_up = self.fraction.as_bytes()[digits] >= b'5';
        let mut integer = self.integer as u128;

        if round_up {
            let mut carry = true;
            for digit in kept.iter_mut().rev() {
                if *digit == b'9' {
                    *digit = b'0';
                } else {
                    *digit += 1;
                    carry = false;
                    break;
                }
            }
            if carry {
                integer += 1;
            }
        }

        let mut out = format!("{}", integer);
        if digits > 0 {
            out.push('.');
            out.extend(kept.iter().map(|&b| b as char));
        }
        out
    }
}

impl FromStr for Frequency {
    type Err = ToneError;

    fn from_str(text: &str) -> ToneResult<Self> {
        let trimmed = text.trim();
        let body = trimmed.strip_prefix('+').unwrap_or(trimmed);

        if body.is_empty() {
            return Err(ToneError::invalid_frequency(text, "empty numeral"));
        }
        if body.starts_with('-') {
            return Err(ToneError::invalid_frequency(text, "must be positive"));
        }

        let (int_text, frac_text) = match body.split_once('.') {
            Some((int_text, frac_text)) => (int_text, frac_text),
            None => (body, ""),
        };

        if int_text.is_empty() && frac_text.is_empty() {
            return Err(ToneError::invalid_frequency(text, "no digits"));
        }
        if let Some(bad) = int_text
            .chars()
            .chain(frac_text.chars())
            .find(|c| !c.is_ascii_digit())
        {
            return Err(ToneError::invalid_frequency(
                text,
                format!("unexpected character '{}'", bad),
            ));
        }

        let mut integer: u64 = 0;
        for b in int_text.bytes() {
            integer = integer
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(b - b'0')))
                .ok_or_else(|| ToneError::invalid_frequency(text, "integer part out of range"))?;
        }

        if integer == 0 && frac_text.bytes().all(|b| b == b'0') {
            return Err(ToneError::invalid_frequency(text, "must be greater than zero"));
        }

        let fraction_value = if frac_text.is_empty() {
            0.0
        } else {
            format!("0.{}", frac_text)
                .parse::<f64>()
                .map_err(|e| ToneError::invalid_frequency(text, e.to_string()))?
        };

        Ok(Self {
            integer,
            fraction: frac_text.to_string(),
            fraction_value,
        })
    }
}

impl TryFrom<String> for Frequency {
    type Error = ToneError;

    fn try_from(value: String) -> ToneResult<Self> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_fixed(self.fraction.len()))
    }
}

impl PartialEq for Frequency {
    fn eq(&self, other: &Self) -> bool {
        self.integer == other.integer && self.fraction == other.fraction
    }
}

impl Eq for Frequency {}

impl Hash for Frequency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.integer.hash(state);
        self.fraction.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_preserves_every_digit() {
        let text = "12500.00000000000000000000000000000000000000000000000001";
        let freq: Frequency = text.parse().unwrap();
        assert_eq!(freq.integer_part(), 12500);
        assert_eq!(freq.fractional_digits(), 50);
        assert_eq!(freq.to_string(), text);
    }

    #[test]
    fn test_parse_keeps_trailing_zeros() {
        let freq: Frequency = "440.0".parse().unwrap();
        assert_eq!(freq.to_string(), "440.0");
        assert_eq!(freq.fractional_digits(), 1);
        assert_ne!(freq, "440".parse::<Frequency>().unwrap());
    }

    #[test]
    fn test_parse_canonicalizes_leading_forms() {
        assert_eq!(parse_frequency("0440.5").unwrap().to_string(), "440.5");
        assert_eq!(parse_frequency("+440").unwrap().to_string(), "440");
        assert_eq!(parse_frequency(".25").unwrap().to_string(), "0.25");
        assert_eq!(parse_frequency("  261.63 ").unwrap().to_string(), "261.63");
        assert_eq!(parse_frequency("5.").unwrap().to_string(), "5");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["", "abc", "4e2", "44.1.2", "1,5", "-440", "nan", "inf", ".", "+", " "] {
            let err = parse_frequency(text).unwrap_err();
            assert!(
                matches!(err, ToneError::InvalidFrequency { .. }),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_zero() {
        for text in ["0", "0.0", "000.000000", ".0"] {
            assert!(parse_frequency(text).is_err(), "{text:?} should be rejected");
        }
        assert!(parse_frequency("0.0000000000000000000001").is_ok());
    }

    #[test]
    fn test_parse_rejects_huge_integer_part() {
        assert!(parse_frequency("18446744073709551615").is_ok());
        assert!(parse_frequency("18446744073709551616").is_err());
    }

    #[test]
    fn test_fractional_part_f64() {
        let freq = parse_frequency("440.25").unwrap();
        assert_eq!(freq.fractional_part_f64(), 0.25);
        assert_eq!(freq.to_f64(), 440.25);
        assert_eq!(parse_frequency("440").unwrap().fractional_part_f64(), 0.0);
    }

    #[test]
    fn test_format_fixed_pads_and_rounds() {
        let freq = parse_frequency("432.123456789").unwrap();
        assert_eq!(freq.format_fixed(12), "432.123456789000");
        assert_eq!(freq.format_fixed(4), "432.1235");
        assert_eq!(freq.format_fixed(0), "432");

        let carry = parse_frequency("99.996").unwrap();
        assert_eq!(carry.format_fixed(2), "100.00");
        assert_eq!(carry.format_fixed(0), "100");
    }

    #[test]
    fn test_serde_as_string() {
        let freq = parse_frequency("440.000000000001").unwrap();
        let json = serde_json::to_string(&freq).unwrap();
        assert_eq!(json, "\"440.000000000001\"");
        let back: Frequency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, freq);
        assert!(serde_json::from_str::<Frequency>("\"-1\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_format_fixed_round_trips(int in 1u64..1_000_000, frac in "[0-9]{0,64}") {
            let text = if frac.is_empty() {
                int.to_string()
            } else {
                format!("{}.{}", int, frac)
            };
            let freq = parse_frequency(&text).unwrap();
            prop_assert_eq!(freq.format_fixed(frac.len()), text);
        }
    }
}
