use num_bigint::BigUint;

use crate::denomination::Denomination;
use crate::error::Error;

/// A decimal string split at its point. Digits only, sign already removed.
#[derive(Debug, Clone, Copy)]
struct DecimalParts<'a> {
    negative: bool,
    integer: &'a str,
    fraction: &'a str,
}

fn split_decimal(amount: &str) -> Result<DecimalParts<'_>, Error> {
    let invalid = || Error::InvalidAmount(amount.to_string());

    let (negative, unsigned) = match amount.as_bytes().first() {
        Some(b'-') => (true, &amount[1..]),
        Some(b'+') => (false, &amount[1..]),
        _ => (false, amount),
    };

    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if integer.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(integer) || !all_digits(fraction) {
        return Err(invalid());
    }

    Ok(DecimalParts {
        negative,
        integer,
        fraction,
    })
}

/// Parse a run of decimal digits, treating an empty run as zero.
fn parse_digits(digits: &str) -> BigUint {
    if digits.is_empty() {
        return BigUint::default();
    }
    BigUint::parse_bytes(digits.as_bytes(), 10).unwrap_or_default()
}

/// Convert a display amount into the native integer amount for `denom`.
///
/// The decimal point is shifted by the multiplier's zero count and any
/// digits left past the point are truncated.
pub fn to_native(display_amount: &str, denom: &Denomination) -> Result<String, Error> {
    let parts = split_decimal(display_amount)?;
    if parts.negative {
        return Err(Error::InvalidAmount(display_amount.to_string()));
    }

    let shift = denom.decimals() as usize;
    let mut digits = String::with_capacity(parts.integer.len() + shift);
    digits.push_str(parts.integer);
    if parts.fraction.len() >= shift {
        digits.push_str(&parts.fraction[..shift]);
    } else {
        digits.push_str(parts.fraction);
        digits.extend(std::iter::repeat_n('0', shift - parts.fraction.len()));
    }

    Ok(parse_digits(&digits).to_string())
}

/// Convert a native integer amount into a display decimal for `denom`.
///
/// At most `precision` fractional digits are kept (extra digits are
/// truncated) and trailing zeros are trimmed.
pub fn to_display(native_amount: &str, denom: &Denomination, precision: u32) -> Result<String, Error> {
    let parts = split_decimal(native_amount)?;
    if !parts.fraction.is_empty() || native_amount.contains('.') {
        return Err(Error::InvalidAmount(native_amount.to_string()));
    }

    let magnitude = parse_digits(parts.integer);
    let sign = if parts.negative && magnitude != BigUint::default() {
        "-"
    } else {
        ""
    };
    let s = magnitude.to_string();
    let shift = denom.decimals() as usize;

    if shift == 0 {
        return Ok(format!("{sign}{s}"));
    }

    let padded = if s.len() <= shift {
        let mut p = String::with_capacity(shift + 1);
        p.extend(std::iter::repeat_n('0', shift + 1 - s.len()));
        p.push_str(&s);
        p
    } else {
        s
    };

    let (integer_part, decimal_part) = padded.split_at(padded.len() - shift);
    let keep = decimal_part.len().min(precision as usize);
    let trimmed = decimal_part[..keep].trim_end_matches('0');

    if trimmed.is_empty() {
        // "-0" never appears once the fraction is truncated away
        if integer_part.bytes().all(|b| b == b'0') {
            return Ok("0".to_string());
        }
        Ok(format!("{sign}{integer_part}"))
    } else {
        Ok(format!("{sign}{integer_part}.{trimmed}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denom(multiplier: &str) -> Denomination {
        Denomination::new("TEST", multiplier, None).unwrap()
    }

    #[test]
    fn test_to_native() {
        assert_eq!(to_native("1.5000", &denom("10000")).unwrap(), "15000");
        assert_eq!(to_native("1", &denom("1000000000000000000")).unwrap(), "1000000000000000000");
        assert_eq!(to_native("0.000123", &denom("1000000")).unwrap(), "123");
        assert_eq!(to_native(".5", &denom("100")).unwrap(), "50");
        assert_eq!(to_native("7.", &denom("100")).unwrap(), "700");
        assert_eq!(to_native("007", &denom("10")).unwrap(), "70");
        assert_eq!(to_native("+2", &denom("10")).unwrap(), "20");
    }

    #[test]
    fn test_to_native_truncates() {
        assert_eq!(to_native("1.23456789", &denom("10000")).unwrap(), "12345");
        assert_eq!(to_native("0.00009", &denom("10000")).unwrap(), "0");
        assert_eq!(to_native("5.9", &denom("1")).unwrap(), "5");
    }

    #[test]
    fn test_to_native_passthrough() {
        assert_eq!(to_native("12345", &denom("1")).unwrap(), "12345");
    }

    #[test]
    fn test_to_native_rejects() {
        for bad in ["", "-1", "-0.5", "abc", "1.2.3", "1e18", ".", "0x10", " 1"] {
            let err = to_native(bad, &denom("100")).unwrap_err();
            assert_eq!(err.kind(), "InvalidAmountError", "input {bad:?}");
        }
    }

    #[test]
    fn test_to_display() {
        let eth = denom("1000000000000000000");
        assert_eq!(to_display("1000000000000000000", &eth, 18).unwrap(), "1");
        assert_eq!(to_display("1500000000000000000", &eth, 18).unwrap(), "1.5");
        assert_eq!(to_display("1", &eth, 18).unwrap(), "0.000000000000000001");
        assert_eq!(to_display("0", &eth, 18).unwrap(), "0");
        assert_eq!(to_display("15000", &denom("10000"), 18).unwrap(), "1.5");
        assert_eq!(to_display("123", &denom("1000000"), 6).unwrap(), "0.000123");
    }

    #[test]
    fn test_to_display_precision() {
        let eth = denom("1000000000000000000");
        assert_eq!(to_display("1234567890000000000", &eth, 4).unwrap(), "1.2345");
        assert_eq!(to_display("1", &eth, 4).unwrap(), "0");
        assert_eq!(to_display("2000000000000000001", &eth, 0).unwrap(), "2");
    }

    #[test]
    fn test_to_display_sign_and_passthrough() {
        assert_eq!(to_display("-15000", &denom("10000"), 4).unwrap(), "-1.5");
        assert_eq!(to_display("-1", &denom("10000"), 2).unwrap(), "0");
        assert_eq!(to_display("42", &denom("1"), 8).unwrap(), "42");
        assert!(to_display("1.5", &denom("10"), 8).is_err());
        assert!(to_display("", &denom("10"), 8).is_err());
    }

    #[test]
    fn test_display_native_exactness() {
        let values = ["0", "1", "9", "10", "12345", "1000000000000000000", "98765432109876543210"];
        for multiplier in ["1", "10", "10000", "1000000", "1000000000000000000"] {
            let d = denom(multiplier);
            for precision in [d.decimals(), d.decimals() + 2, 18] {
                for v in values {
                    let display = to_display(v, &d, precision).unwrap();
                    assert_eq!(to_native(&display, &d).unwrap(), v, "{v} via {display} ({multiplier})");
                }
            }
        }
    }
}
