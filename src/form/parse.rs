//! Lenient numeric coercion for form text.
//!
//! Browsers hand form values over as strings and the page coerces them with
//! `parseInt` / `parseFloat`. These helpers reproduce that behavior: the
//! longest numeric prefix wins, trailing characters are discarded, and input
//! with no numeric prefix produces a not-a-number sentinel instead of an
//! error.

/// Parse the leading integer of `input`.
///
/// Skips leading whitespace, accepts one `+`/`-` sign and a `0x`/`0X` hex
/// prefix, then consumes digits until the first non-digit. Returns `None`
/// when no digit was consumed or the value does not fit in an `i64`.
///
/// Unlike `parseInt`, which still returns a rounded number for huge inputs,
/// a value outside the `i64` range is treated as not-a-number (sent as
/// `null`).
pub fn parse_int(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, s) = split_sign(s);

    let (radix, digits) = match s.get(..2) {
        Some("0x") | Some("0X") => (16, &s[2..]),
        _ => (10, s),
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map(|(i, _)| i)
        .unwrap_or(digits.len());

    if end == 0 {
        return None;
    }

    let magnitude = i64::from_str_radix(&digits[..end], radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse the leading decimal number of `input`.
///
/// Accepts leading whitespace, a sign, `Infinity`, and a mantissa of the form
/// `digits[.digits]` or `.digits` followed by an optional exponent. An
/// exponent marker without digits is left out of the prefix. Returns `NaN`
/// when no number is found.
pub fn parse_float(input: &str) -> f64 {
    let s = input.trim_start();
    let (negative, rest) = split_sign(s);
    let sign = if negative { -1.0 } else { 1.0 };

    if rest.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    let bytes = rest.as_bytes();
    let mut pos = 0;

    let int_digits = count_digits(&bytes[pos..]);
    pos += int_digits;

    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        frac_digits = count_digits(&bytes[pos + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            pos += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(pos), Some(b'e') | Some(b'E')) {
        let mut exp_pos = pos + 1;
        if matches!(bytes.get(exp_pos), Some(b'+') | Some(b'-')) {
            exp_pos += 1;
        }
        let exp_digits = count_digits(&bytes[exp_pos.min(bytes.len())..]);
        if exp_digits > 0 {
            pos = exp_pos + exp_digits;
        }
    }

    // The prefix is pure ASCII by construction, so slicing at `pos` is safe.
    match rest[..pos].parse::<f64>() {
        Ok(value) => sign * value,
        Err(_) => f64::NAN,
    }
}

fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_plain_and_signed() {
        assert_eq!(parse_int("54"), Some(54));
        assert_eq!(parse_int("  -7"), Some(-7));
        assert_eq!(parse_int("+12"), Some(12));
    }

    #[test]
    fn parse_int_discards_trailing_characters() {
        assert_eq!(parse_int("42years"), Some(42));
        assert_eq!(parse_int("12.9"), Some(12));
        assert_eq!(parse_int("3e5"), Some(3));
    }

    #[test]
    fn parse_int_hex_prefix() {
        assert_eq!(parse_int("0x1A"), Some(26));
        assert_eq!(parse_int("0xZ"), None);
    }

    #[test]
    fn parse_int_rejects_non_numeric() {
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int("-"), None);
        assert_eq!(parse_int(".5"), None);
    }

    #[test]
    fn parse_int_overflow_is_not_a_number() {
        assert_eq!(parse_int("99999999999999999999999"), None);
        assert_eq!(parse_int("-9223372036854775809"), None);
        assert_eq!(parse_int("9223372036854775807"), Some(i64::MAX));
    }

    #[test]
    fn parse_float_plain_values() {
        assert_eq!(parse_float("27.5"), 27.5);
        assert_eq!(parse_float(" -3.25"), -3.25);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("5."), 5.0);
    }

    #[test]
    fn parse_float_exponents() {
        assert_eq!(parse_float("1e3"), 1000.0);
        assert_eq!(parse_float("2.5E-1"), 0.25);
        assert_eq!(parse_float("1e"), 1.0);
        assert_eq!(parse_float("1e+"), 1.0);
    }

    #[test]
    fn parse_float_discards_trailing_characters() {
        assert_eq!(parse_float("61.2 mg/dL"), 61.2);
        assert_eq!(parse_float("1.2.3"), 1.2);
    }

    #[test]
    fn parse_float_infinity() {
        assert_eq!(parse_float("Infinity"), f64::INFINITY);
        assert_eq!(parse_float("-Infinityx"), f64::NEG_INFINITY);
    }

    #[test]
    fn parse_float_non_numeric_is_nan() {
        assert!(parse_float("").is_nan());
        assert!(parse_float("n/a").is_nan());
        assert!(parse_float(".").is_nan());
        assert!(parse_float("-.e5").is_nan());
    }
}
