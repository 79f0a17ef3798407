//! Decimal literal normalization.
//!
//! A decimal literal is split into integer digits, fraction digits and an
//! exponent. Integers keep their digits; floats are rewritten as a mantissa
//! with no leading or trailing zeros, `.DIGITS[E±exp]`, so that two
//! spellings of the same value compare equal as strings.

/// Shape of a canonical number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Integer,
    Float,
    Zero,
}

/// Positional rendering gives up beyond this many padding zeros.
pub const MAX_EXPR_PADDING: usize = 6;

/// A literal in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalNumber {
    /// Canonical text: `123`, `.314E1`, `0` or `0.`.
    pub text: String,
    pub kind: NumberKind,
    /// Significant digits without leading or trailing zeros.
    pub digits: String,
    /// For floats, the value is `0.digits * 10^exponent`. Zero for integers.
    pub exponent: i32,
    /// Bytes of the input that form the literal.
    pub consumed: usize,
    /// True for a float spelling of zero (`0.`).
    pub float_zero: bool,
}

/// Collect a run of decimal digits, allowing `separator` between digits.
fn digit_run(text: &[u8], start: usize, separator: u8, out: &mut Vec<u8>) -> usize {
    let mut i = start;
    while i < text.len() {
        let b = text[i];
        if b.is_ascii_digit() {
            out.push(b);
            i += 1;
        } else if b == separator
            && i > start
            && text[i - 1].is_ascii_digit()
            && text.get(i + 1).is_some_and(u8::is_ascii_digit)
        {
            i += 1;
        } else {
            break;
        }
    }
    i
}

/// Parse `e|E[+|-]digits` at `start`, returning the value and end offset.
/// The exponent takes no separators.
fn exponent_at(text: &[u8], start: usize) -> Option<(i32, usize)> {
    let mut i = start;
    if !matches!(text.get(i), Some(b'e' | b'E')) {
        return None;
    }
    i += 1;
    let negative = match text.get(i) {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };
    let first = i;
    let mut value: i32 = 0;
    while let Some(&b) = text.get(i).filter(|b| b.is_ascii_digit()) {
        value = value.checked_mul(10)?.checked_add(i32::from(b - b'0'))?;
        i += 1;
    }
    if i == first {
        return None;
    }
    Some((if negative { -value } else { value }, i))
}

fn exponent_has_digits(text: &[u8], start: usize) -> bool {
    let i = match text.get(start) {
        Some(b'-' | b'+') => start + 1,
        _ => start,
    };
    text.get(i).is_some_and(u8::is_ascii_digit)
}

/// Canonicalize the decimal literal at the start of `text`.
///
/// Returns `None` if `text` does not start with a digit or `.digit`, or if
/// the exponent overflows.
pub fn canonicalize_decimal(text: &[u8], separator: u8) -> Option<CanonicalNumber> {
    let mut int_digits = Vec::new();
    let mut frac_digits = Vec::new();

    let mut i = digit_run(text, 0, separator, &mut int_digits);
    let mut is_float = false;

    if text.get(i) == Some(&b'.') {
        let after = digit_run(text, i + 1, separator, &mut frac_digits);
        if int_digits.is_empty() && frac_digits.is_empty() {
            return None;
        }
        is_float = true;
        i = after;
    } else if int_digits.is_empty() {
        return None;
    }

    let mut exp = 0;
    if let Some((value, end)) = exponent_at(text, i) {
        exp = value;
        is_float = true;
        i = end;
    } else if matches!(text.get(i), Some(b'e' | b'E')) && exponent_has_digits(text, i + 1) {
        // Digits are present but the exponent does not fit.
        return None;
    }

    if !is_float {
        let first = int_digits.iter().position(|&b| b != b'0');
        return Some(match first {
            None => zero(i, false),
            Some(p) => {
                let digits: String = int_digits[p..].iter().map(|&b| b as char).collect();
                CanonicalNumber {
                    text: digits.clone(),
                    kind: NumberKind::Integer,
                    digits,
                    exponent: 0,
                    consumed: i,
                    float_zero: false,
                }
            }
        });
    }

    let mut point = i32::try_from(int_digits.len()).ok()?;
    let mut mantissa = int_digits;
    mantissa.extend_from_slice(&frac_digits);

    let Some(lead) = mantissa.iter().position(|&b| b != b'0') else {
        return Some(zero(i, true));
    };
    point -= i32::try_from(lead).ok()?;
    let tail = mantissa.iter().rposition(|&b| b != b'0').map_or(lead, |p| p + 1);
    let digits: String = mantissa[lead..tail].iter().map(|&b| b as char).collect();
    let exponent = point.checked_add(exp)?;

    let text = if exponent == 0 {
        format!(".{digits}")
    } else {
        format!(".{digits}E{exponent}")
    };
    Some(CanonicalNumber {
        text,
        kind: NumberKind::Float,
        digits,
        exponent,
        consumed: i,
        float_zero: false,
    })
}

fn zero(consumed: usize, float_zero: bool) -> CanonicalNumber {
    CanonicalNumber {
        text: if float_zero { "0." } else { "0" }.to_string(),
        kind: NumberKind::Zero,
        digits: "0".to_string(),
        exponent: 0,
        consumed,
        float_zero,
    }
}

/// Positional rendering of a canonical number (`.314E1` becomes `3.14`).
///
/// Returns `None` when more than [`MAX_EXPR_PADDING`] zeros would be needed.
pub fn general_expr(number: &CanonicalNumber) -> Option<String> {
    if number.kind != NumberKind::Float {
        return Some(number.text.clone());
    }

    let digits = number.digits.as_str();
    let n = digits.len();
    let m = number.exponent;

    if m > 0 {
        let m = m as usize;
        if m >= n {
            let pad = m - n;
            (pad <= MAX_EXPR_PADDING).then(|| format!("{digits}{}.", "0".repeat(pad)))
        } else {
            Some(format!("{}.{}", &digits[..m], &digits[m..]))
        }
    } else {
        let pad = m.unsigned_abs() as usize;
        (pad <= MAX_EXPR_PADDING).then(|| format!(".{}{digits}", "0".repeat(pad)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canon(s: &str) -> String {
        canonicalize_decimal(s.as_bytes(), b'_').unwrap().text
    }

    #[test]
    fn test_float_normalization() {
        assert_eq!(canon("504100.E-2"), ".5041E4");
        assert_eq!(canon("1e3"), ".1E4");
        assert_eq!(canon("0.05"), ".5E-1");
        assert_eq!(canon("3.14"), ".314E1");
        assert_eq!(canon("100.0"), ".1E3");
        assert_eq!(canon(".5"), ".5");
        assert_eq!(canon("0.5"), ".5");
    }

    #[test]
    fn test_integer_and_zero() {
        assert_eq!(canon("00120"), "120");
        assert_eq!(canon("1_000_000"), "1000000");
        assert_eq!(canon("000"), "0");
        assert_eq!(canon("0.000"), "0.");
        assert_eq!(canon("0e5"), "0.");

        let n = canonicalize_decimal(b"0.0", b'_').unwrap();
        assert_eq!(n.kind, NumberKind::Zero);
        assert!(n.float_zero);
    }

    #[test]
    fn test_consumed_stops_at_literal_end() {
        let n = canonicalize_decimal(b"42abc", b'_').unwrap();
        assert_eq!((n.text.as_str(), n.consumed), ("42", 2));

        // A dangling exponent marker is not part of the literal.
        let n = canonicalize_decimal(b"2.5e+x", b'_').unwrap();
        assert_eq!((n.text.as_str(), n.consumed), (".25E1", 3));

        // Separators are not allowed inside the exponent.
        let n = canonicalize_decimal(b"1e1_0", b'_').unwrap();
        assert_eq!(n.consumed, 3);
    }

    #[test]
    fn test_rejects_non_numbers() {
        assert!(canonicalize_decimal(b"abc", b'_').is_none());
        assert!(canonicalize_decimal(b".", b'_').is_none());
        assert!(canonicalize_decimal(b"_1", b'_').is_none());
        assert!(canonicalize_decimal(b"1e99999999999", b'_').is_none());
        assert!(canonicalize_decimal(b"1e-99999999999", b'_').is_none());
        assert!(canonicalize_decimal(b"2.5E+99999999999", b'_').is_none());
    }

    #[test]
    fn test_general_expr() {
        let expr = |s: &str| general_expr(&canonicalize_decimal(s.as_bytes(), b'_').unwrap());
        assert_eq!(expr("3.14").as_deref(), Some("3.14"));
        assert_eq!(expr("100.0").as_deref(), Some("100."));
        assert_eq!(expr("0.05").as_deref(), Some(".05"));
        assert_eq!(expr("0.5").as_deref(), Some(".5"));
        assert_eq!(expr("42").as_deref(), Some("42"));
        assert_eq!(expr("1e6").as_deref(), Some("1000000."));
        assert_eq!(expr("1e7"), None);
        assert_eq!(expr("1e-7").as_deref(), Some(".0000001"));
        assert_eq!(expr("1e-8"), None);
    }
}
