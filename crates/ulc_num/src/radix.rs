//! Radix canonicalization.
//!
//! Three paths, picked per call:
//! - a native `u64` fast path when the digit count cannot overflow;
//! - bit regrouping for radix 2, 4 and 8, which map onto whole hex nibbles;
//! - a decimal-string path (`acc = acc * radix + d`, then repeated division
//!   by 16) for everything else.

use crate::decstr::{add_small, div_by_16, is_zero, mul_by_small, trim_leading_zeros};
use crate::{NumError, NumResult};
use ulc_core::chars::{digit_char, digit_value};
use ulc_core::GrowableBuffer;

pub const MIN_RADIX: u32 = 2;
pub const MAX_RADIX: u32 = 36;

/// Largest digit counts that always fit in a `u64`, indexed by `radix - 1`
/// for radix up to 8.
const FAST_PATH_DIGITS: [usize; 8] = [0, 64, 32, 32, 21, 21, 21, 21];

/// Number of digits in `radix` guaranteed to fit a `u64`.
pub fn fast_path_limit(radix: u32) -> usize {
    match radix {
        0 => 0,
        1..=8 => FAST_PATH_DIGITS[radix as usize - 1],
        9..=16 => 16,
        17..=32 => 12,
        _ => 10,
    }
}

#[inline]
pub fn fits_native(n_digits: usize, radix: u32) -> bool {
    n_digits <= fast_path_limit(radix)
}

fn check_radix(radix: u32) -> NumResult<()> {
    if (MIN_RADIX..=MAX_RADIX).contains(&radix) {
        Ok(())
    } else {
        Err(NumError::InvalidRadix(radix))
    }
}

/// Digit values of `digits` in `radix`, most significant first.
fn digit_values(digits: &[u8], radix: u32) -> NumResult<Vec<u32>> {
    if digits.is_empty() {
        return Err(NumError::Empty);
    }
    digits
        .iter()
        .map(|&b| {
            digit_value(b, radix).ok_or(NumError::InvalidDigit {
                digit: b as char,
                radix,
            })
        })
        .collect()
}

/// Evaluate digit values into a `u64`, or `None` on overflow.
fn native_value(values: &[u32], radix: u32) -> Option<u64> {
    values.iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(u64::from(radix))?.checked_add(u64::from(d))
    })
}

/// Render `value` in `radix` with upper-case digits.
fn render_native(mut value: u64, radix: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(64);
    while value > 0 {
        out.push(digit_char((value % u64::from(radix)) as u32));
        value /= u64::from(radix);
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Bits carried by one digit of a power-of-two radix that regroups cleanly.
fn bits_per_digit(radix: u32) -> Option<u32> {
    match radix {
        2 => Some(1),
        4 => Some(2),
        8 => Some(3),
        _ => None,
    }
}

/// Regroup radix-2^bits digits into hex nibbles, least significant first.
///
/// The leading partial group (when the bit count is not a multiple of four)
/// falls out naturally as the last nibble emitted.
fn regroup_to_hex(values: &[u32], bits: u32, out: &mut Vec<u8>) {
    let mut acc = 0u32;
    let mut n_bits = 0u32;
    for &d in values.iter().rev() {
        acc |= d << n_bits;
        n_bits += bits;
        while n_bits >= 4 {
            out.push(digit_char(acc & 0xF));
            acc >>= 4;
            n_bits -= 4;
        }
    }
    if n_bits > 0 {
        out.push(digit_char(acc));
    }
}

/// Strip leading zeros from a most-significant-first byte run.
fn trim_zeros_bytes(digits: &[u8]) -> &[u8] {
    let start = digits.iter().position(|&b| b != b'0').unwrap_or(digits.len());
    if start == digits.len() {
        b"0"
    } else {
        &digits[start..]
    }
}

/// Converts numeric literals between radixes.
///
/// Holds a scratch buffer so repeated conversions reuse one allocation.
#[derive(Debug, Default)]
pub struct RadixConverter {
    scratch: Vec<u8>,
}

impl RadixConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the canonical upper-case hex form of `digits` (in `radix`) to
    /// `out`, returning the number of bytes written.
    ///
    /// Any all-zero literal yields `"0"`.
    pub fn hex_into(
        &mut self,
        digits: &[u8],
        radix: u32,
        out: &mut GrowableBuffer,
    ) -> NumResult<usize> {
        check_radix(radix)?;
        let values = digit_values(digits, radix)?;
        self.scratch.clear();

        if values.iter().all(|&d| d == 0) {
            out.push(b'0');
            return Ok(1);
        }

        if radix == 16 {
            let hex = trim_zeros_bytes(digits);
            self.scratch.extend(hex.iter().map(u8::to_ascii_uppercase));
            out.append(&self.scratch);
            return Ok(self.scratch.len());
        }

        if let Some(bits) = bits_per_digit(radix) {
            regroup_to_hex(&values, bits, &mut self.scratch);
            return Ok(self.flush_reversed(out));
        }

        if fits_native(values.len(), radix) {
            if let Some(value) = native_value(&values, radix) {
                let hex = render_native(value, 16);
                out.append_str(&hex);
                return Ok(hex.len());
            }
        }

        tracing::trace!(radix, len = values.len(), "decimal-string radix path");
        let mut acc = decimal_of_values(&values, radix)?;
        while !is_zero(&acc) {
            let (quotient, rem) = div_by_16(&acc)?;
            self.scratch.push(digit_char(u32::from(rem)));
            acc = quotient;
        }
        Ok(self.flush_reversed(out))
    }

    /// Canonical hex string of `digits` in `radix`.
    pub fn hex_of(&mut self, digits: &[u8], radix: u32) -> NumResult<String> {
        let mut out = GrowableBuffer::new(32);
        self.hex_into(digits, radix, &mut out)?;
        Ok(buffer_to_string(out))
    }

    /// Unbounded decimal rendering of `digits` in `radix`.
    pub fn to_decimal(&mut self, digits: &[u8], radix: u32) -> NumResult<String> {
        check_radix(radix)?;
        let values = digit_values(digits, radix)?;
        if radix == 10 {
            let text: String = digits.iter().map(|&b| b as char).collect();
            return Ok(trim_leading_zeros(&text).to_string());
        }
        if fits_native(values.len(), radix) {
            if let Some(value) = native_value(&values, radix) {
                return Ok(value.to_string());
            }
        }
        decimal_of_values(&values, radix)
    }

    /// Drain the little-endian scratch into `out` in reading order.
    fn flush_reversed(&mut self, out: &mut GrowableBuffer) -> usize {
        while self.scratch.len() > 1 && self.scratch.last() == Some(&b'0') {
            self.scratch.pop();
        }
        self.scratch.reverse();
        out.append(&self.scratch);
        self.scratch.len()
    }
}

fn decimal_of_values(values: &[u32], radix: u32) -> NumResult<String> {
    let mut acc = String::from("0");
    for &d in values {
        acc = add_small(&mul_by_small(&acc, radix)?, d)?;
    }
    Ok(acc)
}

fn buffer_to_string(mut buf: GrowableBuffer) -> String {
    // Only ASCII digits are ever written.
    buf.export().into_iter().map(char::from).collect()
}

/// Append the canonical hex form of `digits` to `out`.
pub fn to_hex(digits: &[u8], radix: u32, out: &mut GrowableBuffer) -> NumResult<usize> {
    RadixConverter::new().hex_into(digits, radix, out)
}

/// Canonical hex string of `digits` in `radix`.
pub fn hex_of(digits: &str, radix: u32) -> NumResult<String> {
    RadixConverter::new().hex_of(digits.as_bytes(), radix)
}

/// Canonical decimal string of `digits` in `radix`.
pub fn radix_to_decimal(digits: &str, radix: u32) -> NumResult<String> {
    RadixConverter::new().to_decimal(digits.as_bytes(), radix)
}

/// Convert between two radixes through a `u64`.
///
/// Fails with [`NumError::Overflow`] when the value needs more than 64 bits.
pub fn radix_to_radix_simple(digits: &str, from: u32, to: u32) -> NumResult<String> {
    check_radix(from)?;
    check_radix(to)?;
    let values = digit_values(digits.as_bytes(), from)?;
    native_value(&values, from)
        .map(|v| render_native(v, to))
        .ok_or(NumError::Overflow { radix: from, digits: values.len() })
}

/// Extract the digit run at the start of `text`.
///
/// `separator` may appear between two digits and is dropped. A doubled or
/// trailing separator ends the run before it. Digits are upper-cased and
/// leading zeros collapsed. Returns the digits and the number of bytes
/// consumed.
pub fn strip_radix_digits(text: &[u8], radix: u32, separator: u8) -> NumResult<(String, usize)> {
    check_radix(radix)?;
    let mut digits = String::new();
    let mut consumed = 0;
    let mut i = 0;

    while i < text.len() {
        let b = text[i];
        if digit_value(b, radix).is_some() {
            digits.push(b.to_ascii_uppercase() as char);
            i += 1;
            consumed = i;
        } else if b == separator
            && !digits.is_empty()
            && text.get(i + 1).is_some_and(|&n| digit_value(n, radix).is_some())
        {
            i += 1;
        } else {
            break;
        }
    }

    if digits.is_empty() {
        return Err(NumError::Empty);
    }
    Ok((trim_leading_zeros(&digits).to_string(), consumed))
}

/// Render a prefixed integer literal (`0x`, `0o`, `0b`, `0q`, or plain
/// decimal) as `0x` followed by canonical hex. A leading `-` is carried over
/// unless the value is zero. `_` is accepted between digits.
pub fn prefixed_to_hex(text: &str) -> NumResult<String> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let bytes = body.as_bytes();
    let (radix, digits) = match bytes {
        [b'0', p, rest @ ..] if !rest.is_empty() => match p.to_ascii_lowercase() {
            b'x' => (16, rest),
            b'o' => (8, rest),
            b'b' => (2, rest),
            b'q' => (4, rest),
            _ => (10, bytes),
        },
        _ => (10, bytes),
    };

    let (run, consumed) = strip_radix_digits(digits, radix, b'_')?;
    if let Some(&bad) = digits.get(consumed) {
        return Err(NumError::InvalidDigit { digit: bad as char, radix });
    }

    let hex = RadixConverter::new().hex_of(run.as_bytes(), radix)?;
    let sign = if negative && hex != "0" { "-" } else { "" };
    Ok(format!("{sign}0x{hex}"))
}
