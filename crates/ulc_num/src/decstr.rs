//! Arithmetic on unbounded ASCII decimal digit strings.
//!
//! Operands are plain digit runs without sign. Leading zeros are accepted on
//! input; results never carry them, and zero is always `"0"`.

use crate::{NumError, NumResult};

/// Operands of `mul_by_small` and `add_small` must be below this bound.
pub const SMALL_OPERAND_LIMIT: u32 = 100;

fn check_digits(digits: &str) -> NumResult<&[u8]> {
    let bytes = digits.as_bytes();
    if bytes.is_empty() {
        return Err(NumError::Empty);
    }
    match bytes.iter().find(|b| !b.is_ascii_digit()) {
        Some(&bad) => Err(NumError::InvalidDigit {
            digit: bad as char,
            radix: 10,
        }),
        None => Ok(bytes),
    }
}

fn check_operand(k: u32) -> NumResult<()> {
    if k >= SMALL_OPERAND_LIMIT {
        return Err(NumError::OperandOutOfRange(k));
    }
    Ok(())
}

/// Strip leading zeros, keeping a single `0` for zero.
pub fn trim_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        if digits.is_empty() {
            digits
        } else {
            "0"
        }
    } else {
        trimmed
    }
}

/// True if the digit run denotes zero.
#[inline]
pub fn is_zero(digits: &str) -> bool {
    digits.bytes().all(|b| b == b'0')
}

/// Turn little-endian digit values into a trimmed big-endian string.
fn finish_le(mut le: Vec<u8>) -> String {
    while le.len() > 1 && le.last() == Some(&0) {
        le.pop();
    }
    if le.is_empty() {
        le.push(0);
    }
    le.iter().rev().map(|&d| (b'0' + d) as char).collect()
}

/// Multiply a little-endian digit vector by a single digit, in place.
fn mul_digit_le(le: &mut Vec<u8>, m: u8) {
    let mut carry = 0u8;
    for d in le.iter_mut() {
        // 9 * 9 + 8 fits comfortably in a byte.
        let prod = *d * m + carry;
        *d = prod % 10;
        carry = prod / 10;
    }
    if carry > 0 {
        le.push(carry);
    }
}

/// `digits * k` for `k < 100`.
///
/// `k` is split into tens and units so each partial product only ever
/// multiplies by one decimal digit. The tens partial is shifted by one place
/// and summed into the units partial.
pub fn mul_by_small(digits: &str, k: u32) -> NumResult<String> {
    let bytes = check_digits(digits)?;
    check_operand(k)?;

    if k == 0 || is_zero(digits) {
        return Ok("0".to_string());
    }
    if k == 1 {
        return Ok(trim_leading_zeros(digits).to_string());
    }

    let le: Vec<u8> = bytes.iter().rev().map(|b| b - b'0').collect();
    let (tens, units) = ((k / 10) as u8, (k % 10) as u8);

    let mut low = le.clone();
    mul_digit_le(&mut low, units);

    if tens > 0 {
        let mut high = Vec::with_capacity(le.len() + 2);
        high.push(0);
        high.extend_from_slice(&le);
        mul_digit_le(&mut high, tens);
        add_le(&mut low, &high);
    }

    Ok(finish_le(low))
}

/// `acc += other`, both little-endian.
fn add_le(acc: &mut Vec<u8>, other: &[u8]) {
    if acc.len() < other.len() {
        acc.resize(other.len(), 0);
    }
    let mut carry = 0u8;
    for (i, d) in acc.iter_mut().enumerate() {
        let sum = *d + other.get(i).copied().unwrap_or(0) + carry;
        *d = sum % 10;
        carry = sum / 10;
    }
    if carry > 0 {
        acc.push(carry);
    }
}

/// `digits + k` for `k < 100`.
pub fn add_small(digits: &str, k: u32) -> NumResult<String> {
    let bytes = check_digits(digits)?;
    check_operand(k)?;

    if k == 0 {
        return Ok(trim_leading_zeros(digits).to_string());
    }

    let mut le: Vec<u8> = bytes.iter().rev().map(|b| b - b'0').collect();
    add_le(&mut le, &[(k % 10) as u8, (k / 10) as u8]);
    Ok(finish_le(le))
}

/// Divide by 16, returning `(quotient, remainder)`.
///
/// The first step consumes two digits at once: no two-digit head exceeds
/// `99 / 16 = 6`, so the running remainder times ten plus the next digit
/// always stays below 160.
pub fn div_by_16(digits: &str) -> NumResult<(String, u8)> {
    check_digits(digits)?;
    let bytes = trim_leading_zeros(digits).as_bytes();

    if bytes.len() == 1 {
        let d = bytes[0] - b'0';
        return Ok(("0".to_string(), d));
    }

    let head = u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0');
    let rest = &bytes[2..];
    if head < 16 && rest.is_empty() {
        return Ok(("0".to_string(), head as u8));
    }

    let mut quotient = String::with_capacity(bytes.len());
    let mut rem = if head < 16 {
        head
    } else {
        quotient.push(char::from(b'0' + (head / 16) as u8));
        head % 16
    };

    for &b in rest {
        let a = rem * 10 + u32::from(b - b'0');
        quotient.push(char::from(b'0' + (a / 16) as u8));
        rem = a % 16;
    }

    if quotient.is_empty() {
        quotient.push('0');
    }
    Ok((quotient, rem as u8))
}
