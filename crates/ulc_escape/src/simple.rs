//! Fixed escape decoders used while reading spec text itself.
//!
//! These do not depend on any escape map: `decode_simple` understands the
//! classic single-letter escapes plus `\xHH`, and `decode_escaped` adds
//! octal and unicode escapes with UTF-8 output.

use crate::{EscapeError, EscapeResult};
use ulc_core::chars::{digit_value, encode_utf8};

/// The byte denoted by a single-letter escape, if it is one.
pub fn simple_escape_char(ch: u8) -> Option<u8> {
    Some(match ch {
        b'n' => b'\n',
        b't' => b'\t',
        b'r' => b'\r',
        b'\\' => b'\\',
        b'\'' => b'\'',
        b'"' => b'"',
        b'?' => b'?',
        b'b' => 0x08,
        b'a' => 0x07,
        b'f' => 0x0C,
        b'v' => 0x0B,
        _ => return None,
    })
}

/// Where a decoded run stopped.
fn end_of_input(escape: bool, quote: Option<u8>, out: &mut Vec<u8>) -> EscapeResult<()> {
    if escape {
        out.push(b'\\');
        Ok(())
    } else if quote.is_some() {
        Err(EscapeError::UnterminatedQuote)
    } else {
        Ok(())
    }
}

/// Decode `input` with the simple escapes.
///
/// With `quote`, decoding stops after the closing quote, which is consumed
/// but not emitted; running out of input first is an error. Without it the
/// whole input is decoded. Unknown escapes are kept verbatim, backslash
/// included. Returns the bytes and the count of input bytes consumed.
pub fn decode_simple(input: &[u8], quote: Option<u8>) -> EscapeResult<(Vec<u8>, usize)> {
    let mut out = Vec::with_capacity(input.len());
    let mut escape = false;
    let mut i = 0;

    loop {
        let Some(&ch) = input.get(i) else {
            end_of_input(escape, quote, &mut out)?;
            break;
        };

        if escape {
            if ch == b'x' {
                let mut value = 0u8;
                let mut n = 0;
                while n < 2 {
                    match input.get(i + 1 + n).and_then(|&b| digit_value(b, 16)) {
                        Some(d) => value = value * 16 + d as u8,
                        None => break,
                    }
                    n += 1;
                }
                if n == 0 {
                    return Err(EscapeError::MissingHexDigits);
                }
                out.push(value);
                i += n;
            } else if let Some(b) = simple_escape_char(ch) {
                out.push(b);
            } else {
                out.extend_from_slice(&[b'\\', ch]);
            }
            escape = false;
        } else if Some(ch) == quote {
            i += 1;
            break;
        } else if ch == b'\\' {
            escape = true;
        } else {
            out.push(ch);
        }
        i += 1;
    }

    Ok((out, i))
}

/// Decode the escape whose letter starts `input` (the byte right after the
/// backslash).
///
/// - `x` takes up to 2 hex digits, `u` up to 4, `U` up to 8;
/// - `0` starts an octal escape of up to 3 more digits, `1`..`7` of up to 2;
/// - other letters fall back to [`simple_escape_char`].
///
/// Returns the code point and the bytes consumed, letter included, or `None`
/// for an unknown escape.
pub fn litstr_escape(input: &[u8]) -> Option<(u32, usize)> {
    let &letter = input.first()?;
    let (radix, max_digits, seed) = match letter {
        b'x' => (16, 2, 0),
        b'u' => (16, 4, 0),
        b'U' => (16, 8, 0),
        b'0' => (8, 3, 0),
        b'1'..=b'7' => (8, 2, u32::from(letter - b'0')),
        _ => return simple_escape_char(letter).map(|b| (u32::from(b), 1)),
    };

    let mut value = seed;
    let mut n = 0;
    while n < max_digits {
        match input.get(1 + n).and_then(|&b| digit_value(b, radix)) {
            Some(d) => value = value.wrapping_mul(radix).wrapping_add(d),
            None => break,
        }
        n += 1;
    }
    Some((value, 1 + n))
}

/// Decode `input` with [`litstr_escape`], UTF-8 encoding each escape.
///
/// Quote handling matches [`decode_simple`]. Unknown escapes are kept
/// verbatim.
pub fn decode_escaped(input: &[u8], quote: Option<u8>) -> EscapeResult<(Vec<u8>, usize)> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    loop {
        let Some(&ch) = input.get(i) else {
            end_of_input(false, quote, &mut out)?;
            break;
        };

        if Some(ch) == quote {
            i += 1;
            break;
        }
        if ch != b'\\' {
            out.push(ch);
            i += 1;
            continue;
        }

        let rest = &input[i + 1..];
        match litstr_escape(rest) {
            Some((cp, used)) => {
                let (bytes, n) = encode_utf8(cp).ok_or(EscapeError::InvalidCodePoint(cp))?;
                out.extend_from_slice(&bytes[..n]);
                i += 1 + used;
            }
            None => match rest.first() {
                Some(&next) => {
                    out.extend_from_slice(&[b'\\', next]);
                    i += 2;
                }
                None => {
                    end_of_input(true, None, &mut out)?;
                    i += 1;
                }
            },
        }
    }

    Ok((out, i))
}
