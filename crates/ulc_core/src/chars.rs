//! Byte-level character helpers.
//!
//! Spec text is processed as bytes; these helpers classify ASCII bytes the
//! way the C locale does and convert between code points and UTF-8.

/// Byte-order mark that must open every spec file.
pub const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";

/// Largest value handled by the single-byte classification table.
pub const MAX_ASCII: u8 = 0x7F;

/// Printable, non-space ASCII.
#[inline]
pub fn is_graph(b: u8) -> bool {
    b.is_ascii_graphic()
}

#[inline]
pub fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

/// Check if a byte is an octal digit (0-7).
#[inline]
pub fn is_octal_digit(b: u8) -> bool {
    matches!(b, b'0'..=b'7')
}

#[inline]
pub fn is_hex_digit(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

/// Space or tab.
#[inline]
pub fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Value of `b` as a digit in `radix` (2..=36), case-insensitive.
#[inline]
pub fn digit_value(b: u8, radix: u32) -> Option<u32> {
    (b as char).to_digit(radix)
}

/// Upper-case digit character for `value` (< 36).
#[inline]
pub fn digit_char(value: u32) -> u8 {
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ"[value as usize]
}

/// Encode a code point as UTF-8, returning the bytes and their count.
pub fn encode_utf8(cp: u32) -> Option<([u8; 4], usize)> {
    let ch = char::from_u32(cp)?;
    let mut out = [0u8; 4];
    let n = ch.encode_utf8(&mut out).len();
    Some((out, n))
}

/// Number of bytes of the UTF-8 sequence introduced by `lead`.
#[inline]
pub fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Decode the first code point of `bytes`, returning it with its length.
pub fn decode_utf8(bytes: &[u8]) -> Option<(u32, usize)> {
    let n = utf8_len(*bytes.first()?)?;
    let seq = bytes.get(..n)?;
    let ch = simdutf8::basic::from_utf8(seq).ok()?.chars().next()?;
    Some((ch as u32, n))
}

/// Strip leading spaces and tabs.
#[inline]
pub fn skip_blanks(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&b| !is_blank(b)).unwrap_or(s.len());
    &s[start..]
}

/// Strip trailing whitespace including CR/LF.
#[inline]
pub fn trim_end(s: &[u8]) -> &[u8] {
    let end = s
        .iter()
        .rposition(|&b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &s[..end]
}

/// Split off the next blank-delimited word, returning `(word, rest)`.
/// The word is empty once the input is exhausted.
pub fn split_word(s: &[u8]) -> (&[u8], &[u8]) {
    let s = skip_blanks(s);
    let end = s.iter().position(|&b| is_blank(b)).unwrap_or(s.len());
    (&s[..end], skip_blanks(&s[end..]))
}
