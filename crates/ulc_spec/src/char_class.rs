//! Per-byte character classes and wide identifier ranges.

use bitflags::bitflags;
use serde::Serialize;
use ulc_core::chars::{is_digit, is_graph, MAX_ASCII};

/// Number of entries in the byte table.
pub const TABLE_SIZE: usize = MAX_ASCII as usize + 1;

bitflags! {
    /// Role of an ASCII byte in the lexicon.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct CharClass: u8 {
        /// May start a number.
        const DIGIT       = 0x01;
        /// Is a token by itself.
        const SINGLE_CHAR = 0x02;
        /// Starts a multi-char token.
        const TWO_PLUS    = 0x04;
        /// Starts a quote mark.
        const QUOTE       = 0x08;
        const ID_FIRST    = 0x10;
        const ID          = 0x20;
        /// Starts a comment mark.
        const COMMENT     = 0x80;
    }
}

/// An inclusive code point range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CharRange {
    pub first: u32,
    pub last: u32,
}

impl CharRange {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    #[inline]
    pub fn contains(&self, cp: u32) -> bool {
        self.first <= cp && cp <= self.last
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharClassTable {
    table: Vec<CharClass>,
    id_first_ranges: Vec<CharRange>,
    id_ranges: Vec<CharRange>,
}

impl Default for CharClassTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CharClassTable {
    /// Digits start numbers, other graphic chars are single-char tokens,
    /// controls have no role. `-` and `.` may also start a number.
    pub fn new() -> Self {
        let mut table: Vec<CharClass> = (0..TABLE_SIZE as u8)
            .map(|b| {
                if is_digit(b) {
                    CharClass::DIGIT
                } else if is_graph(b) {
                    CharClass::SINGLE_CHAR
                } else {
                    CharClass::empty()
                }
            })
            .collect();
        table[usize::from(b'-')] |= CharClass::DIGIT;
        table[usize::from(b'.')] |= CharClass::DIGIT;

        Self {
            table,
            id_first_ranges: Vec::new(),
            id_ranges: Vec::new(),
        }
    }

    /// Class of `b`; bytes outside the table have none.
    #[inline]
    pub fn class_of(&self, b: u8) -> CharClass {
        self.table.get(usize::from(b)).copied().unwrap_or_else(CharClass::empty)
    }

    pub fn contains(&self, b: u8, class: CharClass) -> bool {
        self.class_of(b).contains(class)
    }

    pub fn insert(&mut self, b: u8, class: CharClass) {
        if let Some(slot) = self.table.get_mut(usize::from(b)) {
            slot.insert(class);
        }
    }

    pub fn remove(&mut self, b: u8, class: CharClass) {
        if let Some(slot) = self.table.get_mut(usize::from(b)) {
            slot.remove(class);
        }
    }

    /// Clear `class` from the byte a token id denotes, if it denotes one.
    pub fn remove_at_id(&mut self, id: i32, class: CharClass) {
        if let Ok(b) = u8::try_from(id) {
            self.remove(b, class);
        }
    }

    pub fn id_first_ranges(&self) -> &[CharRange] {
        &self.id_first_ranges
    }

    pub fn id_ranges(&self) -> &[CharRange] {
        &self.id_ranges
    }

    pub(crate) fn set_id_first_ranges(&mut self, ranges: Vec<CharRange>) {
        self.id_first_ranges = ranges;
    }

    pub(crate) fn set_id_ranges(&mut self, ranges: Vec<CharRange>) {
        self.id_ranges = ranges;
    }

    /// Whether `cp` may start an identifier.
    ///
    /// ASCII consults the table. Wider code points scan the configured
    /// ranges and, with none configured, the Unicode `XID_Start` class.
    pub fn is_id_first(&self, cp: u32) -> bool {
        match u8::try_from(cp) {
            Ok(b) if b <= MAX_ASCII => self.contains(b, CharClass::ID_FIRST),
            _ => wide_lookup(&self.id_first_ranges, cp, unicode_xid::UnicodeXID::is_xid_start),
        }
    }

    /// Whether `cp` may continue an identifier.
    pub fn is_id(&self, cp: u32) -> bool {
        match u8::try_from(cp) {
            Ok(b) if b <= MAX_ASCII => self.contains(b, CharClass::ID),
            _ => wide_lookup(&self.id_ranges, cp, unicode_xid::UnicodeXID::is_xid_continue),
        }
    }

    /// Bytes carrying any of `class`, ascending.
    pub fn bytes_with(&self, class: CharClass) -> impl Iterator<Item = u8> + '_ {
        (0..TABLE_SIZE as u8).filter(move |&b| self.class_of(b).intersects(class))
    }
}

fn wide_lookup(ranges: &[CharRange], cp: u32, fallback: fn(char) -> bool) -> bool {
    if ranges.is_empty() {
        char::from_u32(cp).is_some_and(fallback)
    } else {
        ranges.iter().any(|r| r.contains(cp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_table() {
        let t = CharClassTable::new();
        assert_eq!(t.class_of(b'7'), CharClass::DIGIT);
        assert_eq!(t.class_of(b'+'), CharClass::SINGLE_CHAR);
        assert_eq!(t.class_of(b'-'), CharClass::SINGLE_CHAR | CharClass::DIGIT);
        assert_eq!(t.class_of(b'\n'), CharClass::empty());
        assert_eq!(t.class_of(0xC3), CharClass::empty());
        assert!(!t.is_id_first(u32::from(b'a')));
    }

    #[test]
    fn test_wide_lookup_prefers_ranges() {
        let mut t = CharClassTable::new();
        assert!(t.is_id_first(0xAC00));
        assert!(!t.is_id_first(0x2200));

        t.set_id_first_ranges(vec![CharRange::new(0x2200, 0x22FF)]);
        assert!(t.is_id_first(0x2200));
        assert!(!t.is_id_first(0xAC00));
        assert!(t.is_id(0xAC00));
    }

    #[test]
    fn test_remove_at_id_ignores_negative_ids() {
        let mut t = CharClassTable::new();
        t.remove_at_id(-1, CharClass::SINGLE_CHAR);
        t.remove_at_id(b'#' as i32, CharClass::SINGLE_CHAR);
        assert!(!t.contains(b'#', CharClass::SINGLE_CHAR));
        assert!(t.contains(b'$', CharClass::SINGLE_CHAR));
    }

    #[test]
    fn test_bytes_with() {
        let mut t = CharClassTable::new();
        t.insert(b'"', CharClass::QUOTE);
        t.insert(b'\'', CharClass::QUOTE);
        let quotes: Vec<u8> = t.bytes_with(CharClass::QUOTE).collect();
        assert_eq!(quotes, vec![b'"', b'\'']);
    }
}
