//! Comment and quote types.

use crate::error::SpecErrorKind;
use bitflags::bitflags;
use serde::Serialize;
use ulc_core::chars::is_graph;
use ulc_escape::{decode_escaped, EscapeMap, EscapeResult};

pub const MAX_MARK_LEN: usize = 15;
pub const MAX_COMMENT_TYPES: usize = 4;
pub const MAX_QUOTE_TYPES: usize = 8;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct CommentFlags: u8 {
        /// Ends at the end of line.
        const ONELINE = 0x01;
        /// Only starts at the beginning of a line.
        const COLUMN0 = 0x02;
        const NESTED  = 0x04;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct QuoteFlags: u8 {
        /// The end mark differs from the start mark.
        const ASYMMETRIC      = 0x01;
        /// The mark alone is the token, with no body.
        const NOTHING         = 0x02;
        /// The body runs to the end of line.
        const OPEN            = 0x04;
        const MULTILINE       = 0x08;
        const RIGHT_EXCLUSIVE = 0x10;
    }
}

fn count_line_feeds(mark: &str) -> u32 {
    memchr::memchr_iter(b'\n', mark.as_bytes()).count() as u32
}

/// Decode a mark word and check its characters.
///
/// Marks are at most [`MAX_MARK_LEN`] bytes of graphic ASCII or line feeds,
/// plus tabs where `allow_tab` is set.
pub fn decode_mark(word: &[u8], what: &'static str, allow_tab: bool) -> Result<String, SpecErrorKind> {
    let invalid = || SpecErrorKind::InvalidMark {
        what,
        mark: String::from_utf8_lossy(word).into_owned(),
    };

    let (bytes, _) = decode_escaped(word, None)?;
    if bytes.is_empty() {
        return Err(invalid());
    }
    if bytes.len() > MAX_MARK_LEN {
        return Err(SpecErrorKind::MarkTooLong {
            what,
            mark: String::from_utf8_lossy(word).into_owned(),
        });
    }
    let allowed = |b: u8| is_graph(b) || b == b'\n' || (allow_tab && b == b'\t');
    if !bytes.iter().all(|&b| allowed(b)) {
        return Err(invalid());
    }
    String::from_utf8(bytes).map_err(|_| invalid())
}

/// A start/end mark pair kept in a [`MarkerSet`].
pub trait Marker {
    const WHAT: &'static str;
    const PLURAL: &'static str;
    const MAX: usize;

    fn start(&self) -> &str;

    /// The start mark as written in the directive; the key for replacement.
    fn key(&self) -> &str {
        self.start()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentType {
    pub start: String,
    pub end: String,
    pub flags: CommentFlags,
    pub line_feeds: u32,
}

impl CommentType {
    /// A column-0 comment gets a line feed in front of its start mark.
    pub fn new(start: &str, end: &str, flags: CommentFlags) -> Self {
        let start = if flags.contains(CommentFlags::COLUMN0) {
            format!("\n{start}")
        } else {
            start.to_string()
        };
        let line_feeds = count_line_feeds(&start) + count_line_feeds(end);
        Self {
            start,
            end: end.to_string(),
            flags,
            line_feeds,
        }
    }
}

impl Marker for CommentType {
    const WHAT: &'static str = "comment";
    const PLURAL: &'static str = "comment types";
    const MAX: usize = MAX_COMMENT_TYPES;

    fn start(&self) -> &str {
        &self.start
    }

    fn key(&self) -> &str {
        if self.flags.contains(CommentFlags::COLUMN0) {
            self.start.strip_prefix('\n').unwrap_or(&self.start)
        } else {
            &self.start
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteType {
    pub start: String,
    pub end: String,
    pub flags: QuoteFlags,
    pub tok_id: i32,
    pub token_name: Option<String>,
    /// Line feeds in the start mark.
    pub left_line_feeds: u32,
    /// Line feeds in both marks.
    pub line_feeds: u32,
    pub escmap: EscapeMap,
}

impl QuoteType {
    pub fn new(start: String, end: String, flags: QuoteFlags, tok_id: i32, escmap: EscapeMap) -> Self {
        let left_line_feeds = count_line_feeds(&start);
        let line_feeds = left_line_feeds + count_line_feeds(&end);
        Self {
            start,
            end,
            flags,
            tok_id,
            token_name: None,
            left_line_feeds,
            line_feeds,
            escmap,
        }
    }

    /// Whether the literal has a body to decode.
    pub fn has_body(&self) -> bool {
        !self.flags.contains(QuoteFlags::NOTHING)
    }

    /// Decode a literal body with this quote type's escape map.
    pub fn decode(&self, body: &[u8]) -> EscapeResult<Vec<u8>> {
        self.escmap.decode_quoted(body)
    }
}

impl Marker for QuoteType {
    const WHAT: &'static str = "quote";
    const PLURAL: &'static str = "quote types";
    const MAX: usize = MAX_QUOTE_TYPES;

    fn start(&self) -> &str {
        &self.start
    }
}

/// Bounded list of markers with unique start marks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MarkerSet<T> {
    items: Vec<T>,
}

impl<T> Default for MarkerSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Marker> MarkerSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|m| m.key() == key)
    }

    /// Replace the marker with the same key in place, or append.
    ///
    /// Returns the slot index, which stays stable across replacements.
    pub fn upsert(&mut self, item: T) -> Result<usize, SpecErrorKind> {
        if let Some(index) = self.position(item.key()) {
            self.items[index] = item;
            return Ok(index);
        }
        self.push(item)
    }

    /// Append without looking for an existing key.
    pub fn push(&mut self, item: T) -> Result<usize, SpecErrorKind> {
        if self.items.len() >= T::MAX {
            return Err(SpecErrorKind::TooMany {
                what: T::PLURAL,
                max: T::MAX,
            });
        }
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    /// The marker at `index` must not share its start mark with another.
    pub fn check_start_at(&self, index: usize) -> Result<(), SpecErrorKind> {
        let Some(item) = self.items.get(index) else {
            return Ok(());
        };
        let collides = self
            .items
            .iter()
            .enumerate()
            .any(|(i, other)| i != index && other.start() == item.start());
        if collides {
            return Err(SpecErrorKind::MarkCollision {
                what: T::WHAT,
                mark: item.start().to_string(),
            });
        }
        Ok(())
    }

    pub fn check_unique_starts(&self) -> Result<(), SpecErrorKind> {
        (0..self.items.len()).try_for_each(|i| self.check_start_at(i))
    }

    /// Whether `mark` is a prefix of some start mark in this set.
    pub fn has_start_prefixed_by(&self, mark: &str) -> bool {
        !mark.is_empty() && self.items.iter().any(|m| m.start().starts_with(mark))
    }
}

impl<'a, T> IntoIterator for &'a MarkerSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Reject comment marks that open a quote and quote marks that open a
/// comment; the scanner could not tell them apart.
pub fn check_cross_containment(
    comments: &MarkerSet<CommentType>,
    quotes: &MarkerSet<QuoteType>,
) -> Result<(), SpecErrorKind> {
    if let Some(c) = comments.iter().find(|c| quotes.has_start_prefixed_by(&c.start)) {
        return Err(SpecErrorKind::CommentInQuote(c.start.clone()));
    }
    if let Some(q) = quotes.iter().find(|q| comments.has_start_prefixed_by(&q.start)) {
        return Err(SpecErrorKind::QuoteInComment(q.start.clone()));
    }
    Ok(())
}
