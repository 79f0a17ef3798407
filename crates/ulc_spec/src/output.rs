//! The compiled lexicon handed to the scanner.

use crate::builder::{IdMaxLength, LexFlags, NumberPrefix, PrependInput, SpecBuilder};
use crate::char_class::{CharClass, CharClassTable};
use crate::header::SpecVersion;
use crate::marker::{CommentType, MarkerSet, QuoteType};
use crate::tokdef::{KeywordDef, ReservedToken, TokenRegistry, TokenView};
use serde::Serialize;
use ulc_num::{canonicalize_decimal, strip_radix_digits, NumError, NumResult, RadixConverter};

/// A number literal in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLiteral {
    /// `0x`-prefixed hex for prefixed literals, canonical decimal otherwise.
    pub text: String,
    pub radix: u32,
    pub suffix: Option<String>,
    /// Input bytes consumed, suffix included.
    pub consumed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledSpec {
    pub name: String,
    pub version: SpecVersion,
    pub flags: LexFlags,
    pub chars: CharClassTable,
    pub id_max_length: Option<IdMaxLength>,
    pub decimal_separator: char,
    pub number_prefixes: Vec<NumberPrefix>,
    pub number_suffixes: Vec<String>,
    pub comment_types: MarkerSet<CommentType>,
    pub quote_types: MarkerSet<QuoteType>,
    pub tokens: TokenRegistry,
    pub prepend_input: Option<PrependInput>,
    pub tok_id_min: i32,
    pub tok_id_max: i32,
}

impl CompiledSpec {
    pub(crate) fn from_builder(name: &str, version: SpecVersion, b: SpecBuilder<'_>) -> Self {
        Self {
            name: name.to_string(),
            version,
            flags: b.flags,
            chars: b.chars,
            id_max_length: b.id_max_length,
            decimal_separator: char::from(b.decimal_separator),
            number_prefixes: b.prefixes,
            number_suffixes: b.suffixes,
            comment_types: b.comments,
            quote_types: b.quotes,
            tokens: b.tokens,
            prepend_input: b.prepend_input,
            tok_id_min: b.tok_id_min,
            tok_id_max: b.tok_id_max,
        }
    }

    pub fn is_case_sensitive(&self) -> bool {
        !self.flags.contains(LexFlags::CASE_INSENSITIVE)
    }

    #[inline]
    pub fn class_of(&self, b: u8) -> CharClass {
        self.chars.class_of(b)
    }

    pub fn is_id_first(&self, cp: u32) -> bool {
        self.chars.is_id_first(cp)
    }

    pub fn is_id(&self, cp: u32) -> bool {
        self.chars.is_id(cp)
    }

    pub fn reserved_id(&self, tok: ReservedToken) -> i32 {
        self.tokens.reserved_id(tok)
    }

    /// The view of `id`, reserved tokens first.
    pub fn find_view_by_id(&self, id: i32) -> Option<&TokenView> {
        self.tokens
            .reserved()
            .iter()
            .find(|v| v.id == id)
            .or_else(|| self.tokens.find_by_id(id).map(|i| self.tokens.view(i)))
    }

    /// The view answering to `name`, canonical or alias.
    pub fn find_view_by_name(&self, name: &str) -> Option<&TokenView> {
        match self.tokens.find_reserved(name) {
            Some(i) => self.tokens.reserved().get(i),
            None => self.tokens.find_name(name).map(|hit| self.tokens.view(hit.view)),
        }
    }

    /// Keywords are stored upper-cased in case-insensitive lexicons.
    pub fn find_keyword(&self, keyword: &str) -> Option<&KeywordDef> {
        if self.is_case_sensitive() {
            self.tokens.find_keyword(keyword)
        } else {
            self.tokens.find_keyword(&keyword.to_ascii_uppercase())
        }
    }

    /// The first quote type whose start mark begins `input`.
    pub fn quote_type_for(&self, input: &[u8]) -> Option<&QuoteType> {
        self.quote_types.iter().find(|q| input.starts_with(q.start.as_bytes()))
    }

    pub fn comment_type_for(&self, input: &[u8]) -> Option<&CommentType> {
        self.comment_types.iter().find(|c| input.starts_with(c.start.as_bytes()))
    }

    /// The longest number prefix that begins `input`.
    pub fn number_prefix_for(&self, input: &[u8]) -> Option<&NumberPrefix> {
        self.number_prefixes
            .iter()
            .find(|p| input.starts_with(p.prefix.as_bytes()))
    }

    fn suffix_at(&self, input: &[u8]) -> Option<&str> {
        self.number_suffixes
            .iter()
            .map(String::as_str)
            .find(|s| input.starts_with(s.as_bytes()))
    }

    /// Canonicalize the number literal at the start of `input`.
    ///
    /// A configured prefix selects its radix and the digits render as `0x`
    /// hex. Anything else is read as a decimal integer or float. A trailing
    /// configured suffix is split off.
    pub fn canonicalize_number(&self, input: &[u8]) -> NumResult<NumberLiteral> {
        let sep = self.decimal_separator as u8;

        let prefixed = self.number_prefix_for(input).and_then(|p| {
            let rest = &input[p.prefix.len()..];
            let (digits, used) = strip_radix_digits(rest, p.radix, sep).ok()?;
            Some((p, digits, p.prefix.len() + used))
        });

        let (text, radix, consumed) = match prefixed {
            Some((p, digits, consumed)) => {
                let hex = RadixConverter::new().hex_of(digits.as_bytes(), p.radix)?;
                (format!("0x{hex}"), p.radix, consumed)
            }
            None => {
                let number = canonicalize_decimal(input, sep).ok_or(NumError::Empty)?;
                (number.text, 10, number.consumed)
            }
        };

        let suffix = self.suffix_at(&input[consumed..]).map(str::to_string);
        let consumed = consumed + suffix.as_ref().map_or(0, String::len);
        Ok(NumberLiteral {
            text,
            radix,
            suffix,
            consumed,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
