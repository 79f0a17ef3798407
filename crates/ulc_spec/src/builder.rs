//! In-progress state of one compilation.

use crate::char_class::CharClassTable;
use crate::marker::{CommentType, MarkerSet, QuoteType};
use crate::options::CompileOptions;
use crate::tokdef::TokenRegistry;
use bitflags::bitflags;
use serde::Serialize;
use ulc_diagnostics::{Diagnostic, DiagnosticCollection, DiagnosticMessage, Location};
use ulc_escape::{EscapeMapPool, EscapeMapRegistry};

pub const MAX_NUMBER_PREFIXES: usize = 8;
pub const MAX_PREFIX_LEN: usize = 7;
pub const MAX_SUFFIX_LEN: usize = 3;
/// Room for all suffixes, each with a terminator.
pub const MAX_SUFFIXES_SIZE: usize = 31;
pub const DEFAULT_DECIMAL_SEPARATOR: u8 = b'_';

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct LexFlags: u8 {
        const CASE_INSENSITIVE = 0x01;
        /// `\n` is a single-char token.
        const LF_CHAR          = 0x02;
        /// `\t` is a single-char token.
        const TAB_CHAR         = 0x04;
        /// Keep `\n` out of the single-char tokens.
        const LINEFEED_GUARD   = 0x08;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberPrefix {
    pub prefix: String,
    pub radix: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdMaxLength {
    pub bytes: u32,
    pub uchars: u32,
}

/// Text the scanner reads ahead of its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrependInput {
    pub text: String,
    pub line_feeds: u32,
    /// Line feeds of the text do not count towards line numbers.
    pub ignore_line_feeds: bool,
}

pub(crate) struct SpecBuilder<'a> {
    pub options: &'a CompileOptions,
    pub escapes: &'a EscapeMapRegistry,
    pub pool: EscapeMapPool,

    pub chars: CharClassTable,
    pub tokens: TokenRegistry,
    pub comments: MarkerSet<CommentType>,
    pub quotes: MarkerSet<QuoteType>,
    pub prefixes: Vec<NumberPrefix>,
    pub suffixes: Vec<String>,
    pub decimal_separator: u8,
    pub id_max_length: Option<IdMaxLength>,
    pub flags: LexFlags,
    pub prepend_input: Option<PrependInput>,

    pub tok_id_seed: i32,
    pub tok_id_min: i32,
    pub tok_id_max: i32,

    pub location: Location,
    pub diagnostics: DiagnosticCollection,
}

impl<'a> SpecBuilder<'a> {
    pub fn new(options: &'a CompileOptions, escapes: &'a EscapeMapRegistry) -> Self {
        Self {
            options,
            escapes,
            pool: escapes.new_pool(),
            chars: CharClassTable::new(),
            tokens: TokenRegistry::new(),
            comments: MarkerSet::new(),
            quotes: MarkerSet::new(),
            prefixes: Vec::new(),
            suffixes: Vec::new(),
            decimal_separator: DEFAULT_DECIMAL_SEPARATOR,
            id_max_length: None,
            flags: LexFlags::empty(),
            prepend_input: None,
            tok_id_seed: 0,
            tok_id_min: 0,
            tok_id_max: 0,
            location: Location::new("", 0),
            diagnostics: DiagnosticCollection::new(),
        }
    }

    pub fn case_insensitive(&self) -> bool {
        self.flags.contains(LexFlags::CASE_INSENSITIVE)
    }

    pub fn set_location(&mut self, tag: &str, line: u32) {
        if self.location.tag != tag {
            self.location.tag = tag.to_string();
        }
        self.location.line = line;
    }

    /// Record a warning at the current line.
    pub fn warn(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let diag = Diagnostic::with_location(self.location.clone(), message, args);
        tracing::warn!(location = %self.location, code = message.code, "{}", diag.message_text);
        self.diagnostics.add(diag);
    }

    /// Record a warning that belongs to no line.
    pub fn warn_global(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let diag = Diagnostic::new(message, args);
        tracing::warn!(code = message.code, "{}", diag.message_text);
        self.diagnostics.add(diag);
    }

    pub fn track_tok_id(&mut self, id: i32) {
        self.tok_id_min = self.tok_id_min.min(id);
        self.tok_id_max = self.tok_id_max.max(id);
    }
}
