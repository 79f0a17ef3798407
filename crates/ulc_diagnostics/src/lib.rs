//! ulc_diagnostics: Located findings and their message catalogue.
//!
//! Every finding of the spec compiler is reported against a source tag
//! (the spec name) and a line number. Messages are catalogued with stable
//! codes so that callers can match on them.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

impl DiagnosticCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalogued message: stable code, category and `{n}` template.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

impl DiagnosticMessage {
    pub fn format(&self, args: &[&str]) -> String {
        format_message(self.message, args)
    }
}

/// Where a finding was made: the spec tag and a 1-based line number.
///
/// Line 0 stands for the spec as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Location {
    pub tag: String,
    pub line: u32,
}

impl Location {
    pub fn new(tag: impl Into<String>, line: u32) -> Self {
        Self { tag: tag.into(), line }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.tag, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub location: Option<Location>,
    pub message_text: String,
    pub code: u32,
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self::from_parts(None, message.code, message.category, message.format(args))
    }

    pub fn with_location(location: Location, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self::from_parts(Some(location), message.code, message.category, message.format(args))
    }

    /// Lowering of an error value that already renders its own text.
    pub fn from_parts(
        location: Option<Location>,
        code: u32,
        category: DiagnosticCategory,
        message_text: String,
    ) -> Self {
        Self { location, message_text, code, category }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.category, DiagnosticCategory::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(at) => write!(f, "{at}: {} ULC{}: {}", self.category, self.code, self.message_text),
            None => write!(f, "{} ULC{}: {}", self.category, self.code, self.message_text),
        }
    }
}

/// Substitute `{n}` placeholders with `args[n]` in one pass.
///
/// Placeholders without a matching argument are kept as written.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let arg = tail
            .find('}')
            .and_then(|close| Some((tail[1..close].parse::<usize>().ok()?, close)))
            .and_then(|(n, close)| Some((*args.get(n)?, close)));
        match arg {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Findings of one or more compilations, in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiagnosticCollection {
    items: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.items.extend(other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.iter().filter(|d| d.is_error()).count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| d.category == DiagnosticCategory::Warning)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Order by tag, then line. Global findings sort first.
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| a.location.cmp(&b.location));
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Message catalogue
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, $category:ident, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::$category, message: $msg }
        };
    }

    // ========================================================================
    // Header and inheritance (1000-1099)
    // ========================================================================
    pub const IMPROPER_FILE_FORMAT: DiagnosticMessage = diag!(1001, Error, "Improper ulc file format: expected a UTF-8 BOM followed by '#@ulc-c<version>'.");
    pub const UNSUPPORTED_VERSION: DiagnosticMessage = diag!(1002, Error, "Unsupported version '{0}'.");
    pub const MULTIPLE_PARENTS: DiagnosticMessage = diag!(1003, Error, "Can't inherit ulc-spec '{0}' from multiple parents.");
    pub const PARENT_NOT_FOUND: DiagnosticMessage = diag!(1004, Error, "Can't open ulc-spec '{0}'.");
    pub const INHERITANCE_TOO_DEEP: DiagnosticMessage = diag!(1005, Error, "Inheritance chain of '{0}' is deeper than {1}.");
    pub const INVALID_SPEC_NAME: DiagnosticMessage = diag!(1006, Error, "Invalid spec-name '{0}'.");
    pub const NOT_UTF8: DiagnosticMessage = diag!(1007, Error, "The spec text is not valid UTF-8.");

    // ========================================================================
    // Malformed directives and token lines (1100-1199)
    // ========================================================================
    pub const UNKNOWN_ATTRIBUTE: DiagnosticMessage = diag!(1101, Error, "Unknown attribute '{0}'.");
    pub const EXPECTED_BOOLEAN: DiagnosticMessage = diag!(1102, Error, "'{0}' expects true or false, found '{1}'.");
    pub const MARK_TOO_LONG: DiagnosticMessage = diag!(1103, Error, "The {0} mark '{1}' is too long.");
    pub const INVALID_MARK: DiagnosticMessage = diag!(1104, Error, "Invalid {0} mark '{1}'.");
    pub const MISSING_ARGUMENT: DiagnosticMessage = diag!(1105, Error, "'{0}' requires {1}.");
    pub const UNKNOWN_OPTION: DiagnosticMessage = diag!(1106, Error, "Unknown option '{0}' for {1}.");
    pub const INVALID_CHAR_RANGE: DiagnosticMessage = diag!(1107, Error, "Invalid char range '{0}'.");
    pub const INVALID_ID_MAX_LENGTH: DiagnosticMessage = diag!(1108, Error, "Invalid ID_MAX_LENGTH '{0}'.");
    pub const INVALID_NUMBER_PREFIX: DiagnosticMessage = diag!(1109, Error, "Invalid number prefix '{0}'.");
    pub const INVALID_RADIX: DiagnosticMessage = diag!(1110, Error, "Invalid radix in number prefix '{0}'.");
    pub const INVALID_DECIMAL_SEPARATOR: DiagnosticMessage = diag!(1111, Error, "Invalid decimal separator '{0}'.");
    pub const DOMAIN_MISMATCH: DiagnosticMessage = diag!(1112, Error, "Domain '{0}' does not match '{1}'.");
    pub const NOT_RESERVED_NAME: DiagnosticMessage = diag!(1113, Error, "'{0}' is not a reserved token name.");
    pub const INVALID_TOKEN_NAME: DiagnosticMessage = diag!(1114, Error, "Nil-string or too long token name '{0}'.");
    pub const INVALID_KEYWORD: DiagnosticMessage = diag!(1115, Error, "Invalid keyword '{0}': {1}.");
    pub const INVALID_TOKEN_ID: DiagnosticMessage = diag!(1116, Error, "Invalid token id '{0}'.");
    pub const INVALID_ESCAPE_MAP: DiagnosticMessage = diag!(1118, Error, "Invalid escape map: {0}.");
    pub const INVALID_PREPEND_INPUT: DiagnosticMessage = diag!(1119, Error, "Invalid PREPEND_INPUT value '{0}'.");

    // ========================================================================
    // Semantic conflicts (2000-2099)
    // ========================================================================
    pub const QUOTE_TOKEN_IN_USE: DiagnosticMessage = diag!(2001, Error, "The token id {0} is already used by the quote type '{1}'.");
    pub const TOKEN_ID_IN_USE: DiagnosticMessage = diag!(2002, Error, "The token id {0} is already used by '{1}'.");
    pub const TOKEN_NAME_IN_USE: DiagnosticMessage = diag!(2003, Error, "The name '{0}' is already defined.");
    pub const KEYWORD_CONFLICT: DiagnosticMessage = diag!(2004, Error, "The keyword '{0}' conflicts with the previous designation {1}({2}).");
    pub const RESERVED_ALIAS: DiagnosticMessage = diag!(2005, Error, "Aliasing of reserved token '{0}' isn't permitted.");
    pub const MARK_COLLISION: DiagnosticMessage = diag!(2006, Error, "The {0} mark '{1}' collides with another {0} type.");
    pub const COMMENT_IN_QUOTE: DiagnosticMessage = diag!(2007, Error, "Comment type '{0}' is contained in one of the quote types.");
    pub const QUOTE_IN_COMMENT: DiagnosticMessage = diag!(2008, Error, "Quote type '{0}' is contained in one of the comment types.");
    pub const DUPLICATE_RESERVED_NAME: DiagnosticMessage = diag!(2009, Error, "The reserved name '{0}' is used twice.");
    pub const DUPLICATE_RESERVED_ID: DiagnosticMessage = diag!(2010, Error, "Reserved tokens '{0}' and '{1}' share the id {2}.");
    pub const NAME_DEFINED_ELSEWHERE: DiagnosticMessage = diag!(2011, Error, "The name '{0}' of '{1}' is already defined in another line.");

    // ========================================================================
    // Capacity limits (3000-3099)
    // ========================================================================
    pub const TOO_MANY: DiagnosticMessage = diag!(3001, Error, "Too many {0} (at most {1}).");

    // ========================================================================
    // Warnings (9000-9099)
    // ========================================================================
    pub const IMPROPER_ID_FIRST_CHAR: DiagnosticMessage = diag!(9001, Warning, "'{0}' is not proper for ID_FIRST_CHARS, ignored.");
    pub const NUMBER_SUFFIX_DROPPED: DiagnosticMessage = diag!(9002, Warning, "Invalid number suffix '{0}' dropped.");
    pub const CHAR_FLAGS_CLEARED: DiagnosticMessage = diag!(9003, Warning, "The {0} char can't be used as other usage (flags 0x{1}), cleared.");
    pub const COMPILED: DiagnosticMessage = diag!(9090, Message, "Compiled '{0}' with {1} tokens.");
}
