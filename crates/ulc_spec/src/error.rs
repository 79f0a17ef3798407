//! Compilation errors.
//!
//! Handlers report a [`SpecErrorKind`]; the compiler attaches the tag and
//! line of the directive being processed to form a [`SpecError`].

use miette::Diagnostic as MietteDiagnostic;
use std::fmt;
use thiserror::Error;
use ulc_diagnostics::messages;
use ulc_diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticMessage, Location};
use ulc_escape::EscapeError;

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Header,
    Malformed,
    Conflict,
    Capacity,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum SpecErrorKind {
    // -- header and inheritance --
    #[error("improper ulc file format: expected a UTF-8 BOM followed by '#@ulc-c<version>'")]
    #[diagnostic(code(ulc::header::format))]
    ImproperFormat,

    #[error("unsupported version '{0}'")]
    #[diagnostic(code(ulc::header::version))]
    UnsupportedVersion(String),

    #[error("can't inherit ulc-spec '{0}' from multiple parents")]
    #[diagnostic(code(ulc::header::multiple_parents))]
    MultipleParents(String),

    #[error("can't open ulc-spec '{0}'")]
    #[diagnostic(code(ulc::header::parent_not_found))]
    ParentNotFound(String),

    #[error("inheritance chain of '{name}' is deeper than {max}")]
    #[diagnostic(code(ulc::header::too_deep))]
    InheritanceTooDeep { name: String, max: usize },

    #[error("invalid spec-name '{0}'")]
    #[diagnostic(code(ulc::header::spec_name))]
    InvalidSpecName(String),

    #[error("the spec text is not valid UTF-8")]
    #[diagnostic(code(ulc::header::utf8))]
    NotUtf8,

    // -- malformed directives and token lines --
    #[error("unknown attribute '{0}'")]
    #[diagnostic(code(ulc::malformed::attribute))]
    UnknownAttribute(String),

    #[error("'{directive}' expects true or false, found '{found}'")]
    #[diagnostic(code(ulc::malformed::boolean))]
    ExpectedBoolean { directive: &'static str, found: String },

    #[error("the {what} mark '{mark}' is too long")]
    #[diagnostic(code(ulc::malformed::mark_too_long))]
    MarkTooLong { what: &'static str, mark: String },

    #[error("invalid {what} mark '{mark}'")]
    #[diagnostic(code(ulc::malformed::mark))]
    InvalidMark { what: &'static str, mark: String },

    #[error("'{directive}' requires {what}")]
    #[diagnostic(code(ulc::malformed::missing_argument))]
    MissingArgument { directive: &'static str, what: &'static str },

    #[error("unknown option '{option}' for {directive}")]
    #[diagnostic(code(ulc::malformed::option))]
    UnknownOption { option: String, directive: &'static str },

    #[error("invalid char range '{0}'")]
    #[diagnostic(code(ulc::malformed::char_range))]
    InvalidCharRange(String),

    #[error("invalid ID_MAX_LENGTH '{0}'")]
    #[diagnostic(code(ulc::malformed::id_max_length))]
    InvalidIdMaxLength(String),

    #[error("invalid number prefix '{0}'")]
    #[diagnostic(code(ulc::malformed::number_prefix), help("number prefixes look like 0x:16"))]
    InvalidNumberPrefix(String),

    #[error("invalid radix in number prefix '{0}'")]
    #[diagnostic(code(ulc::malformed::radix), help("the radix must be within 2..=36"))]
    InvalidRadix(String),

    #[error("invalid decimal separator '{0}'")]
    #[diagnostic(code(ulc::malformed::decimal_separator))]
    InvalidDecimalSeparator(String),

    #[error("domain '{found}' does not match '{expected}'")]
    #[diagnostic(code(ulc::malformed::domain))]
    DomainMismatch { found: String, expected: String },

    #[error("'{0}' is not a reserved token name")]
    #[diagnostic(code(ulc::malformed::reserved_name))]
    NotReservedName(String),

    #[error("nil-string or too long token name '{0}'")]
    #[diagnostic(code(ulc::malformed::token_name))]
    InvalidTokenName(String),

    #[error("invalid keyword '{keyword}': {reason}")]
    #[diagnostic(code(ulc::malformed::keyword))]
    InvalidKeyword { keyword: String, reason: &'static str },

    #[error("invalid token id '{0}'")]
    #[diagnostic(code(ulc::malformed::token_id))]
    InvalidTokenId(String),

    #[error("invalid escape map: {0}")]
    #[diagnostic(code(ulc::malformed::escape_map))]
    InvalidEscapeMap(#[from] EscapeError),

    #[error("invalid PREPEND_INPUT value '{0}'")]
    #[diagnostic(code(ulc::malformed::prepend_input))]
    InvalidPrependInput(String),

    // -- semantic conflicts --
    #[error("the token id {id} is already used by the quote type '{mark}'")]
    #[diagnostic(code(ulc::conflict::quote_token))]
    QuoteTokenInUse { id: i32, mark: String },

    #[error("the token id {id} is already used by '{name}'")]
    #[diagnostic(code(ulc::conflict::token_id))]
    TokenIdInUse { id: i32, name: String },

    #[error("the name '{0}' is already defined")]
    #[diagnostic(code(ulc::conflict::token_name))]
    TokenNameInUse(String),

    #[error("the keyword '{keyword}' conflicts with the previous designation {name}({id})")]
    #[diagnostic(code(ulc::conflict::keyword))]
    KeywordConflict { keyword: String, name: String, id: i32 },

    #[error("aliasing of reserved token '{0}' isn't permitted")]
    #[diagnostic(code(ulc::conflict::reserved_alias))]
    ReservedAlias(String),

    #[error("the {what} mark '{mark}' collides with another {what} type")]
    #[diagnostic(code(ulc::conflict::mark))]
    MarkCollision { what: &'static str, mark: String },

    #[error("comment type '{0}' is contained in one of the quote types")]
    #[diagnostic(code(ulc::conflict::comment_in_quote))]
    CommentInQuote(String),

    #[error("quote type '{0}' is contained in one of the comment types")]
    #[diagnostic(code(ulc::conflict::quote_in_comment))]
    QuoteInComment(String),

    #[error("the reserved name '{0}' is used twice")]
    #[diagnostic(code(ulc::conflict::reserved_name))]
    DuplicateReservedName(String),

    #[error("reserved tokens '{first}' and '{second}' share the id {id}")]
    #[diagnostic(code(ulc::conflict::reserved_id))]
    DuplicateReservedId { first: String, second: String, id: i32 },

    #[error("the name '{name}' of '{keyword}' is already defined in another line")]
    #[diagnostic(code(ulc::conflict::name_elsewhere))]
    NameDefinedElsewhere { name: String, keyword: String },

    // -- fixed capacities --
    #[error("too many {what} (at most {max})")]
    #[diagnostic(code(ulc::capacity))]
    TooMany { what: &'static str, max: usize },
}

impl SpecErrorKind {
    pub fn class(&self) -> ErrorClass {
        use SpecErrorKind::*;
        match self {
            ImproperFormat
            | UnsupportedVersion(_)
            | MultipleParents(_)
            | ParentNotFound(_)
            | InheritanceTooDeep { .. }
            | InvalidSpecName(_)
            | NotUtf8 => ErrorClass::Header,
            QuoteTokenInUse { .. }
            | TokenIdInUse { .. }
            | TokenNameInUse(_)
            | KeywordConflict { .. }
            | ReservedAlias(_)
            | MarkCollision { .. }
            | CommentInQuote(_)
            | QuoteInComment(_)
            | DuplicateReservedName(_)
            | DuplicateReservedId { .. }
            | NameDefinedElsewhere { .. } => ErrorClass::Conflict,
            TooMany { .. } => ErrorClass::Capacity,
            _ => ErrorClass::Malformed,
        }
    }

    /// The catalogue entry this error is reported under.
    pub fn message(&self) -> &'static DiagnosticMessage {
        use SpecErrorKind::*;
        match self {
            ImproperFormat => &messages::IMPROPER_FILE_FORMAT,
            UnsupportedVersion(_) => &messages::UNSUPPORTED_VERSION,
            MultipleParents(_) => &messages::MULTIPLE_PARENTS,
            ParentNotFound(_) => &messages::PARENT_NOT_FOUND,
            InheritanceTooDeep { .. } => &messages::INHERITANCE_TOO_DEEP,
            InvalidSpecName(_) => &messages::INVALID_SPEC_NAME,
            NotUtf8 => &messages::NOT_UTF8,
            UnknownAttribute(_) => &messages::UNKNOWN_ATTRIBUTE,
            ExpectedBoolean { .. } => &messages::EXPECTED_BOOLEAN,
            MarkTooLong { .. } => &messages::MARK_TOO_LONG,
            InvalidMark { .. } => &messages::INVALID_MARK,
            MissingArgument { .. } => &messages::MISSING_ARGUMENT,
            UnknownOption { .. } => &messages::UNKNOWN_OPTION,
            InvalidCharRange(_) => &messages::INVALID_CHAR_RANGE,
            InvalidIdMaxLength(_) => &messages::INVALID_ID_MAX_LENGTH,
            InvalidNumberPrefix(_) => &messages::INVALID_NUMBER_PREFIX,
            InvalidRadix(_) => &messages::INVALID_RADIX,
            InvalidDecimalSeparator(_) => &messages::INVALID_DECIMAL_SEPARATOR,
            DomainMismatch { .. } => &messages::DOMAIN_MISMATCH,
            NotReservedName(_) => &messages::NOT_RESERVED_NAME,
            InvalidTokenName(_) => &messages::INVALID_TOKEN_NAME,
            InvalidKeyword { .. } => &messages::INVALID_KEYWORD,
            InvalidTokenId(_) => &messages::INVALID_TOKEN_ID,
            InvalidEscapeMap(_) => &messages::INVALID_ESCAPE_MAP,
            InvalidPrependInput(_) => &messages::INVALID_PREPEND_INPUT,
            QuoteTokenInUse { .. } => &messages::QUOTE_TOKEN_IN_USE,
            TokenIdInUse { .. } => &messages::TOKEN_ID_IN_USE,
            TokenNameInUse(_) => &messages::TOKEN_NAME_IN_USE,
            KeywordConflict { .. } => &messages::KEYWORD_CONFLICT,
            ReservedAlias(_) => &messages::RESERVED_ALIAS,
            MarkCollision { .. } => &messages::MARK_COLLISION,
            CommentInQuote(_) => &messages::COMMENT_IN_QUOTE,
            QuoteInComment(_) => &messages::QUOTE_IN_COMMENT,
            DuplicateReservedName(_) => &messages::DUPLICATE_RESERVED_NAME,
            DuplicateReservedId { .. } => &messages::DUPLICATE_RESERVED_ID,
            NameDefinedElsewhere { .. } => &messages::NAME_DEFINED_ELSEWHERE,
            TooMany { .. } => &messages::TOO_MANY,
        }
    }

    pub fn code(&self) -> u32 {
        self.message().code
    }

    /// Attach a source position.
    pub fn at(self, location: Location) -> SpecError {
        SpecError { location, kind: self }
    }
}

/// A failed compilation: what went wrong and where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {kind}")]
pub struct SpecError {
    pub location: Location,
    #[source]
    pub kind: SpecErrorKind,
}

impl SpecError {
    pub fn new(tag: impl Into<String>, line: u32, kind: SpecErrorKind) -> Self {
        kind.at(Location::new(tag, line))
    }

    pub fn kind(&self) -> &SpecErrorKind {
        &self.kind
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Lower into the diagnostic model.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::from_parts(
            Some(self.location.clone()),
            self.kind.code(),
            DiagnosticCategory::Error,
            self.kind.to_string(),
        )
    }
}

impl MietteDiagnostic for SpecError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        MietteDiagnostic::code(&self.kind)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        MietteDiagnostic::help(&self.kind)
    }
}

pub type SpecResult<T> = Result<T, SpecError>;
