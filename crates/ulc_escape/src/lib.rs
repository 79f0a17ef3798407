//! ulc_escape: Escape maps for quoted literals.
//!
//! An escape map binds each printable ASCII character that may follow the
//! escape symbol to either a literal expansion or a parametric rule (octal,
//! hex or unicode digits). Maps are cheap to clone: bindings are shared
//! through an [`EscapeMapPool`] and never mutated once created.

pub mod map;
pub mod parse;
pub mod pool;
pub mod presets;
pub mod simple;

use thiserror::Error;

pub use map::{
    slot_index, Binding, Decoded, EscapeMap, EscapeString, HexCase, ParamKind, ParamRule,
    DEFAULT_ESC_SYM,
};
pub use parse::parse_escmap;
pub use pool::EscapeMapPool;
pub use presets::{EscapeMapRegistry, EscapeMode, EscapeOptions};
pub use simple::{decode_escaped, decode_simple, litstr_escape, simple_escape_char};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("character {0:?} cannot follow the escape symbol")]
    InvalidEscapeChar(char),

    #[error("unknown option '{option}' in escape map")]
    UnknownOption { option: String },

    #[error("option '{option}' is not available in {mode} mode")]
    OptionNotAllowed { option: String, mode: &'static str },

    #[error("option group is missing its closing ')'")]
    MissingParen,

    #[error("malformed escape clause '{0}'")]
    BadClause(String),

    #[error("malformed parametric escape '{0}'")]
    BadParametric(String),

    #[error("unterminated literal string")]
    UnterminatedQuote,

    #[error("'\\x' must be followed by a hex digit")]
    MissingHexDigits,

    #[error("escape '{esc_ch}' requires at least one digit")]
    MissingDigits { esc_ch: char },

    #[error("escape '{esc_ch}' requires exactly {expected} digits, found {found}")]
    DigitCount {
        esc_ch: char,
        expected: u8,
        found: usize,
    },

    #[error("escape '{esc_ch}' value {value:#x} does not fit in a byte")]
    ValueOutOfRange { esc_ch: char, value: u32 },

    #[error("{0:#x} is not a valid unicode scalar value")]
    InvalidCodePoint(u32),
}

pub type EscapeResult<T> = Result<T, EscapeError>;
