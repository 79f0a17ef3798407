//! ulc_num: Numeric-literal canonicalization.
//!
//! Literals of any radix from 2 to 36 are normalized to canonical
//! hexadecimal or decimal digit strings without a native big-integer type.
//! Arithmetic is carried out on ASCII decimal digit strings; radix 2, 4 and
//! 8 convert to hexadecimal by direct bit regrouping; short literals take a
//! 64-bit fast path.

pub mod decstr;
pub mod float;
pub mod radix;

use thiserror::Error;

pub use decstr::{add_small, div_by_16, mul_by_small};
pub use float::{canonicalize_decimal, general_expr, CanonicalNumber, NumberKind};
pub use radix::{
    fast_path_limit, fits_native, hex_of, prefixed_to_hex, radix_to_decimal,
    radix_to_radix_simple, strip_radix_digits, to_hex, RadixConverter,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumError {
    #[error("radix {0} is out of range 2..=36")]
    InvalidRadix(u32),

    #[error("'{digit}' is not a digit in radix {radix}")]
    InvalidDigit { digit: char, radix: u32 },

    #[error("empty digit string")]
    Empty,

    #[error("operand {0} is out of range 0..100")]
    OperandOutOfRange(u32),

    #[error("{digits} digits in radix {radix} do not fit in 64 bits")]
    Overflow { radix: u32, digits: usize },
}

pub type NumResult<T> = Result<T, NumError>;
