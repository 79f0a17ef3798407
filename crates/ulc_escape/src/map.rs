//! Escape maps and their bindings.

use crate::pool::EscapeMapPool;
use crate::{EscapeError, EscapeResult};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use ulc_core::chars::{digit_value, encode_utf8};
use ulc_core::GrowableBuffer;

/// First and last characters that may follow the escape symbol.
pub const ESC_CH_FIRST: u8 = 0x21;
pub const ESC_CH_LAST: u8 = 0x7E;
pub const MAP_SIZE: usize = (ESC_CH_LAST - ESC_CH_FIRST + 1) as usize;

/// Default escape symbol.
pub const DEFAULT_ESC_SYM: u8 = b'\\';

/// Slot of `ch` in a map, if it can be escaped at all.
#[inline]
pub fn slot_index(ch: u8) -> Option<usize> {
    (ESC_CH_FIRST..=ESC_CH_LAST)
        .contains(&ch)
        .then(|| usize::from(ch - ESC_CH_FIRST))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamKind {
    /// Octal digits; the escape character itself seeds the value when it is
    /// a digit. Emits one byte.
    Octal,
    /// Hex digits. Emits one byte.
    Hex,
    /// Hex digits of a code point. Emits its UTF-8 encoding.
    Unicode,
}

/// Which hex digit letters a parametric rule accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HexCase {
    #[default]
    Any,
    Upper,
    Lower,
}

impl HexCase {
    fn accepts(self, b: u8) -> bool {
        match self {
            HexCase::Any => true,
            HexCase::Upper => !b.is_ascii_lowercase(),
            HexCase::Lower => !b.is_ascii_uppercase(),
        }
    }
}

/// Digits consumed after an escape character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamRule {
    pub kind: ParamKind,
    /// Maximum digit count (exact count when `fixed`).
    pub digits: u8,
    pub fixed: bool,
    pub case: HexCase,
}

impl ParamRule {
    pub fn new(kind: ParamKind, digits: u8, fixed: bool) -> Self {
        Self {
            kind,
            digits,
            fixed,
            case: HexCase::Any,
        }
    }

    pub fn with_case(mut self, case: HexCase) -> Self {
        self.case = case;
        self
    }

    fn radix(&self) -> u32 {
        match self.kind {
            ParamKind::Octal => 8,
            ParamKind::Hex | ParamKind::Unicode => 16,
        }
    }
}

/// What an escape character expands to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Binding {
    Literal(Vec<u8>),
    Param(ParamRule),
}

impl Binding {
    pub fn literal(bytes: &[u8]) -> Self {
        Binding::Literal(bytes.to_vec())
    }
}

/// One pooled binding. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EscapeString {
    esc_ch: u8,
    binding: Binding,
}

impl EscapeString {
    pub(crate) fn new(esc_ch: u8, binding: Binding) -> Self {
        Self { esc_ch, binding }
    }

    pub fn esc_ch(&self) -> u8 {
        self.esc_ch
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }
}

/// Result of looking up one escaped character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// No binding: the escape symbol and the character are kept as written.
    Unbound,
    Literal(&'a [u8]),
    /// Digits follow; `seed` is the starting value.
    Param { rule: ParamRule, seed: u32 },
}

/// Per-quote escape table.
#[derive(Clone, PartialEq, Eq)]
pub struct EscapeMap {
    esc_sym: u8,
    slots: Vec<Option<Arc<EscapeString>>>,
}

impl EscapeMap {
    pub fn new(esc_sym: u8) -> Self {
        Self {
            esc_sym,
            slots: vec![None; MAP_SIZE],
        }
    }

    pub fn esc_sym(&self) -> u8 {
        self.esc_sym
    }

    pub(crate) fn set_esc_sym(&mut self, esc_sym: u8) {
        self.esc_sym = esc_sym;
    }

    pub fn find(&self, ch: u8) -> Option<&EscapeString> {
        self.slots.get(slot_index(ch)?)?.as_deref()
    }

    /// Bind `ch` to an entry of `pool` itself, creating it if needed.
    pub fn add(&mut self, pool: &EscapeMapPool, ch: u8, binding: Binding) -> EscapeResult<()> {
        let idx = slot_index(ch).ok_or(EscapeError::InvalidEscapeChar(ch as char))?;
        let entry = pool
            .intern(ch, binding)
            .ok_or(EscapeError::InvalidEscapeChar(ch as char))?;
        self.slots[idx] = Some(entry);
        Ok(())
    }

    /// Like [`add`](Self::add) for characters already known to be escapable;
    /// anything else is ignored.
    pub(crate) fn bind(&mut self, pool: &EscapeMapPool, ch: u8, binding: Binding) {
        if let (Some(idx), Some(entry)) = (slot_index(ch), pool.intern(ch, binding)) {
            self.slots[idx] = Some(entry);
        }
    }

    /// Bind `ch`, reusing an equal binding from `pool` or its parents.
    pub fn register(&mut self, pool: &EscapeMapPool, ch: u8, binding: Binding) -> EscapeResult<()> {
        let idx = slot_index(ch).ok_or(EscapeError::InvalidEscapeChar(ch as char))?;
        match pool.search(ch, &binding) {
            Some(shared) => {
                self.slots[idx] = Some(shared);
                Ok(())
            }
            None => self.add(pool, ch, binding),
        }
    }

    /// Unbind `ch`, returning the previous binding.
    pub fn delete(&mut self, ch: u8) -> EscapeResult<Option<Arc<EscapeString>>> {
        let idx = slot_index(ch).ok_or(EscapeError::InvalidEscapeChar(ch as char))?;
        Ok(self.slots[idx].take())
    }

    /// Number of bound characters.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bound characters in ascending order.
    pub fn bindings(&self) -> impl Iterator<Item = (u8, &Binding)> + '_ {
        self.slots
            .iter()
            .flatten()
            .map(|e| (e.esc_ch(), e.binding()))
    }

    /// Look up the character following the escape symbol.
    pub fn decode_escaped_char(&self, ch: u8) -> Decoded<'_> {
        match self.find(ch).map(EscapeString::binding) {
            None => Decoded::Unbound,
            Some(Binding::Literal(bytes)) => Decoded::Literal(bytes),
            Some(Binding::Param(rule)) => {
                let seed = if ch.is_ascii_digit() { u32::from(ch - b'0') } else { 0 };
                Decoded::Param { rule: *rule, seed }
            }
        }
    }

    /// Decode the body of a quoted literal.
    pub fn decode_quoted(&self, body: &[u8]) -> EscapeResult<Vec<u8>> {
        let mut out = GrowableBuffer::new(body.len().max(16));
        let mut i = 0;

        while i < body.len() {
            let b = body[i];
            if b != self.esc_sym {
                out.push(b);
                i += 1;
                continue;
            }
            let Some(&ch) = body.get(i + 1) else {
                out.push(b);
                break;
            };
            i += 2;

            match self.decode_escaped_char(ch) {
                Decoded::Unbound => {
                    out.append(&[self.esc_sym, ch]);
                }
                Decoded::Literal(bytes) => {
                    out.append(bytes);
                }
                Decoded::Param { rule, seed } => {
                    i += decode_param(ch, rule, seed, &body[i..], &mut out)?;
                }
            }
        }

        Ok(out.export())
    }
}

/// Consume the digits of a parametric escape and emit its value.
fn decode_param(
    esc_ch: u8,
    rule: ParamRule,
    seed: u32,
    input: &[u8],
    out: &mut GrowableBuffer,
) -> EscapeResult<usize> {
    let radix = rule.radix();
    let mut value = seed;
    let mut n = 0usize;

    while n < usize::from(rule.digits) {
        let Some(&b) = input.get(n) else { break };
        let Some(d) = digit_value(b, radix).filter(|_| rule.case.accepts(b)) else {
            break;
        };
        value = value.wrapping_mul(radix).wrapping_add(d);
        n += 1;
    }

    let esc = esc_ch as char;
    if rule.fixed && n != usize::from(rule.digits) {
        return Err(EscapeError::DigitCount {
            esc_ch: esc,
            expected: rule.digits,
            found: n,
        });
    }
    if n == 0 && rule.kind != ParamKind::Octal {
        return Err(EscapeError::MissingDigits { esc_ch: esc });
    }

    match rule.kind {
        ParamKind::Octal | ParamKind::Hex => {
            let byte = u8::try_from(value)
                .map_err(|_| EscapeError::ValueOutOfRange { esc_ch: esc, value })?;
            out.push(byte);
        }
        ParamKind::Unicode => {
            let (bytes, len) = encode_utf8(value).ok_or(EscapeError::InvalidCodePoint(value))?;
            out.append(&bytes[..len]);
        }
    }
    Ok(n)
}

impl fmt::Debug for EscapeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound: String = self.bindings().map(|(ch, _)| ch as char).collect();
        f.debug_struct("EscapeMap")
            .field("esc_sym", &(self.esc_sym as char))
            .field("bound", &bound)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BindingEntry<'a> {
    ch: char,
    #[serde(flatten)]
    binding: &'a Binding,
}

impl Serialize for EscapeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<BindingEntry<'_>> = self
            .bindings()
            .map(|(ch, binding)| BindingEntry { ch: ch as char, binding })
            .collect();
        let mut st = serializer.serialize_struct("EscapeMap", 2)?;
        st.serialize_field("escSym", &(self.esc_sym as char))?;
        st.serialize_field("bindings", &entries)?;
        st.end()
    }
}
