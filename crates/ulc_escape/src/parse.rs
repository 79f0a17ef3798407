//! Escape-map directive parsing.
//!
//! ```text
//! [mode][(opt,opt,...[;X])] [clause ...]
//! ```
//!
//! `mode` is `legacy`, `modern`, `verbatim`, `verbatim0` or `verbatim1`.
//! Without a mode the map derives from the full legacy preset. A clause binds
//! or unbinds one character:
//!
//! ```text
//! c:'text'     literal, simple escapes decoded
//! c:word       same, unquoted
//! c:\x02x      parametric: kind (u|x|o), optional 0 (fixed count),
//!              digit count, digit case (x any, X upper, a lower)
//! c:           unbind c
//! ~c ~oct ~hex unbind c, 0-9, or x
//! ```

use crate::map::{slot_index, Binding, EscapeMap, HexCase, ParamKind, ParamRule};
use crate::pool::EscapeMapPool;
use crate::presets::{option_from_word, EscapeMapRegistry, EscapeMode, EscapeOptions};
use crate::simple::decode_simple;
use crate::{EscapeError, EscapeResult};
use ulc_core::chars::{skip_blanks, split_word};

fn mode_from_word(word: &str) -> Option<EscapeMode> {
    match word {
        "legacy" => Some(EscapeMode::Legacy),
        "modern" => Some(EscapeMode::Modern),
        "verbatim" | "verbatim0" => Some(EscapeMode::Verbatim),
        "verbatim1" => Some(EscapeMode::VerbatimModerate),
        _ => None,
    }
}

/// Build the map for one escape-map directive.
///
/// An empty line shares the full legacy preset. A bare mode word shares
/// that preset; anything more derives a new map registered in `pool`.
pub fn parse_escmap(registry: &EscapeMapRegistry, pool: &EscapeMapPool, line: &str) -> EscapeResult<EscapeMap> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(registry.preset(EscapeMode::LegacyFull).clone());
    }

    let word_end = line
        .char_indices()
        .skip(1)
        .find(|&(_, c)| !c.is_ascii_alphanumeric())
        .map_or(line.len(), |(i, _)| i);
    let (word, rest) = line.split_at(word_end);

    let Some(mode) = mode_from_word(word) else {
        let mut map = registry
            .preset(EscapeMode::LegacyFull)
            .dup(pool, registry.esc_sym(), EscapeOptions::empty())?;
        apply_clauses(&mut map, pool, line)?;
        return Ok(map);
    };
    let preset = registry.preset(mode);
    let group_allowed = word != "verbatim0" && word != "verbatim1";

    let map = if let (Some(group), true) = (rest.strip_prefix('('), group_allowed) {
        let close = group.find(')').ok_or(EscapeError::MissingParen)?;
        let (options, esc_sym) = parse_option_group(&group[..close], mode, registry.esc_sym())?;
        let mut map = preset.dup(pool, esc_sym, options)?;
        apply_clauses(&mut map, pool, &group[close + 1..])?;
        map
    } else if rest.trim().is_empty() {
        preset.clone()
    } else {
        let mut map = preset.dup(pool, registry.esc_sym(), EscapeOptions::empty())?;
        apply_clauses(&mut map, pool, rest)?;
        map
    };

    tracing::debug!(mode = mode.as_str(), bound = map.len(), "escape map parsed");
    Ok(map)
}

/// Parse `opt,opt,...[;X]`, returning the options and the escape symbol.
fn parse_option_group(text: &str, mode: EscapeMode, default_sym: u8) -> EscapeResult<(EscapeOptions, u8)> {
    let (opts, esc_sym) = match text.split_once(';') {
        Some((opts, sym)) => match sym.trim().as_bytes() {
            [] => (opts, default_sym),
            [c] if slot_index(*c).is_some() => (opts, *c),
            _ => return Err(EscapeError::BadClause(format!(";{sym}"))),
        },
        None => (text, default_sym),
    };

    let mut options = EscapeOptions::empty();
    for word in opts.split(',').map(str::trim).filter(|w| !w.is_empty()) {
        let opt = option_from_word(word, esc_sym).ok_or_else(|| EscapeError::UnknownOption {
            option: word.to_string(),
        })?;
        EscapeMapRegistry::check_options(mode, opt, word)?;
        options |= opt;
    }
    Ok((options, esc_sym))
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Apply `c:expansion` and `~c` clauses to `map`.
fn apply_clauses(map: &mut EscapeMap, pool: &EscapeMapPool, text: &str) -> EscapeResult<()> {
    let mut rest = text.as_bytes();

    loop {
        rest = skip_blanks(rest);
        let Some(&ch) = rest.first() else { break };

        if ch == b'~' && rest.get(1) != Some(&b':') {
            let (word, tail) = split_word(&rest[1..]);
            match word {
                b"oct" => {
                    for d in b'0'..=b'9' {
                        map.delete(d)?;
                    }
                }
                b"hex" => {
                    map.delete(b'x')?;
                }
                [c] => {
                    map.delete(*c)?;
                }
                _ => return Err(EscapeError::BadClause(format!("~{}", lossy(word)))),
            }
            rest = tail;
            continue;
        }

        if rest.get(1) != Some(&b':') {
            return Err(EscapeError::BadClause(lossy(split_word(rest).0)));
        }
        let body = &rest[2..];

        match body.first() {
            None | Some(b' ' | b'\t') => {
                map.delete(ch)?;
                rest = body;
            }
            Some(b'\'') => {
                let (bytes, used) = decode_simple(&body[1..], Some(b'\''))?;
                map.register(pool, ch, Binding::Literal(bytes))?;
                rest = &body[1 + used..];
            }
            Some(_) => {
                let (word, tail) = split_word(body);
                let binding = match parse_parametric(word)? {
                    Some(rule) => Binding::Param(rule),
                    None => Binding::Literal(decode_simple(word, None)?.0),
                };
                map.register(pool, ch, binding)?;
                rest = tail;
            }
        }
    }
    Ok(())
}

/// Parse `\u04x`-style words. Returns `None` for words that are not
/// parametric at all.
fn parse_parametric(word: &[u8]) -> EscapeResult<Option<ParamRule>> {
    let (kind, spec) = match word {
        [b'\\', b'u', spec @ ..] => (ParamKind::Unicode, spec),
        [b'\\', b'x', spec @ ..] => (ParamKind::Hex, spec),
        [b'\\', b'o', spec @ ..] => (ParamKind::Octal, spec),
        _ => return Ok(None),
    };
    let bad = || EscapeError::BadParametric(lossy(word));

    let (fixed, spec) = match spec {
        [b'0', tail @ ..] => (true, tail),
        _ => (false, spec),
    };
    let [count @ b'1'..=b'9', case] = spec else {
        return Err(bad());
    };
    let digits = count - b'0';
    let max = match kind {
        ParamKind::Unicode => 8,
        ParamKind::Hex => 2,
        ParamKind::Octal => 3,
    };
    if digits > max {
        return Err(bad());
    }
    let case = match case {
        b'x' => HexCase::Any,
        b'X' => HexCase::Upper,
        b'a' => HexCase::Lower,
        _ => return Err(bad()),
    };

    Ok(Some(ParamRule::new(kind, digits, fixed).with_case(case)))
}
