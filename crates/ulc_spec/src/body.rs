//! Token lines: `NAME [keyword] [id]`.
//!
//! A line either configures a reserved token or defines a regular one. Lines
//! that share an id, a keyword or a name end up on one [`TokenView`], the
//! extra names becoming aliases.
//!
//! [`TokenView`]: crate::tokdef::TokenView

use crate::builder::{LexFlags, SpecBuilder};
use crate::char_class::CharClass;
use crate::error::SpecErrorKind;
use crate::keyword::{classify_keyword, is_pure_int, Keyword, KeywordContext};
use crate::tokdef::{check_token_name, KeywordKind};

fn parse_id(word: &str) -> Result<i32, SpecErrorKind> {
    word.parse::<i32>()
        .map_err(|_| SpecErrorKind::InvalidTokenId(word.to_string()))
}

/// An explicit id moves the seed past itself.
fn explicit_id(b: &mut SpecBuilder<'_>, word: &str) -> Result<Option<i32>, SpecErrorKind> {
    if word.is_empty() {
        return Ok(None);
    }
    let id = parse_id(word)?;
    b.tok_id_seed = id.saturating_add(1);
    Ok(Some(id))
}

fn next_seed(b: &mut SpecBuilder<'_>) -> i32 {
    let id = b.tok_id_seed;
    b.tok_id_seed = id.saturating_add(1);
    id
}

/// Update the char table for a keyword bound to `id`.
fn mark_chars(b: &mut SpecBuilder<'_>, kw: &Keyword, id: i32) {
    let first = kw.text.as_bytes().first().copied();
    match kw.kind {
        KeywordKind::OneChar => {
            if let Some(ch) = first {
                b.chars.insert(ch, CharClass::SINGLE_CHAR);
                match ch {
                    b'\n' => b.flags.insert(LexFlags::LF_CHAR),
                    b'\t' => b.flags.insert(LexFlags::TAB_CHAR),
                    _ => {}
                }
            }
        }
        KeywordKind::TwoPlus => {
            if let Some(ch) = first {
                b.chars.insert(ch, CharClass::TWO_PLUS);
                if b.case_insensitive() {
                    b.chars.insert(ch.to_ascii_lowercase(), CharClass::TWO_PLUS);
                }
            }
            b.chars.remove_at_id(id, CharClass::SINGLE_CHAR);
        }
        KeywordKind::Idstr | KeywordKind::User => b.chars.remove_at_id(id, CharClass::SINGLE_CHAR),
        KeywordKind::Literal => {}
    }
}

fn reserved_line<'l>(
    b: &mut SpecBuilder<'_>,
    index: usize,
    mut words: impl Iterator<Item = &'l str>,
) -> Result<i32, SpecErrorKind> {
    // A reserved token takes no keyword, but one may be written.
    let second = words.next().unwrap_or_default();
    let id_word = if second.is_empty() || is_pure_int(second.as_bytes()) {
        second
    } else {
        words.next().unwrap_or_default()
    };

    let id = match explicit_id(b, id_word)? {
        Some(id) => id,
        None => next_seed(b),
    };
    if let Some(v) = b.tokens.find_by_id(id) {
        return Err(SpecErrorKind::TokenIdInUse {
            id,
            name: b.tokens.view(v).name.clone(),
        });
    }
    b.chars.remove_at_id(id, CharClass::SINGLE_CHAR);
    b.tokens.set_reserved_id(index, id);
    Ok(id)
}

/// Process one token line and return the id it was bound to.
pub(crate) fn token_line(b: &mut SpecBuilder<'_>, line: &str) -> Result<i32, SpecErrorKind> {
    let mut words = line.split([' ', '\t']).filter(|w| !w.is_empty());
    let name = words.next().unwrap_or_default();
    check_token_name(name)?;

    if let Some(index) = b.tokens.find_reserved(name) {
        return reserved_line(b, index, words);
    }

    let name_hit = b.tokens.find_name(name);
    let mut group = name_hit.map(|h| h.view);

    let kw_word = words.next().unwrap_or_default();
    let kw = {
        let ctx = KeywordContext {
            chars: &b.chars,
            case_insensitive: b.case_insensitive(),
            comments: &b.comments,
            quotes: &b.quotes,
        };
        classify_keyword(kw_word.as_bytes(), &ctx)?
    };
    let one_char = (kw.kind == KeywordKind::OneChar).then(|| kw.text.as_bytes()[0]);

    // Whether the keyword itself was already bound to a view.
    let mut keyword_hit = false;
    let id_word = match kw.kind {
        KeywordKind::User => kw_word,
        KeywordKind::OneChar => {
            if let Some(v) = one_char.and_then(|ch| b.tokens.one_char_view(ch)) {
                keyword_hit = true;
                group.get_or_insert(v);
            }
            words.next().unwrap_or_default()
        }
        _ => {
            let bound = b
                .tokens
                .find_keyword(&kw.text)
                .and_then(|def| b.tokens.find_by_id(def.tok_id));
            if let Some(v) = bound {
                keyword_hit = true;
                match group {
                    None => group = Some(v),
                    Some(g) if g != v => {
                        return Err(SpecErrorKind::NameDefinedElsewhere {
                            name: name.to_string(),
                            keyword: kw.text.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
            words.next().unwrap_or_default()
        }
    };

    let id = match (explicit_id(b, id_word)?, group, one_char) {
        (Some(id), _, _) => id,
        (None, Some(g), _) => b.tokens.view(g).id,
        (None, None, Some(ch)) => i32::from(ch),
        (None, None, None) => next_seed(b),
    };
    tracing::trace!(location = %b.location, name, keyword = %kw.text, id, "token line");
    mark_chars(b, &kw, id);

    let mut pending_alias = false;
    match group {
        Some(g) => {
            let view = b.tokens.view(g);
            if view.id != id {
                return Err(SpecErrorKind::KeywordConflict {
                    keyword: kw.text.clone(),
                    name: view.name.clone(),
                    id: view.id,
                });
            }
            if keyword_hit {
                if name_hit.is_none() {
                    b.tokens.add_alias(g, name);
                }
                return Ok(id);
            }
        }
        None => {
            if b.tokens.is_reserved_id(id) {
                return Err(SpecErrorKind::ReservedAlias(name.to_string()));
            }
            if let Some(v) = b.tokens.find_by_id(id) {
                group = Some(v);
                if b.tokens.view(v).name.is_empty() {
                    b.tokens.set_view_name(v, name);
                    if kw.kind == KeywordKind::User {
                        return Ok(id);
                    }
                } else {
                    match (kw.kind, one_char) {
                        (KeywordKind::User, _) => {
                            b.tokens.add_alias(v, name);
                            return Ok(id);
                        }
                        (_, Some(ch)) => {
                            b.tokens.bind_one_char(ch, v);
                            b.tokens.add_alias(v, name);
                            return Ok(id);
                        }
                        _ => pending_alias = true,
                    }
                }
            }
        }
    }

    let view = match group {
        Some(g) => g,
        None => b.tokens.add_view(id, name)?,
    };
    match (kw.kind, one_char) {
        (_, Some(ch)) => b.tokens.bind_one_char(ch, view),
        (KeywordKind::User, _) => {}
        (kind, _) => b.tokens.add_keyword(&kw.text, kind, name, id),
    }
    if pending_alias {
        b.tokens.add_alias(view, name);
    }
    Ok(id)
}
