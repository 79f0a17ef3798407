//! Keyword decoding and classification.

use crate::char_class::CharClassTable;
use crate::error::SpecErrorKind;
use crate::marker::{CommentType, MarkerSet, QuoteType, MAX_MARK_LEN};
use crate::tokdef::{KeywordKind, MAX_NAME_LEN};
use memchr::memmem;
use ulc_core::chars::{decode_utf8, encode_utf8};
use ulc_core::BufferPool;
use ulc_escape::litstr_escape;

/// A classified keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub text: String,
    pub kind: KeywordKind,
}

/// What a keyword may not collide with.
pub struct KeywordContext<'a> {
    pub chars: &'a CharClassTable,
    pub case_insensitive: bool,
    pub comments: &'a MarkerSet<CommentType>,
    pub quotes: &'a MarkerSet<QuoteType>,
}

/// `-?[0-9]+`
pub fn is_pure_int(word: &[u8]) -> bool {
    let digits = word.strip_prefix(b"-").unwrap_or(word);
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

/// Decode the escapes of a keyword word, upper-casing ASCII when the
/// lexicon is case-insensitive.
fn decode_keyword(word: &[u8], case_insensitive: bool) -> Result<Vec<u8>, SpecErrorKind> {
    let invalid = |reason| SpecErrorKind::InvalidKeyword {
        keyword: String::from_utf8_lossy(word).into_owned(),
        reason,
    };
    let fold = |b: u8| if case_insensitive { b.to_ascii_uppercase() } else { b };

    let pool = BufferPool::global();
    let mut buf = pool.acquire(MAX_NAME_LEN + 1, 32);
    let mut i = 0;

    while let Some(&b) = word.get(i) {
        if buf.len() > MAX_NAME_LEN {
            pool.release(buf);
            return Err(invalid("too long"));
        }
        if b != b'\\' {
            buf.push(fold(b));
            i += 1;
            continue;
        }

        let rest = &word[i + 1..];
        match litstr_escape(rest) {
            Some((cp, used)) => {
                let cp = match u8::try_from(cp) {
                    Ok(c) if c.is_ascii() => u32::from(fold(c)),
                    _ => cp,
                };
                let Some((bytes, n)) = encode_utf8(cp) else {
                    pool.release(buf);
                    return Err(invalid("encoding error"));
                };
                buf.append(&bytes[..n]);
                i += 1 + used;
            }
            None => {
                buf.push(b'\\');
                if let Some(&next) = rest.first() {
                    buf.push(next);
                }
                i += 1 + rest.len().min(1);
            }
        }
    }

    let text = buf.export();
    pool.release(buf);
    if text.len() > MAX_NAME_LEN {
        return Err(invalid("too long"));
    }
    Ok(text)
}

/// Whether `text` is an ASCII identifier under the char table.
///
/// Returns `Err` if an identifier char outside ASCII is met.
fn is_idstr(text: &[u8], chars: &CharClassTable) -> Result<bool, &'static str> {
    let mut rest = text;
    let mut first = true;

    while let Some((cp, n)) = decode_utf8(rest) {
        let ok = if first { chars.is_id_first(cp) } else { chars.is_id(cp) };
        if !ok {
            return Ok(false);
        }
        if n > 1 {
            return Err("unicode chars are not permitted");
        }
        first = false;
        rest = &rest[n..];
    }
    Ok(!first && rest.is_empty())
}

/// Classify the keyword of a token line.
///
/// An empty word or a bare integer means the token has no keyword.
pub fn classify_keyword(word: &[u8], ctx: &KeywordContext<'_>) -> Result<Keyword, SpecErrorKind> {
    if word.is_empty() || is_pure_int(word) {
        return Ok(Keyword {
            text: String::new(),
            kind: KeywordKind::User,
        });
    }

    let bytes = decode_keyword(word, ctx.case_insensitive)?;
    let invalid = |reason| SpecErrorKind::InvalidKeyword {
        keyword: String::from_utf8_lossy(&bytes).into_owned(),
        reason,
    };
    let text = simdutf8::basic::from_utf8(&bytes)
        .map_err(|_| invalid("encoding error"))?
        .to_string();

    match is_idstr(&bytes, ctx.chars) {
        Ok(true) => {
            return Ok(Keyword {
                text,
                kind: KeywordKind::Idstr,
            })
        }
        Ok(false) => {}
        Err(reason) => return Err(invalid(reason)),
    }

    if bytes.contains(&b' ') {
        return Err(invalid("contains a space"));
    }
    if bytes.len() > 1 && bytes.iter().any(|&b| b == b'\n' || b == b'\t') {
        return Err(invalid("contains a line feed or tab"));
    }
    if ctx.comments.iter().any(|c| memmem::find(&bytes, c.start.as_bytes()).is_some()) {
        return Err(invalid("contains a comment mark"));
    }
    if ctx.quotes.iter().any(|q| memmem::find(&bytes, q.start.as_bytes()).is_some()) {
        return Err(invalid("contains a quote mark"));
    }

    let kind = if bytes.len() == 1 {
        KeywordKind::OneChar
    } else if bytes.len() > MAX_MARK_LEN {
        return Err(invalid("too long for a multi-char token"));
    } else {
        KeywordKind::TwoPlus
    };
    Ok(Keyword { text, kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::char_class::CharClass;
    use crate::marker::CommentFlags;
    use pretty_assertions::assert_eq;

    struct Fixture {
        chars: CharClassTable,
        comments: MarkerSet<CommentType>,
        quotes: MarkerSet<QuoteType>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut chars = CharClassTable::new();
            for b in (b'a'..=b'z').chain(b'A'..=b'Z').chain([b'_']) {
                chars.insert(b, CharClass::ID_FIRST | CharClass::ID);
            }
            for b in b'0'..=b'9' {
                chars.insert(b, CharClass::ID);
            }
            let mut comments = MarkerSet::new();
            comments
                .push(CommentType::new("//", "\n", CommentFlags::ONELINE))
                .unwrap();
            Self {
                chars,
                comments,
                quotes: MarkerSet::new(),
            }
        }

        fn classify(&self, word: &str, case_insensitive: bool) -> Result<Keyword, SpecErrorKind> {
            let ctx = KeywordContext {
                chars: &self.chars,
                case_insensitive,
                comments: &self.comments,
                quotes: &self.quotes,
            };
            classify_keyword(word.as_bytes(), &ctx)
        }
    }

    fn kind(fx: &Fixture, word: &str) -> KeywordKind {
        fx.classify(word, false).unwrap().kind
    }

    #[test]
    fn test_kinds() {
        let fx = Fixture::new();
        assert_eq!(kind(&fx, ""), KeywordKind::User);
        assert_eq!(kind(&fx, "-12"), KeywordKind::User);
        assert_eq!(kind(&fx, "while"), KeywordKind::Idstr);
        assert_eq!(kind(&fx, "x2"), KeywordKind::Idstr);
        assert_eq!(kind(&fx, "+"), KeywordKind::OneChar);
        assert_eq!(kind(&fx, "<<="), KeywordKind::TwoPlus);
        assert_eq!(kind(&fx, "a+"), KeywordKind::TwoPlus);
    }

    #[test]
    fn test_escapes_and_case() {
        let fx = Fixture::new();
        let kw = fx.classify(r"\n", false).unwrap();
        assert_eq!(kw, Keyword { text: "\n".into(), kind: KeywordKind::OneChar });

        let kw = fx.classify(r"\x41nd", true).unwrap();
        assert_eq!(kw, Keyword { text: "AND".into(), kind: KeywordKind::Idstr });
    }

    #[test]
    fn test_rejections() {
        let fx = Fixture::new();
        for word in ["/*//", "a\\tb", "abcdefghij+klmnopq", "é"] {
            assert!(
                matches!(fx.classify(word, false), Err(SpecErrorKind::InvalidKeyword { .. })),
                "{word}"
            );
        }
        assert!(fx.classify(&"k".repeat(40), false).is_err());
    }

    #[test]
    fn test_pure_int() {
        assert!(is_pure_int(b"42"));
        assert!(is_pure_int(b"-3"));
        assert!(!is_pure_int(b"-"));
        assert!(!is_pure_int(b"4a"));
    }
}
