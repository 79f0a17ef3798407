//! Header directives.
//!
//! Each handler receives the value of its line, after the `NAME:` word, and
//! mutates the [`SpecBuilder`]. Lookup is a binary search over
//! [`DIRECTIVES`], which must stay sorted by name.

use crate::builder::{
    IdMaxLength, LexFlags, NumberPrefix, PrependInput, SpecBuilder, DEFAULT_DECIMAL_SEPARATOR,
    MAX_NUMBER_PREFIXES, MAX_PREFIX_LEN, MAX_SUFFIXES_SIZE, MAX_SUFFIX_LEN,
};
use crate::char_class::{CharClass, CharRange};
use crate::error::SpecErrorKind;
use crate::marker::{decode_mark, CommentFlags, CommentType, QuoteFlags, QuoteType};
use crate::tokdef::{check_token_name, KeywordKind, MAX_NAME_LEN};
use ulc_core::chars::{decode_utf8, is_graph, is_hex_digit, split_word, MAX_ASCII};
use ulc_diagnostics::messages;
use ulc_escape::{decode_escaped, decode_simple};
use ulc_num::radix::{MAX_RADIX, MIN_RADIX};

type Handler = fn(&mut SpecBuilder<'_>, &str) -> Result<(), SpecErrorKind>;

pub(crate) static DIRECTIVES: [(&str, Handler); 15] = [
    ("CASE_SENSITIVE", case_sensitive),
    ("CHAR_TOK", char_tok),
    ("COMMENT_TYPE", comment_type),
    ("DECIMAL_SEPARATOR", decimal_separator),
    ("DOMAIN", domain),
    ("ID_CHARS", id_chars),
    ("ID_FIRST_CHARS", id_first_chars),
    ("ID_MAX_LENGTH", id_max_length),
    ("LINEFEED_GUARD", linefeed_guard),
    ("NOT_CHAR_TOK", not_char_tok),
    ("NUMBER_PREFIXES", number_prefixes),
    ("NUMBER_SUFFIXES", number_suffixes),
    ("PREPEND_INPUT", prepend_input),
    ("QUOTE_TYPE", quote_type),
    ("RENAME", rename),
];

/// Run the handler of directive `name`.
pub(crate) fn apply_directive(b: &mut SpecBuilder<'_>, name: &str, value: &str) -> Result<(), SpecErrorKind> {
    let index = DIRECTIVES
        .binary_search_by(|(n, _)| n.cmp(&name))
        .map_err(|_| SpecErrorKind::UnknownAttribute(name.to_string()))?;
    let (_, handler) = DIRECTIVES[index];
    tracing::debug!(location = %b.location, directive = name, value, "apply directive");
    handler(b, value)
}

/// Blank-separated words of `value`.
fn words(value: &str) -> impl Iterator<Item = &str> {
    value.split([' ', '\t']).filter(|w| !w.is_empty())
}

/// The first word and the rest of `value`, both trimmed.
fn first_word(value: &str) -> (&str, &str) {
    let (word, rest) = split_word(value.as_bytes());
    let start = value.len() - value.trim_start_matches([' ', '\t']).len();
    let word_str = &value[start..start + word.len()];
    (word_str, &value[value.len() - rest.len()..])
}

fn parse_bool(directive: &'static str, value: &str) -> Result<bool, SpecErrorKind> {
    let (word, _) = first_word(value);
    if word.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if word.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(SpecErrorKind::ExpectedBoolean {
            directive,
            found: word.to_string(),
        })
    }
}

fn case_sensitive(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let sensitive = parse_bool("CASE_SENSITIVE", value)?;
    b.flags.set(LexFlags::CASE_INSENSITIVE, !sensitive);
    Ok(())
}

fn linefeed_guard(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let guard = parse_bool("LINEFEED_GUARD", value)?;
    b.flags.set(LexFlags::LINEFEED_GUARD, guard);
    Ok(())
}

fn domain(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let found = value.trim();
    if found != b.options.domain {
        return Err(SpecErrorKind::DomainMismatch {
            found: found.to_string(),
            expected: b.options.domain.clone(),
        });
    }
    Ok(())
}

fn id_max_length(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let invalid = || SpecErrorKind::InvalidIdMaxLength(value.trim().to_string());
    let mut it = words(value);

    let bytes = it
        .next()
        .and_then(|w| w.parse::<i64>().ok())
        .filter(|&n| n > 0)
        .ok_or_else(invalid)?;
    let uchars = match it.next() {
        Some(w) => w.parse::<i64>().map_err(|_| invalid())?,
        None => bytes,
    };
    let uchars = if uchars <= 0 { bytes } else { uchars };

    let clamp = |n: i64| u32::try_from(n).unwrap_or(u32::MAX);
    b.id_max_length = Some(IdMaxLength {
        bytes: clamp(bytes),
        uchars: clamp(uchars),
    });
    Ok(())
}

fn number_prefixes(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let mut prefixes = Vec::new();

    for word in words(value) {
        let invalid = || SpecErrorKind::InvalidNumberPrefix(word.to_string());
        let (prefix, radix) = word.split_once(':').ok_or_else(invalid)?;
        if !prefix.starts_with('0') || prefix.len() > MAX_PREFIX_LEN {
            return Err(invalid());
        }
        let radix = radix
            .parse::<u32>()
            .ok()
            .filter(|r| (MIN_RADIX..=MAX_RADIX).contains(r))
            .ok_or_else(|| SpecErrorKind::InvalidRadix(word.to_string()))?;

        if prefixes.len() >= MAX_NUMBER_PREFIXES {
            return Err(SpecErrorKind::TooMany {
                what: "number prefixes",
                max: MAX_NUMBER_PREFIXES,
            });
        }
        prefixes.push(NumberPrefix {
            prefix: prefix.to_string(),
            radix,
        });
    }

    // Longest first so the scanner matches greedily.
    prefixes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    b.prefixes = prefixes;
    Ok(())
}

fn decimal_separator(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let (word, _) = first_word(value);
    let sep = match word.as_bytes().first() {
        None => DEFAULT_DECIMAL_SEPARATOR,
        Some(&ch) if is_graph(ch) && !ch.is_ascii_alphanumeric() && ch != b'-' && ch != b'.' => ch,
        Some(_) => return Err(SpecErrorKind::InvalidDecimalSeparator(word.to_string())),
    };
    b.decimal_separator = sep;
    Ok(())
}

fn number_suffixes(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let mut suffixes: Vec<&str> = Vec::new();
    for word in words(value) {
        let valid = word.bytes().all(|ch| is_graph(ch) && !ch.is_ascii_digit()) && word.len() <= MAX_SUFFIX_LEN;
        if !valid {
            b.warn(&messages::NUMBER_SUFFIX_DROPPED, &[word]);
            continue;
        }
        if !suffixes.contains(&word) {
            suffixes.push(word);
        }
    }
    suffixes.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut kept = Vec::with_capacity(suffixes.len());
    let mut size = 0;
    for suffix in suffixes {
        if size + suffix.len() + 1 > MAX_SUFFIXES_SIZE {
            b.warn(&messages::NUMBER_SUFFIX_DROPPED, &[suffix]);
            continue;
        }
        size += suffix.len() + 1;
        kept.push(suffix.to_string());
    }
    b.suffixes = kept;
    Ok(())
}

fn prepend_input(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let line = value.trim_start_matches([' ', '\t']);
    let invalid = || SpecErrorKind::InvalidPrependInput(line.trim_end().to_string());

    let (text, ignore_line_feeds) = if let Some(body) = line.strip_prefix('"') {
        let (bytes, used) = decode_escaped(body.as_bytes(), Some(b'"')).map_err(|_| invalid())?;
        let text = String::from_utf8(bytes).map_err(|_| invalid())?;
        let rest = &body[used..];
        let ignore = if rest.trim().is_empty() {
            false
        } else {
            parse_bool("PREPEND_INPUT", rest)?
        };
        (text, ignore)
    } else if let Some(body) = line.strip_prefix('\'') {
        let text = body.trim_end().strip_suffix('\'').ok_or_else(invalid)?;
        (text.to_string(), false)
    } else {
        return Err(invalid());
    };

    b.prepend_input = if text.is_empty() {
        None
    } else {
        Some(PrependInput {
            line_feeds: text.matches('\n').count() as u32,
            text,
            ignore_line_feeds,
        })
    };
    Ok(())
}

fn rename(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let mut it = words(value);
    let (Some(from), Some(to)) = (it.next(), it.next()) else {
        return Err(SpecErrorKind::MissingArgument {
            directive: "RENAME",
            what: "a reserved name and a new name",
        });
    };
    if to.len() > MAX_NAME_LEN {
        return Err(SpecErrorKind::InvalidTokenName(to.to_string()));
    }
    check_token_name(to)?;
    b.tokens.rename_reserved(from, to)
}

/// The bytes of each word, with simple escapes decoded.
fn decoded_chars(value: &str) -> Result<Vec<u8>, SpecErrorKind> {
    let mut out = Vec::new();
    for word in words(value) {
        let (bytes, _) = decode_simple(word.as_bytes(), None)?;
        out.extend(bytes);
    }
    Ok(out)
}

fn char_tok(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    for ch in decoded_chars(value)? {
        b.chars.insert(ch, CharClass::SINGLE_CHAR);
    }
    Ok(())
}

fn not_char_tok(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    for ch in decoded_chars(value)? {
        b.chars.remove(ch, CharClass::SINGLE_CHAR);
    }
    Ok(())
}

/// One char of a range word: `0xHEX` or a UTF-8 char.
fn range_char(s: &[u8], hex_only: bool) -> Option<(u32, usize)> {
    let hex_digits = |s: &[u8]| s.iter().take(8).take_while(|&&b| is_hex_digit(b)).count();
    let parse_hex = |s: &[u8]| {
        let text = std::str::from_utf8(s).ok()?;
        u32::from_str_radix(text, 16).ok()
    };

    if let Some(rest) = s.strip_prefix(b"0x") {
        let n = hex_digits(rest);
        if n > 0 {
            return Some((parse_hex(&rest[..n])?, 2 + n));
        }
    }
    if hex_only {
        let n = hex_digits(s);
        if n > 0 {
            return Some((parse_hex(&s[..n])?, n));
        }
    }
    decode_utf8(s)
}

/// Parse the ranges of a word such as `a-zA-Z_` or `0x3B1-3C9`.
pub(crate) fn parse_char_ranges(word: &str) -> Result<Vec<CharRange>, SpecErrorKind> {
    let invalid = || SpecErrorKind::InvalidCharRange(word.to_string());
    let bytes = word.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let (first, n) = range_char(&bytes[i..], false).ok_or_else(invalid)?;
        let first_is_hex = bytes[i..].starts_with(b"0x") && n > 2;
        i += n;

        let mut last = first;
        if bytes.get(i) == Some(&b'-') && i + 1 < bytes.len() {
            let (cp, n) = range_char(&bytes[i + 1..], first_is_hex).ok_or_else(invalid)?;
            if cp < first {
                return Err(invalid());
            }
            last = cp;
            i += 1 + n;
        }
        ranges.push(CharRange::new(first, last));
    }
    Ok(ranges)
}

fn id_chars(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let wide = apply_id_ranges(b, value, CharClass::ID)?;
    b.chars.set_id_ranges(wide);
    Ok(())
}

fn id_first_chars(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    let wide = apply_id_ranges(b, value, CharClass::ID_FIRST)?;
    b.chars.set_id_first_ranges(wide);
    Ok(())
}

/// Set `class` on the ASCII part of each range and return the wide parts.
fn apply_id_ranges(b: &mut SpecBuilder<'_>, value: &str, class: CharClass) -> Result<Vec<CharRange>, SpecErrorKind> {
    let max_ascii = u32::from(MAX_ASCII);
    let mut wide = Vec::new();

    for word in words(value) {
        for range in parse_char_ranges(word)? {
            if range.first <= max_ascii {
                let mut warned = false;
                for cp in range.first..=range.last.min(max_ascii) {
                    let ch = cp as u8;
                    if class == CharClass::ID_FIRST && ch.is_ascii_digit() {
                        if !warned {
                            b.warn(&messages::IMPROPER_ID_FIRST_CHAR, &[word]);
                            warned = true;
                        }
                        continue;
                    }
                    b.chars.insert(ch, class);
                }
            }
            if range.last > max_ascii {
                if wide.len() >= b.options.max_wide_ranges {
                    return Err(SpecErrorKind::TooMany {
                        what: "wide identifier ranges",
                        max: b.options.max_wide_ranges,
                    });
                }
                wide.push(CharRange::new(range.first.max(max_ascii + 1), range.last));
            }
        }
    }
    Ok(wide)
}

fn comment_type(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    const DIRECTIVE: &str = "COMMENT_TYPE";
    let (mut word, mut rest) = first_word(value);
    let mut flags = CommentFlags::empty();

    if let Some(options) = word.strip_prefix("options=") {
        for opt in options.split(',').filter(|o| !o.is_empty()) {
            flags |= match opt {
                "oneline" => CommentFlags::ONELINE,
                "column0" => CommentFlags::COLUMN0,
                "nested" => CommentFlags::NESTED,
                _ => {
                    return Err(SpecErrorKind::UnknownOption {
                        option: opt.to_string(),
                        directive: DIRECTIVE,
                    })
                }
            };
        }
        (word, rest) = first_word(rest);
    }

    if word.is_empty() {
        return Err(SpecErrorKind::MissingArgument {
            directive: DIRECTIVE,
            what: "a start mark",
        });
    }
    let start = decode_mark(word.as_bytes(), "comment", false)?;
    let end = if flags.contains(CommentFlags::ONELINE) {
        "\n".to_string()
    } else {
        let (end_word, _) = first_word(rest);
        if end_word.is_empty() {
            return Err(SpecErrorKind::MissingArgument {
                directive: DIRECTIVE,
                what: "an end mark",
            });
        }
        decode_mark(end_word.as_bytes(), "comment", false)?
    };

    let index = b.comments.upsert(CommentType::new(&start, &end, flags))?;
    b.comments.check_start_at(index)
}

/// `token=` of a quote type: an id, a name, or both.
fn parse_quote_token(spec: &str) -> Result<(Option<i32>, Option<String>), SpecErrorKind> {
    let mut fields = spec.split(',');
    let first = fields.next().unwrap_or_default();
    let lead = first.as_bytes().first().copied();

    match lead {
        Some(ch) if ch.is_ascii_alphabetic() || ch == b'_' => Ok((None, Some(first.to_string()))),
        Some(ch) if ch.is_ascii_digit() || (ch == b'-' && first.len() > 1) => {
            let id = first
                .parse::<i32>()
                .map_err(|_| SpecErrorKind::InvalidTokenId(first.to_string()))?;
            let name = fields.next().filter(|n| !n.is_empty()).map(str::to_string);
            Ok((Some(id), name))
        }
        _ => Err(SpecErrorKind::InvalidTokenId(first.to_string())),
    }
}

fn quote_type(b: &mut SpecBuilder<'_>, value: &str) -> Result<(), SpecErrorKind> {
    const DIRECTIVE: &str = "QUOTE_TYPE";
    let mut flags = QuoteFlags::empty();
    let mut explicit_id = None;
    let mut name = None;

    let (mut word, mut rest) = first_word(value);
    loop {
        if let Some(spec) = word.strip_prefix("token=") {
            (explicit_id, name) = parse_quote_token(spec)?;
        } else if let Some(options) = word.strip_prefix("options=") {
            for opt in options.split(',').filter(|o| !o.is_empty()) {
                flags |= match opt {
                    "asymmetric" => QuoteFlags::ASYMMETRIC,
                    "nothing" => QuoteFlags::NOTHING,
                    "open" => QuoteFlags::OPEN,
                    "multiline" => QuoteFlags::MULTILINE,
                    "right_exclusive" => QuoteFlags::RIGHT_EXCLUSIVE,
                    _ => {
                        return Err(SpecErrorKind::UnknownOption {
                            option: opt.to_string(),
                            directive: DIRECTIVE,
                        })
                    }
                };
            }
        } else {
            break;
        }
        (word, rest) = first_word(rest);
    }

    if word.is_empty() {
        return Err(SpecErrorKind::MissingArgument {
            directive: DIRECTIVE,
            what: "a start mark",
        });
    }
    let start = decode_mark(word.as_bytes(), "quote", true)?;
    if start == "." || b.chars.contains(start.as_bytes()[0], CharClass::ID_FIRST) {
        return Err(SpecErrorKind::InvalidMark {
            what: "quote",
            mark: start,
        });
    }

    let end = if flags.contains(QuoteFlags::ASYMMETRIC) {
        let (end_word, after) = first_word(rest);
        if end_word.is_empty() {
            return Err(SpecErrorKind::MissingArgument {
                directive: DIRECTIVE,
                what: "an end mark",
            });
        }
        rest = after;
        decode_mark(end_word.as_bytes(), "quote", true)?
    } else if flags.intersects(QuoteFlags::OPEN | QuoteFlags::NOTHING) {
        String::new()
    } else {
        start.clone()
    };

    let tok_id = explicit_id.unwrap_or_else(|| i32::from(start.as_bytes()[0]));
    if let Some(other) = b.quotes.iter().find(|q| q.start != start && q.tok_id == tok_id) {
        return Err(SpecErrorKind::QuoteTokenInUse {
            id: tok_id,
            mark: other.start.clone(),
        });
    }

    if let Some(name) = &name {
        check_token_name(name)?;
        b.tokens.add_view(tok_id, name)?;
        b.tokens.add_keyword(&start, KeywordKind::Literal, name, tok_id);
    }

    let escmap = b.escapes.parse(&b.pool, rest.trim())?;
    let mut quote = QuoteType::new(start, end, flags, tok_id, escmap);
    quote.token_name = name;

    let index = b.quotes.upsert(quote)?;
    b.quotes.check_start_at(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompileOptions;
    use pretty_assertions::assert_eq;
    use ulc_escape::EscapeMapRegistry;

    fn run<F: FnOnce(&mut SpecBuilder<'_>)>(lines: &[&str], check: F) {
        let options = CompileOptions::default();
        let escapes = EscapeMapRegistry::new();
        let mut b = SpecBuilder::new(&options, &escapes);
        for line in lines {
            let (name, value) = line.split_once(": ").unwrap_or((line.trim_end_matches(':'), ""));
            apply_directive(&mut b, name, value).unwrap();
        }
        check(&mut b);
    }

    fn fail(line: &str) -> SpecErrorKind {
        let options = CompileOptions::default();
        let escapes = EscapeMapRegistry::new();
        let mut b = SpecBuilder::new(&options, &escapes);
        let (name, value) = line.split_once(": ").unwrap();
        apply_directive(&mut b, name, value).unwrap_err()
    }

    #[test]
    fn test_table_is_sorted() {
        assert!(DIRECTIVES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_unknown_directive() {
        assert_eq!(fail("COLOR: red"), SpecErrorKind::UnknownAttribute("COLOR".into()));
    }

    #[test]
    fn test_booleans() {
        run(&["CASE_SENSITIVE: false", "LINEFEED_GUARD: true"], |b| {
            assert!(b.case_insensitive());
            assert!(b.flags.contains(LexFlags::LINEFEED_GUARD));
        });
        assert!(matches!(fail("CASE_SENSITIVE: maybe"), SpecErrorKind::ExpectedBoolean { .. }));
    }

    #[test]
    fn test_domain() {
        run(&["DOMAIN: uls.link2next.io://season-1 "], |_| {});
        assert!(matches!(fail("DOMAIN: example.com"), SpecErrorKind::DomainMismatch { .. }));
    }

    #[test]
    fn test_id_max_length() {
        run(&["ID_MAX_LENGTH: 32"], |b| {
            assert_eq!(b.id_max_length, Some(IdMaxLength { bytes: 32, uchars: 32 }));
        });
        run(&["ID_MAX_LENGTH: 64 -1"], |b| {
            assert_eq!(b.id_max_length, Some(IdMaxLength { bytes: 64, uchars: 64 }));
        });
        run(&["ID_MAX_LENGTH: 64 16"], |b| {
            assert_eq!(b.id_max_length, Some(IdMaxLength { bytes: 64, uchars: 16 }));
        });
        assert_eq!(fail("ID_MAX_LENGTH: 0"), SpecErrorKind::InvalidIdMaxLength("0".into()));
    }

    #[test]
    fn test_number_prefixes_sorted_longest_first() {
        run(&["NUMBER_PREFIXES: 0x:16 0:8 0bin:2"], |b| {
            let got: Vec<(&str, u32)> = b.prefixes.iter().map(|p| (p.prefix.as_str(), p.radix)).collect();
            assert_eq!(got, vec![("0bin", 2), ("0x", 16), ("0", 8)]);
        });
        assert_eq!(fail("NUMBER_PREFIXES: x:16"), SpecErrorKind::InvalidNumberPrefix("x:16".into()));
        assert_eq!(fail("NUMBER_PREFIXES: 0z:37"), SpecErrorKind::InvalidRadix("0z:37".into()));
        assert!(matches!(
            fail("NUMBER_PREFIXES: 0a:2 0b:2 0c:2 0d:2 0e:2 0f:2 0g:2 0h:2 0i:2"),
            SpecErrorKind::TooMany { max: 8, .. }
        ));
    }

    #[test]
    fn test_decimal_separator() {
        run(&["DECIMAL_SEPARATOR: '"], |b| assert_eq!(b.decimal_separator, b'\''));
        run(&["DECIMAL_SEPARATOR:"], |b| assert_eq!(b.decimal_separator, b'_'));
        assert!(matches!(fail("DECIMAL_SEPARATOR: ."), SpecErrorKind::InvalidDecimalSeparator(_)));
        assert!(matches!(fail("DECIMAL_SEPARATOR: a"), SpecErrorKind::InvalidDecimalSeparator(_)));
    }

    #[test]
    fn test_number_suffixes() {
        run(&["NUMBER_SUFFIXES: u ul u1 ull toolong u"], |b| {
            assert_eq!(b.suffixes, vec!["ull", "ul", "u"]);
            assert_eq!(b.diagnostics.warnings().count(), 2);
        });
    }

    #[test]
    fn test_prepend_input() {
        run(&[r##"PREPEND_INPUT: "#line 1\n" true"##], |b| {
            let p = b.prepend_input.as_ref().unwrap();
            assert_eq!(p.text, "#line 1\n");
            assert_eq!(p.line_feeds, 1);
            assert!(p.ignore_line_feeds);
        });
        run(&["PREPEND_INPUT: 'raw text'  "], |b| {
            assert_eq!(b.prepend_input.as_ref().unwrap().text, "raw text");
        });
        run(&[r#"PREPEND_INPUT: """#], |b| assert!(b.prepend_input.is_none()));
        assert!(matches!(fail("PREPEND_INPUT: bare"), SpecErrorKind::InvalidPrependInput(_)));
        assert!(matches!(fail(r#"PREPEND_INPUT: "open"#), SpecErrorKind::InvalidPrependInput(_)));
    }

    #[test]
    fn test_rename() {
        run(&["RENAME: ID IDENT"], |b| {
            assert!(b.tokens.find_reserved("IDENT").is_some());
        });
        assert!(matches!(fail("RENAME: ID"), SpecErrorKind::MissingArgument { .. }));
        assert_eq!(fail("RENAME: ID 9x"), SpecErrorKind::InvalidTokenName("9x".into()));
    }

    #[test]
    fn test_char_tok() {
        run(&["NOT_CHAR_TOK: $ \\x40", "CHAR_TOK: \\t"], |b| {
            assert!(!b.chars.contains(b'$', CharClass::SINGLE_CHAR));
            assert!(!b.chars.contains(b'@', CharClass::SINGLE_CHAR));
            assert!(b.chars.contains(b'\t', CharClass::SINGLE_CHAR));
        });
    }

    #[test]
    fn test_char_ranges() {
        assert_eq!(
            parse_char_ranges("a-zA-Z_").unwrap(),
            vec![
                CharRange::new(b'a'.into(), b'z'.into()),
                CharRange::new(b'A'.into(), b'Z'.into()),
                CharRange::new(b'_'.into(), b'_'.into()),
            ]
        );
        assert_eq!(parse_char_ranges("0x3B1-3C9").unwrap(), vec![CharRange::new(0x3B1, 0x3C9)]);
        assert_eq!(parse_char_ranges("0x41-0x5A").unwrap(), vec![CharRange::new(0x41, 0x5A)]);
        assert_eq!(parse_char_ranges("가-힣").unwrap(), vec![CharRange::new(0xAC00, 0xD7A3)]);
        assert_eq!(parse_char_ranges("z-a").unwrap_err(), SpecErrorKind::InvalidCharRange("z-a".into()));
    }

    #[test]
    fn test_id_chars() {
        run(&["ID_FIRST_CHARS: a-z_ 0-9 0x100-0x17F", "ID_CHARS: a-z0-9_"], |b| {
            assert!(b.chars.contains(b'a', CharClass::ID_FIRST));
            assert!(!b.chars.contains(b'5', CharClass::ID_FIRST));
            assert!(b.chars.contains(b'5', CharClass::ID));
            assert_eq!(b.chars.id_first_ranges(), &[CharRange::new(0x100, 0x17F)]);
            assert!(b.chars.id_ranges().is_empty());
            assert_eq!(b.diagnostics.warnings().count(), 1);
        });
    }

    #[test]
    fn test_comment_types() {
        run(
            &[
                "COMMENT_TYPE: /* */",
                "COMMENT_TYPE: options=oneline //",
                "COMMENT_TYPE: options=column0 # \\n",
                "COMMENT_TYPE: /* **/",
            ],
            |b| {
                assert_eq!(b.comments.len(), 3);
                let first = b.comments.get(0).unwrap();
                assert_eq!((first.start.as_str(), first.end.as_str()), ("/*", "**/"));
                assert_eq!(b.comments.get(1).unwrap().end, "\n");
                let col0 = b.comments.get(2).unwrap();
                assert_eq!(col0.start, "\n#");
                assert_eq!(col0.line_feeds, 2);
            },
        );
        assert!(matches!(fail("COMMENT_TYPE: /*"), SpecErrorKind::MissingArgument { .. }));
        assert!(matches!(fail("COMMENT_TYPE: options=block /* */"), SpecErrorKind::UnknownOption { .. }));
    }

    #[test]
    fn test_quote_types() {
        run(
            &[
                "ID_FIRST_CHARS: a-z",
                "QUOTE_TYPE: \"",
                "QUOTE_TYPE: token=200,RAW options=asymmetric,multiline << >> verbatim",
                "QUOTE_TYPE: options=nothing <>",
            ],
            |b| {
                assert_eq!(b.quotes.len(), 3);
                let dq = b.quotes.get(0).unwrap();
                assert_eq!((dq.end.as_str(), dq.tok_id), ("\"", i32::from(b'"')));

                let raw = b.quotes.get(1).unwrap();
                assert_eq!(raw.end, ">>");
                assert_eq!(raw.tok_id, 200);
                assert_eq!(raw.token_name.as_deref(), Some("RAW"));
                assert!(raw.escmap.is_empty());
                assert_eq!(b.tokens.find_keyword("<<").unwrap().kind, KeywordKind::Literal);

                assert_eq!(b.quotes.get(2).unwrap().end, "");
            },
        );
    }

    #[test]
    fn test_quote_rejections() {
        assert!(matches!(fail("QUOTE_TYPE: ."), SpecErrorKind::InvalidMark { .. }));
        assert!(matches!(fail("QUOTE_TYPE: token=, \""), SpecErrorKind::InvalidTokenId(_)));
        assert!(matches!(
            fail("QUOTE_TYPE: options=asymmetric <<"),
            SpecErrorKind::MissingArgument { .. }
        ));

        let options = CompileOptions::default();
        let escapes = EscapeMapRegistry::new();
        let mut b = SpecBuilder::new(&options, &escapes);
        apply_directive(&mut b, "QUOTE_TYPE", "token=300 '").unwrap();
        assert_eq!(
            apply_directive(&mut b, "QUOTE_TYPE", "token=300 `").unwrap_err(),
            SpecErrorKind::QuoteTokenInUse { id: 300, mark: "'".into() }
        );
    }

    #[test]
    fn test_quote_replaced_in_place() {
        run(&["QUOTE_TYPE: '", "QUOTE_TYPE: \"", "QUOTE_TYPE: options=multiline '"], |b| {
            assert_eq!(b.quotes.len(), 2);
            let q = b.quotes.get(0).unwrap();
            assert_eq!(q.start, "'");
            assert!(q.flags.contains(QuoteFlags::MULTILINE));
        });
    }
}
