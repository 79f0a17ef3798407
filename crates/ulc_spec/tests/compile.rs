use pretty_assertions::assert_eq;
use proptest::prelude::*;
use ulc_spec::{
    CharClass, CompileOptions, CompiledSpec, KeywordKind, MemoryResolver, QuoteFlags, ReservedToken,
    SpecErrorKind, SpecResult, UlcSpecCompiler,
};

const BOM: &str = "\u{FEFF}";

fn spec(header: &str, body: &str) -> String {
    format!("{BOM}#@ulc-c2.3{header}\n{body}")
}

fn compile_text(text: &str) -> SpecResult<CompiledSpec> {
    compile_with(text, &MemoryResolver::new())
}

fn compile_with(text: &str, resolver: &MemoryResolver) -> SpecResult<CompiledSpec> {
    let mut compiler = UlcSpecCompiler::new(CompileOptions::default()).unwrap();
    compiler.compile_with("lang", text.as_bytes(), resolver)
}

const C_LIKE: &str = r#"ID_FIRST_CHARS: a-zA-Z_
ID_CHARS: a-zA-Z0-9_
QUOTE_TYPE: "
COMMENT_TYPE: // \n
NUMBER_PREFIXES: 0x:16 0o:8 0b:2
"#;

#[test]
fn test_c_like_char_table() {
    let out = compile_text(&spec("", C_LIKE)).unwrap();

    for ch in (b'a'..=b'z').chain(b'A'..=b'Z').chain([b'_']) {
        assert!(out.class_of(ch).contains(CharClass::ID_FIRST | CharClass::ID), "{}", ch as char);
    }
    for ch in b'0'..=b'9' {
        assert!(out.class_of(ch).contains(CharClass::ID));
        assert!(!out.class_of(ch).contains(CharClass::ID_FIRST));
    }
    assert!(out.class_of(b'"').contains(CharClass::QUOTE));
    assert!(out.class_of(b'/').contains(CharClass::COMMENT));

    let mut prefixes: Vec<(&str, u32)> = out
        .number_prefixes
        .iter()
        .map(|p| (p.prefix.as_str(), p.radix))
        .collect();
    prefixes.sort();
    assert_eq!(prefixes, vec![("0b", 2), ("0o", 8), ("0x", 16)]);
    assert!(out.number_prefixes.iter().all(|p| p.prefix.len() == 2));
}

#[test]
fn test_c_like_tokens() {
    let body = "%%\nIF if 300\nELSE else\nPLUS +\nINC ++\nSEMI ;\nEOF\n";
    let out = compile_text(&spec("", &format!("{C_LIKE}{body}"))).unwrap();

    assert_eq!(out.find_keyword("else").unwrap().tok_id, 301);
    assert_eq!(out.find_keyword("if").unwrap().kind, KeywordKind::Idstr);
    assert_eq!(out.find_keyword("++").unwrap().kind, KeywordKind::TwoPlus);
    assert_eq!(out.find_view_by_id(i32::from(b';')).unwrap().name, "SEMI");
    assert_eq!(out.find_view_by_name("INC").unwrap().id, 302);
    assert_eq!(out.reserved_id(ReservedToken::Eof), 303);

    assert!(out.class_of(b'+').contains(CharClass::SINGLE_CHAR | CharClass::TWO_PLUS));
    let quote = out.quote_type_for(b"\"abc\"").unwrap();
    assert_eq!((quote.end.as_str(), quote.tok_id), ("\"", i32::from(b'"')));
    assert_eq!(out.comment_type_for(b"// note").unwrap().end, "\n");
}

#[test]
fn test_idempotent_compilation() {
    let text = spec("", &format!("{C_LIKE}NUMBER_SUFFIXES: u l ul\n%%\nIF if 300\nPLUS +\n"));
    let first = compile_text(&text).unwrap();
    let second = compile_text(&text).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_quote_replaced_in_place() {
    let header = "QUOTE_TYPE: \"\nQUOTE_TYPE: '\nQUOTE_TYPE: token=300,STR options=multiline \"\n";
    let out = compile_text(&spec("", header)).unwrap();

    assert_eq!(out.quote_types.len(), 2);
    let dq = out.quote_types.get(0).unwrap();
    assert_eq!(dq.start, "\"");
    assert_eq!(dq.tok_id, 300);
    assert!(dq.flags.contains(QuoteFlags::MULTILINE));
    assert_eq!(out.quote_types.get(1).unwrap().start, "'");
    assert_eq!(out.find_view_by_name("STR").unwrap().id, 300);
}

#[test]
fn test_marker_collisions() {
    let err = compile_text(&spec("", "COMMENT_TYPE: /* */\nQUOTE_TYPE: /*\n")).unwrap_err();
    assert_eq!(err.kind, SpecErrorKind::CommentInQuote("/*".into()));
    assert_eq!(err.location.line, 0);

    let err = compile_text(&spec("", "COMMENT_TYPE: options=oneline #\nQUOTE_TYPE: #{ }\n")).unwrap_err();
    assert_eq!(err.kind, SpecErrorKind::CommentInQuote("#".into()));

    let err = compile_text(&spec("", "QUOTE_TYPE: '\nCOMMENT_TYPE: '' ''\n")).unwrap_err();
    assert_eq!(err.kind, SpecErrorKind::QuoteInComment("'".into()));
}

#[test]
fn test_quote_token_ids_stay_clear_of_reserved() {
    let err = compile_text(&spec("", "QUOTE_TYPE: token=-1,STR \"\n%%\nA 10\n")).unwrap_err();
    assert_eq!(err.kind, SpecErrorKind::TokenIdInUse { id: -1, name: "EOF".into() });

    let err = compile_text(&spec("", "QUOTE_TYPE: token=300,STR \"\n%%\nEOF 300\n")).unwrap_err();
    assert_eq!(err.kind, SpecErrorKind::TokenIdInUse { id: 300, name: "STR".into() });

    let out = compile_text(&spec("", "QUOTE_TYPE: token=300,STR \"\n%%\nEOF 301\n")).unwrap();
    assert_eq!(out.find_view_by_id(300).unwrap().name, "STR");
    assert_eq!(out.find_view_by_id(301).unwrap().name, "EOF");
}

#[test]
fn test_inheritance() {
    let mut res = MemoryResolver::new();
    res.insert(
        "base",
        spec("", "ID_FIRST_CHARS: a-z\nID_CHARS: a-z0-9\nQUOTE_TYPE: '\n%%\nIF if 300\n"),
    );

    let out = compile_with(&spec(":base", "QUOTE_TYPE: \"\n%%\nELSE else\n"), &res).unwrap();
    assert_eq!(out.quote_types.len(), 2);
    assert!(out.class_of(b'q').contains(CharClass::ID_FIRST));
    assert_eq!(out.find_keyword("if").unwrap().tok_id, 300);
    assert_eq!(out.find_keyword("else").unwrap().tok_id, 301);

    // The child's directives run after the parent's.
    res.insert("strict", spec(":base", "CASE_SENSITIVE: false\n"));
    let out = compile_with(&spec(":strict", ""), &res).unwrap();
    assert!(!out.is_case_sensitive());
}

#[test]
fn test_inheritance_errors() {
    let mut res = MemoryResolver::new();
    res.insert("a", spec(":b", ""));
    res.insert("b", spec(":a", ""));
    let err = compile_with(&spec(":a", ""), &res).unwrap_err();
    assert!(matches!(err.kind, SpecErrorKind::MultipleParents(_)));

    let err = compile_text(&spec(":nowhere", "")).unwrap_err();
    assert_eq!(err.kind, SpecErrorKind::ParentNotFound("nowhere".into()));
}

#[test]
fn test_canonicalize_number() {
    let text = spec("", &format!("{C_LIKE}NUMBER_SUFFIXES: u l ul\n"));
    let out = compile_text(&text).unwrap();

    let lit = out.canonicalize_number(b"0x1fu;").unwrap();
    assert_eq!((lit.text.as_str(), lit.radix, lit.suffix.as_deref(), lit.consumed), ("0x1F", 16, Some("u"), 5));

    let lit = out.canonicalize_number(b"0b1_01ul").unwrap();
    assert_eq!((lit.text.as_str(), lit.suffix.as_deref(), lit.consumed), ("0x5", Some("ul"), 8));

    let lit = out.canonicalize_number(b"0o17").unwrap();
    assert_eq!(lit.text, "0xF");

    let lit = out.canonicalize_number(b"3.14 ").unwrap();
    assert_eq!((lit.text.as_str(), lit.radix, lit.consumed), (".314E1", 10, 4));

    let lit = out.canonicalize_number(b"007l").unwrap();
    assert_eq!((lit.text.as_str(), lit.suffix.as_deref()), ("7", Some("l")));

    assert!(out.canonicalize_number(b"abc").is_err());
}

#[test]
fn test_json_dump_shape() {
    let out = compile_text(&spec("", &format!("{C_LIKE}%%\nIF if 300\n"))).unwrap();
    let json: serde_json::Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
    assert_eq!(json["name"], "lang");
    assert_eq!(json["numberPrefixes"].as_array().unwrap().len(), 3);
    assert_eq!(json["quoteTypes"][0]["start"], "\"");
    assert!(json["tokens"]["views"].is_array());
}

fn numbered_body(ids: &[i32]) -> String {
    let mut body = String::from("%%\n");
    for (i, id) in ids.iter().enumerate() {
        body.push_str(&format!("T{i} {id}\n"));
    }
    body
}

proptest! {
    #[test]
    fn prop_lookup_by_id_matches_scan(
        ids in prop::collection::btree_set(1i32..5000, 1..40)
            .prop_map(|s| s.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
        lookups in prop::collection::vec(-10i32..5010, 1..20),
    ) {
        let out = compile_text(&spec("", &numbered_body(&ids))).unwrap();
        let views = out.tokens.views();
        prop_assert!(views.windows(2).all(|w| w[0].id < w[1].id));

        for id in ids.iter().copied().chain(lookups) {
            let scanned = out
                .tokens
                .reserved()
                .iter()
                .chain(views.iter())
                .find(|v| v.id == id);
            prop_assert_eq!(out.find_view_by_id(id), scanned);
        }
    }

    #[test]
    fn prop_no_duplicate_ids_or_names(
        ids in prop::collection::btree_set(1i32..5000, 1..40),
        quote_id in -8i32..5000,
        eof_id in prop::option::of(1i32..5000),
    ) {
        let ids: Vec<i32> = ids.into_iter().collect();
        let mut body = numbered_body(&ids);
        if let Some(id) = eof_id {
            body.push_str(&format!("EOF {id}\n"));
        }
        let text = spec("", &format!("QUOTE_TYPE: token={quote_id},QSTR \"\n{body}"));

        let clash = quote_id <= 0
            || eof_id.is_some_and(|id| id == quote_id || ids.contains(&id));
        let out = match compile_text(&text) {
            Ok(out) => out,
            Err(err) => {
                prop_assert!(clash, "unexpected failure: {}", err);
                prop_assert!(matches!(err.kind, SpecErrorKind::TokenIdInUse { .. }), "unexpected error kind");
                return Ok(());
            }
        };
        prop_assert!(!clash);

        let all: Vec<_> = out.tokens.reserved().iter().chain(out.tokens.views()).collect();
        let mut seen_ids: Vec<i32> = all.iter().map(|v| v.id).collect();
        seen_ids.sort_unstable();
        seen_ids.dedup();
        prop_assert_eq!(seen_ids.len(), all.len());

        let mut names: Vec<&str> = all.iter().map(|v| v.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        prop_assert_eq!(names.len(), all.len());
    }
}
