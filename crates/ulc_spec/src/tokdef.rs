//! Token definitions: reserved tokens, views, aliases and keywords.

use crate::error::SpecErrorKind;
use rustc_hash::FxHashMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use lasso::{Rodeo, Spur};

/// Longest token name or keyword, in bytes.
pub const MAX_NAME_LEN: usize = 31;

/// How a keyword is matched by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeywordKind {
    /// No keyword: the token is produced by user code.
    User,
    /// Identifier-shaped; matched after an identifier is scanned.
    Idstr,
    OneChar,
    /// A fixed sequence of two or more chars.
    TwoPlus,
    /// The start mark of a quote type.
    Literal,
}

/// Tokens every lexicon has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservedToken {
    LineNum,
    None,
    Err,
    Eoi,
    Eof,
    Id,
    Number,
    Tmpl,
    Link,
}

impl ReservedToken {
    pub const ALL: [ReservedToken; 9] = [
        ReservedToken::LineNum,
        ReservedToken::None,
        ReservedToken::Err,
        ReservedToken::Eoi,
        ReservedToken::Eof,
        ReservedToken::Id,
        ReservedToken::Number,
        ReservedToken::Tmpl,
        ReservedToken::Link,
    ];

    pub fn default_name(self) -> &'static str {
        match self {
            ReservedToken::LineNum => "LINENUM",
            ReservedToken::None => "NONE",
            ReservedToken::Err => "ERR",
            ReservedToken::Eoi => "EOI",
            ReservedToken::Eof => "EOF",
            ReservedToken::Id => "ID",
            ReservedToken::Number => "NUMBER",
            ReservedToken::Tmpl => "TMPL",
            ReservedToken::Link => "LINK",
        }
    }

    pub fn default_id(self) -> i32 {
        match self {
            ReservedToken::Eoi => 0,
            ReservedToken::Eof => -1,
            ReservedToken::Id => -2,
            ReservedToken::Number => -3,
            ReservedToken::LineNum => -4,
            ReservedToken::Tmpl => -5,
            ReservedToken::Link => -6,
            ReservedToken::None => -7,
            ReservedToken::Err => -8,
        }
    }

    /// Reserved tokens whose id must never be a single-char token.
    pub fn guards_char_class(self) -> bool {
        matches!(
            self,
            ReservedToken::Eoi
                | ReservedToken::Eof
                | ReservedToken::Id
                | ReservedToken::Number
                | ReservedToken::Err
        )
    }
}

impl fmt::Display for ReservedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Canonical record of one token id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    pub id: i32,
    /// Empty for a quote token declared without a name.
    pub name: String,
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved: Option<ReservedToken>,
}

impl TokenView {
    fn new(id: i32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            aliases: Vec::new(),
            reserved: None,
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved.is_some()
    }

    /// Whether `name` is the canonical name or an alias.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordDef {
    pub keyword: String,
    pub kind: KeywordKind,
    /// The name the keyword was declared under.
    pub name: String,
    pub tok_id: i32,
}

/// Where a token name was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameHit {
    pub view: usize,
    pub alias: bool,
}

/// All token definitions of one spec.
///
/// Names and keywords are interned so lookups hash a `u32` handle. Regular
/// views are sorted by id at [`finalize`](Self::finalize), after which
/// [`find_by_id`](Self::find_by_id) is a binary search.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    strings: Rodeo,
    reserved: Vec<TokenView>,
    views: Vec<TokenView>,
    keywords: Vec<KeywordDef>,
    by_name: FxHashMap<Spur, NameHit>,
    by_id: FxHashMap<i32, usize>,
    by_keyword: FxHashMap<Spur, usize>,
    one_char: FxHashMap<u8, usize>,
    sorted: bool,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenRegistry {
    pub fn new() -> Self {
        let mut strings = Rodeo::default();
        let reserved = ReservedToken::ALL
            .iter()
            .map(|&tok| {
                strings.get_or_intern_static(tok.default_name());
                TokenView {
                    reserved: Some(tok),
                    ..TokenView::new(tok.default_id(), tok.default_name())
                }
            })
            .collect();

        Self {
            strings,
            reserved,
            views: Vec::new(),
            keywords: Vec::new(),
            by_name: FxHashMap::default(),
            by_id: FxHashMap::default(),
            by_keyword: FxHashMap::default(),
            one_char: FxHashMap::default(),
            sorted: false,
        }
    }

    pub fn reserved(&self) -> &[TokenView] {
        &self.reserved
    }

    pub fn views(&self) -> &[TokenView] {
        &self.views
    }

    pub fn view(&self, index: usize) -> &TokenView {
        &self.views[index]
    }

    pub fn keywords(&self) -> &[KeywordDef] {
        &self.keywords
    }

    pub fn is_finalized(&self) -> bool {
        self.sorted
    }

    // -- reserved tokens --

    pub fn find_reserved(&self, name: &str) -> Option<usize> {
        self.reserved.iter().position(|v| v.name == name)
    }

    pub fn reserved_view(&self, tok: ReservedToken) -> Option<&TokenView> {
        self.reserved.iter().find(|v| v.reserved == Some(tok))
    }

    pub fn reserved_id(&self, tok: ReservedToken) -> i32 {
        self.reserved_view(tok).map_or(tok.default_id(), |v| v.id)
    }

    pub fn is_reserved_id(&self, id: i32) -> bool {
        self.reserved_by_id(id).is_some()
    }

    fn reserved_by_id(&self, id: i32) -> Option<&TokenView> {
        self.reserved.iter().find(|v| v.id == id)
    }

    pub fn set_reserved_id(&mut self, index: usize, id: i32) {
        if let Some(view) = self.reserved.get_mut(index) {
            view.id = id;
        }
    }

    /// Rename a reserved token.
    pub fn rename_reserved(&mut self, from: &str, to: &str) -> Result<(), SpecErrorKind> {
        let index = self
            .find_reserved(from)
            .ok_or_else(|| SpecErrorKind::NotReservedName(from.to_string()))?;
        if from != to && (self.find_reserved(to).is_some() || self.find_name(to).is_some()) {
            return Err(SpecErrorKind::TokenNameInUse(to.to_string()));
        }
        self.strings.get_or_intern(to);
        self.reserved[index].name = to.to_string();
        Ok(())
    }

    /// Reserved tokens must not share a name or an id, neither with each
    /// other nor with a regular view.
    pub fn check_reserved(&self) -> Result<(), SpecErrorKind> {
        for (i, first) in self.reserved.iter().enumerate() {
            for second in &self.reserved[i + 1..] {
                if first.name == second.name {
                    return Err(SpecErrorKind::DuplicateReservedName(second.name.clone()));
                }
                if first.id == second.id {
                    return Err(SpecErrorKind::DuplicateReservedId {
                        first: first.name.clone(),
                        second: second.name.clone(),
                        id: first.id,
                    });
                }
            }
            if let Some(view) = self.find_name(&first.name) {
                return Err(SpecErrorKind::TokenNameInUse(self.views[view.view].name.clone()));
            }
            if let Some(v) = self.find_by_id(first.id) {
                return Err(SpecErrorKind::TokenIdInUse {
                    id: first.id,
                    name: self.views[v].name.clone(),
                });
            }
        }
        Ok(())
    }

    // -- regular tokens --

    pub fn find_name(&self, name: &str) -> Option<NameHit> {
        let key = self.strings.get(name)?;
        self.by_name.get(&key).copied()
    }

    /// Index of the regular view with `id`.
    pub fn find_by_id(&self, id: i32) -> Option<usize> {
        if self.sorted {
            self.views.binary_search_by_key(&id, |v| v.id).ok()
        } else {
            self.by_id.get(&id).copied()
        }
    }

    pub fn find_keyword(&self, keyword: &str) -> Option<&KeywordDef> {
        let key = self.strings.get(keyword)?;
        self.by_keyword.get(&key).map(|&i| &self.keywords[i])
    }

    /// The view a single-char keyword was bound to.
    pub fn one_char_view(&self, ch: u8) -> Option<usize> {
        self.one_char.get(&ch).copied()
    }

    /// Whether `id` belongs to any view, reserved or regular.
    pub fn id_in_use(&self, id: i32) -> bool {
        self.is_reserved_id(id) || self.find_by_id(id).is_some()
    }

    /// Create a regular view. The id must be free of both reserved and
    /// regular views, and so must the name if not empty.
    pub fn add_view(&mut self, id: i32, name: &str) -> Result<usize, SpecErrorKind> {
        let holder = match self.find_by_id(id) {
            Some(v) => Some(&self.views[v]),
            None => self.reserved_by_id(id),
        };
        if let Some(view) = holder {
            return Err(SpecErrorKind::TokenIdInUse {
                id,
                name: view.name.clone(),
            });
        }
        if !name.is_empty() && (self.find_name(name).is_some() || self.find_reserved(name).is_some()) {
            return Err(SpecErrorKind::TokenNameInUse(name.to_string()));
        }

        let index = self.views.len();
        self.views.push(TokenView::new(id, name));
        self.by_id.insert(id, index);
        if !name.is_empty() {
            let key = self.strings.get_or_intern(name);
            self.by_name.insert(key, NameHit { view: index, alias: false });
        }
        self.sorted = false;
        Ok(index)
    }

    /// Give a nameless view its name.
    pub fn set_view_name(&mut self, view: usize, name: &str) {
        let key = self.strings.get_or_intern(name);
        self.views[view].name = name.to_string();
        self.by_name.insert(key, NameHit { view, alias: false });
    }

    pub fn add_alias(&mut self, view: usize, name: &str) {
        let key = self.strings.get_or_intern(name);
        if self.by_name.contains_key(&key) {
            return;
        }
        self.views[view].aliases.push(name.to_string());
        self.by_name.insert(key, NameHit { view, alias: true });
    }

    /// Record a keyword for the view with `tok_id`.
    pub fn add_keyword(&mut self, keyword: &str, kind: KeywordKind, name: &str, tok_id: i32) {
        let key = self.strings.get_or_intern(keyword);
        let index = self.keywords.len();
        self.keywords.push(KeywordDef {
            keyword: keyword.to_string(),
            kind,
            name: name.to_string(),
            tok_id,
        });
        self.by_keyword.entry(key).or_insert(index);
    }

    pub fn bind_one_char(&mut self, ch: u8, view: usize) {
        self.one_char.entry(ch).or_insert(view);
    }

    /// Sort regular views by id and rebuild the indexes.
    pub fn finalize(&mut self) {
        let one_char_ids: Vec<(u8, i32)> = self
            .one_char
            .iter()
            .map(|(&ch, &v)| (ch, self.views[v].id))
            .collect();

        self.views.sort_by_key(|v| v.id);
        self.by_id = self.views.iter().enumerate().map(|(i, v)| (v.id, i)).collect();

        let mut by_name = FxHashMap::default();
        for (index, view) in self.views.iter().enumerate() {
            if !view.name.is_empty() {
                by_name.insert(self.strings.get_or_intern(&view.name), NameHit { view: index, alias: false });
            }
            for alias in &view.aliases {
                by_name.insert(self.strings.get_or_intern(alias), NameHit { view: index, alias: true });
            }
        }
        self.by_name = by_name;

        self.one_char = one_char_ids
            .into_iter()
            .filter_map(|(ch, id)| Some((ch, *self.by_id.get(&id)?)))
            .collect();
        self.sorted = true;
    }

    /// Lowest and highest id over all views.
    pub fn id_bounds(&self) -> (i32, i32) {
        self.reserved
            .iter()
            .chain(&self.views)
            .fold((i32::MAX, i32::MIN), |(lo, hi), v| (lo.min(v.id), hi.max(v.id)))
    }
}

/// Token names are `[A-Za-z_][A-Za-z0-9_]*`, at most [`MAX_NAME_LEN`] bytes.
pub fn check_token_name(name: &str) -> Result<(), SpecErrorKind> {
    let bytes = name.as_bytes();
    let valid = matches!(bytes.first(), Some(b) if b.is_ascii_alphabetic() || *b == b'_')
        && bytes.len() <= MAX_NAME_LEN
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_');
    if valid {
        Ok(())
    } else {
        Err(SpecErrorKind::InvalidTokenName(name.to_string()))
    }
}

impl Serialize for TokenRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("TokenRegistry", 3)?;
        st.serialize_field("reserved", &self.reserved)?;
        st.serialize_field("views", &self.views)?;
        st.serialize_field("keywords", &self.keywords)?;
        st.end()
    }
}

impl PartialEq for TokenRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.reserved == other.reserved && self.views == other.views && self.keywords == other.keywords
    }
}

impl Eq for TokenRegistry {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reserved_defaults() {
        let reg = TokenRegistry::new();
        assert_eq!(reg.reserved().len(), 9);
        assert_eq!(reg.reserved_id(ReservedToken::Eof), -1);
        assert_eq!(reg.find_reserved("NUMBER"), Some(6));
        assert!(reg.is_reserved_id(-8));
        assert!(reg.check_reserved().is_ok());
    }

    #[test]
    fn test_rename_reserved() {
        let mut reg = TokenRegistry::new();
        reg.rename_reserved("ID", "IDENT").unwrap();
        assert!(reg.find_reserved("ID").is_none());
        assert_eq!(reg.reserved_view(ReservedToken::Id).unwrap().name, "IDENT");
        assert_eq!(
            reg.rename_reserved("FOO", "BAR").unwrap_err(),
            SpecErrorKind::NotReservedName("FOO".into())
        );
        assert_eq!(
            reg.rename_reserved("EOF", "EOI").unwrap_err(),
            SpecErrorKind::TokenNameInUse("EOI".into())
        );
    }

    #[test]
    fn test_duplicate_reserved_id() {
        let mut reg = TokenRegistry::new();
        let eof = reg.find_reserved("EOF").unwrap();
        reg.set_reserved_id(eof, 0);
        assert_eq!(
            reg.check_reserved().unwrap_err(),
            SpecErrorKind::DuplicateReservedId {
                first: "EOI".into(),
                second: "EOF".into(),
                id: 0
            }
        );
    }

    #[test]
    fn test_views_and_aliases() {
        let mut reg = TokenRegistry::new();
        let v = reg.add_view(300, "IF").unwrap();
        reg.add_keyword("if", KeywordKind::Idstr, "IF", 300);
        reg.add_alias(v, "WHEN");

        assert_eq!(reg.find_name("WHEN"), Some(NameHit { view: v, alias: true }));
        assert_eq!(reg.find_keyword("if").unwrap().tok_id, 300);
        assert!(reg.view(v).answers_to("WHEN"));
        assert_eq!(
            reg.add_view(300, "THEN").unwrap_err(),
            SpecErrorKind::TokenIdInUse { id: 300, name: "IF".into() }
        );
        assert_eq!(
            reg.add_view(301, "WHEN").unwrap_err(),
            SpecErrorKind::TokenNameInUse("WHEN".into())
        );
    }

    #[test]
    fn test_view_cannot_take_reserved_id() {
        let mut reg = TokenRegistry::new();
        assert_eq!(
            reg.add_view(-1, "STR").unwrap_err(),
            SpecErrorKind::TokenIdInUse { id: -1, name: "EOF".into() }
        );
        assert!(reg.find_name("STR").is_none());

        reg.add_view(300, "STR").unwrap();
        let eof = reg.find_reserved("EOF").unwrap();
        reg.set_reserved_id(eof, 300);
        assert_eq!(
            reg.check_reserved().unwrap_err(),
            SpecErrorKind::TokenIdInUse { id: 300, name: "STR".into() }
        );
    }

    #[test]
    fn test_finalize_sorts_and_reindexes() {
        let mut reg = TokenRegistry::new();
        reg.add_view(30, "C").unwrap();
        let b = reg.add_view(20, "B").unwrap();
        reg.add_view(10, "A").unwrap();
        reg.bind_one_char(b'+', b);
        reg.finalize();

        let ids: Vec<i32> = reg.views().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(reg.find_by_id(20), Some(1));
        assert_eq!(reg.find_name("B").unwrap().view, 1);
        assert_eq!(reg.one_char_view(b'+'), Some(1));
        assert_eq!(reg.id_bounds(), (-8, 30));
    }
}
