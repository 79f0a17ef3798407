//! Compilation driver.
//!
//! A spec and its ancestors are loaded root first. Their directive sections
//! run in that order, then the char table is checked, then the token tables
//! run in the same order, then the tokens are finalized.

use crate::body::token_line;
use crate::builder::{LexFlags, SpecBuilder};
use crate::char_class::CharClass;
use crate::directives::apply_directive;
use crate::error::{SpecError, SpecErrorKind, SpecResult};
use crate::header::{load_chain, split_directive, SpecSource};
use crate::marker::{check_cross_containment, QuoteFlags};
use crate::options::CompileOptions;
use crate::output::CompiledSpec;
use crate::resolver::{DirResolver, SpecResolver};
use crate::tokdef::ReservedToken;
use std::path::Path;
use ulc_diagnostics::{messages, Diagnostic, DiagnosticCollection, Location};
use ulc_escape::{EscapeError, EscapeMapRegistry};

/// Compiles ULC specs.
///
/// Escape presets are built once per compiler and shared by every spec it
/// compiles. Warnings accumulate in [`diagnostics`](Self::diagnostics)
/// across compilations.
pub struct UlcSpecCompiler {
    options: CompileOptions,
    escapes: EscapeMapRegistry,
    diagnostics: DiagnosticCollection,
}

impl UlcSpecCompiler {
    pub fn new(options: CompileOptions) -> SpecResult<Self> {
        let at_options = |kind: SpecErrorKind| kind.at(Location::new("<options>", 0));
        let esc_sym = u8::try_from(options.escape_symbol)
            .map_err(|_| at_options(EscapeError::InvalidEscapeChar(options.escape_symbol).into()))?;
        let escapes = EscapeMapRegistry::with_escape_symbol(esc_sym).map_err(|e| at_options(e.into()))?;

        Ok(Self {
            options,
            escapes,
            diagnostics: DiagnosticCollection::new(),
        })
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn escapes(&self) -> &EscapeMapRegistry {
        &self.escapes
    }

    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    /// Compile `text`, resolving parents through the configured search paths.
    pub fn compile(&mut self, name: &str, text: &str) -> SpecResult<CompiledSpec> {
        self.compile_bytes(name, text.as_bytes())
    }

    pub fn compile_bytes(&mut self, name: &str, text: &[u8]) -> SpecResult<CompiledSpec> {
        let resolver = DirResolver::new(self.options.search_paths.clone());
        self.compile_with(name, text, &resolver)
    }

    /// Compile the spec file at `path`. Its directory is searched for parents
    /// before the configured search paths.
    pub fn compile_file(&mut self, path: &Path) -> SpecResult<CompiledSpec> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = std::fs::read(path).map_err(|err| {
            tracing::debug!(path = %path.display(), %err, "cannot read spec file");
            SpecError::new(name.as_str(), 0, SpecErrorKind::ParentNotFound(path.display().to_string()))
        })?;

        let mut search_paths = Vec::with_capacity(self.options.search_paths.len() + 1);
        if let Some(dir) = path.parent() {
            search_paths.push(dir.to_path_buf());
        }
        search_paths.extend(self.options.search_paths.iter().cloned());
        self.compile_with(&name, &text, &DirResolver::new(search_paths))
    }

    #[tracing::instrument(level = "debug", skip(self, text, resolver), fields(len = text.len()))]
    pub fn compile_with(&mut self, name: &str, text: &[u8], resolver: &dyn SpecResolver) -> SpecResult<CompiledSpec> {
        let result = compile_chain(&self.options, &self.escapes, &mut self.diagnostics, name, text, resolver);
        match &result {
            Ok(spec) => {
                let count = (spec.tokens.reserved().len() + spec.tokens.views().len()).to_string();
                self.diagnostics.add(Diagnostic::new(&messages::COMPILED, &[name, count.as_str()]));
                tracing::debug!(spec = name, tokens = %count, "compiled");
            }
            Err(err) => {
                tracing::debug!(%err, "compilation failed");
                self.diagnostics.add(err.to_diagnostic());
            }
        }
        result
    }
}

fn compile_chain(
    options: &CompileOptions,
    escapes: &EscapeMapRegistry,
    diagnostics: &mut DiagnosticCollection,
    name: &str,
    text: &[u8],
    resolver: &dyn SpecResolver,
) -> SpecResult<CompiledSpec> {
    let chain = load_chain(name, text, resolver, options.max_inherit_depth)?;
    let mut b = SpecBuilder::new(options, escapes);
    let result = build(&mut b, name, &chain);
    diagnostics.extend(std::mem::take(&mut b.diagnostics));
    result?;

    let version = chain.last().map(|s| s.version).unwrap_or(crate::header::SUPPORTED_VERSION);
    Ok(CompiledSpec::from_builder(name, version, b))
}

fn build(b: &mut SpecBuilder<'_>, name: &str, chain: &[SpecSource]) -> SpecResult<()> {
    for source in chain {
        for line in source.header_lines() {
            b.set_location(&source.name, line.number);
            let Some((directive, value)) = split_directive(line.text) else {
                continue;
            };
            apply_directive(b, directive, value).map_err(|k| k.at(b.location.clone()))?;
        }
    }

    b.set_location(name, 0);
    classify_chars(b).map_err(|k| k.at(b.location.clone()))?;

    for source in chain {
        for line in source.body_lines() {
            b.set_location(&source.name, line.number);
            let id = token_line(b, line.text).map_err(|k| k.at(b.location.clone()))?;
            b.track_tok_id(id);
        }
    }

    b.set_location(name, 0);
    b.tokens.check_reserved().map_err(|k| k.at(b.location.clone()))?;
    classify_tokens(b);
    Ok(())
}

/// Settle the char table once all directives ran.
fn classify_chars(b: &mut SpecBuilder<'_>) -> Result<(), SpecErrorKind> {
    for (ch, label) in [(0u8, "null"), (b' ', "space")] {
        let class = b.chars.class_of(ch);
        if !class.is_empty() {
            let bits = format!("{:02X}", class.bits());
            b.warn_global(&messages::CHAR_FLAGS_CLEARED, &[label, bits.as_str()]);
            b.chars.remove(ch, class);
        }
    }

    for tok in ReservedToken::ALL.into_iter().filter(|t| t.guards_char_class()) {
        let id = b.tokens.reserved_id(tok);
        b.chars.remove_at_id(id, CharClass::SINGLE_CHAR);
    }

    check_cross_containment(&b.comments, &b.quotes)?;
    b.comments.check_unique_starts()?;
    b.quotes.check_unique_starts()?;

    let heads: Vec<(u8, CharClass)> = b
        .comments
        .iter()
        .filter_map(|c| c.start.as_bytes().first().map(|&ch| (ch, CharClass::COMMENT)))
        .chain(
            b.quotes
                .iter()
                .filter_map(|q| q.start.as_bytes().first().map(|&ch| (ch, CharClass::QUOTE))),
        )
        .collect();
    for (ch, class) in heads {
        b.chars.insert(ch, class);
    }
    Ok(())
}

/// Finalize the token tables after all token lines ran.
fn classify_tokens(b: &mut SpecBuilder<'_>) {
    b.tokens.finalize();

    let none_id = b.tokens.reserved_id(ReservedToken::None);
    for i in 0..b.quotes.len() {
        if let Some(q) = b.quotes.get_mut(i) {
            if q.flags.contains(QuoteFlags::NOTHING) {
                q.tok_id = none_id;
            }
        }
    }

    if b.flags.contains(LexFlags::LINEFEED_GUARD) {
        b.chars.remove(b'\n', CharClass::SINGLE_CHAR);
        b.flags.remove(LexFlags::LF_CHAR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MemoryResolver;
    use pretty_assertions::assert_eq;
    use ulc_core::chars::UTF8_BOM;

    fn spec(body: &str) -> Vec<u8> {
        let mut text = UTF8_BOM.to_vec();
        text.extend_from_slice(b"#@ulc-c2.3\n");
        text.extend_from_slice(body.as_bytes());
        text
    }

    fn compile(body: &str) -> SpecResult<CompiledSpec> {
        let mut c = UlcSpecCompiler::new(CompileOptions::default()).unwrap();
        c.compile_with("test", &spec(body), &MemoryResolver::new())
    }

    #[test]
    fn test_error_location() {
        let err = compile("ID_CHARS: a-z\nCOLOR: red\n").unwrap_err();
        assert_eq!(err.location, Location::new("test", 3));
        assert_eq!(err.kind, SpecErrorKind::UnknownAttribute("COLOR".into()));
    }

    #[test]
    fn test_body_error_location() {
        let err = compile("ID_FIRST_CHARS: a-z\n%%\nIF if 300\nIF if 302\n").unwrap_err();
        assert_eq!(err.location, Location::new("test", 5));
        assert!(matches!(err.kind, SpecErrorKind::KeywordConflict { .. }));
    }

    #[test]
    fn test_reserved_chars_cleared() {
        let out = compile("%%\nEOF 35\n").unwrap();
        assert!(!out.class_of(b'#').contains(CharClass::SINGLE_CHAR));
        assert_eq!(out.reserved_id(ReservedToken::Eof), 35);
    }

    #[test]
    fn test_space_flags_cleared_with_warning() {
        let mut c = UlcSpecCompiler::new(CompileOptions::default()).unwrap();
        let out = c
            .compile_with("test", &spec("CHAR_TOK: \\x20\n"), &MemoryResolver::new())
            .unwrap();
        assert!(out.class_of(b' ').is_empty());
        let warnings: Vec<u32> = c.diagnostics().warnings().map(|d| d.code).collect();
        assert_eq!(warnings, vec![9003]);
    }

    #[test]
    fn test_nothing_quote_gets_none_id() {
        let out = compile("QUOTE_TYPE: options=nothing <>\n%%\nNONE 99\n").unwrap();
        assert_eq!(out.quote_types.get(0).unwrap().tok_id, 99);
    }

    #[test]
    fn test_linefeed_guard() {
        let out = compile("LINEFEED_GUARD: true\n%%\nNL \\n\n").unwrap();
        assert!(!out.class_of(b'\n').contains(CharClass::SINGLE_CHAR));
        assert!(!out.flags.contains(LexFlags::LF_CHAR));
    }

    #[test]
    fn test_tok_id_bounds() {
        let out = compile("%%\nA 300\nB -20\n").unwrap();
        assert_eq!((out.tok_id_min, out.tok_id_max), (-20, 300));
    }

    #[test]
    fn test_failure_recorded_as_diagnostic() {
        let mut c = UlcSpecCompiler::new(CompileOptions::default()).unwrap();
        assert!(c.compile_with("bad", b"#@ulc-c2.3\n", &MemoryResolver::new()).is_err());
        assert!(c.diagnostics().has_errors());
    }

    #[test]
    fn test_rejects_non_ascii_escape_symbol() {
        let options = CompileOptions {
            escape_symbol: 'é',
            ..CompileOptions::default()
        };
        assert!(UlcSpecCompiler::new(options).is_err());
    }
}
