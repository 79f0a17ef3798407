//! The magic line and the inheritance chain.
//!
//! Every spec starts with
//!
//! ```text
//! <BOM>#@ulc-c2.3[:parent-name]
//! ```
//!
//! followed by `DIRECTIVE: value` lines. The directive section ends at a
//! `%%` line or at the first line that is not a directive; the token table
//! follows.

use crate::error::{SpecError, SpecErrorKind, SpecResult};
use crate::resolver::SpecResolver;
use serde::Serialize;
use std::fmt;
use ulc_core::chars::UTF8_BOM;
use ulc_diagnostics::Location;

pub const MAGIC: &[u8] = b"#@ulc-c";
pub const SUPPORTED_VERSION: SpecVersion = SpecVersion::new(2, 3, 0);
pub const MAX_VERSION_LEN: usize = 11;
pub const MAX_SPEC_NAME_LEN: usize = 63;

/// `major.minor[.debug]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SpecVersion {
    pub major: u32,
    pub minor: u32,
    pub debug: u32,
}

impl SpecVersion {
    pub const fn new(major: u32, minor: u32, debug: u32) -> Self {
        Self { major, minor, debug }
    }

    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() || text.len() > MAX_VERSION_LEN {
            return None;
        }
        let mut parts = text.split('.').map(|p| {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            p.parse::<u32>().ok()
        });
        let major = parts.next()??;
        let minor = parts.next().unwrap_or(Some(0))?;
        let debug = parts.next().unwrap_or(Some(0))?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, debug))
    }

    /// Same major and minor number.
    pub fn is_compatible(&self, other: &SpecVersion) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.debug)
    }
}

/// The parsed magic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Magic {
    pub version: SpecVersion,
    pub parent: Option<String>,
}

pub fn parse_magic(line: &[u8]) -> Result<Magic, SpecErrorKind> {
    let rest = line
        .strip_prefix(UTF8_BOM.as_slice())
        .and_then(|l| l.strip_prefix(MAGIC))
        .ok_or(SpecErrorKind::ImproperFormat)?;
    let rest = simdutf8::basic::from_utf8(rest)
        .map_err(|_| SpecErrorKind::NotUtf8)?
        .trim_end();

    let (version, parent) = match rest.split_once(':') {
        Some((v, p)) => (v, Some(p)),
        None => (rest, None),
    };
    let parsed = SpecVersion::parse(version)
        .filter(|v| v.is_compatible(&SUPPORTED_VERSION))
        .ok_or_else(|| SpecErrorKind::UnsupportedVersion(version.to_string()))?;

    let parent = match parent {
        Some(p) if !is_valid_spec_name(p) => return Err(SpecErrorKind::InvalidSpecName(p.to_string())),
        p => p.map(str::to_string),
    };
    Ok(Magic { version: parsed, parent })
}

/// Spec names are relative paths of `[A-Za-z0-9_.-]` segments.
pub fn is_valid_spec_name(name: &str) -> bool {
    (1..=MAX_SPEC_NAME_LEN).contains(&name.len())
        && name.split('/').all(|seg| {
            !seg.is_empty()
                && seg != "."
                && seg != ".."
                && seg.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
        })
}

/// One line of spec text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub number: u32,
    pub text: &'a str,
}

/// Lines of `text` with their byte ranges, numbered from `first`.
struct LineCursor<'a> {
    text: &'a str,
    pos: usize,
    number: u32,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str, first: u32) -> Self {
        Self { text, pos: 0, number: first }
    }
}

impl<'a> Iterator for LineCursor<'a> {
    /// (line, start, end-including-newline)
    type Item = (Line<'a>, usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }
        let start = self.pos;
        let bytes = &self.text.as_bytes()[start..];
        let (content_end, next) = match memchr::memchr(b'\n', bytes) {
            Some(i) => (start + i, start + i + 1),
            None => (self.text.len(), self.text.len()),
        };
        let text = self.text[start..content_end].trim_end_matches('\r');
        let line = Line { number: self.number, text };
        self.pos = next;
        self.number += 1;
        Some((line, start, next))
    }
}

/// Split a directive line into its name and value.
///
/// Returns `None` when the first word does not end with `:`.
pub fn split_directive(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start_matches([' ', '\t']);
    let end = line.find([' ', '\t']).unwrap_or(line.len());
    let name = line[..end].strip_suffix(':')?;
    if name.is_empty() {
        return None;
    }
    Some((name, line[end..].trim_start_matches([' ', '\t'])))
}

fn is_skippable(line: &str) -> bool {
    let t = line.trim_start_matches([' ', '\t']);
    t.is_empty() || t.starts_with('#')
}

/// One spec file of an inheritance chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSource {
    pub name: String,
    pub version: SpecVersion,
    text: String,
    header_start: usize,
    header_end: usize,
    body_start: usize,
    body_first_line: u32,
}

impl SpecSource {
    fn split(name: &str, version: SpecVersion, text: String) -> Self {
        let mut cursor = LineCursor::new(&text, 1);
        let header_start = cursor.next().map_or(text.len(), |(_, _, end)| end);

        let mut header_end = text.len();
        let mut body_start = text.len();
        let mut body_first_line = 0;

        for (line, start, end) in cursor {
            if line.text.starts_with("%%") {
                header_end = start;
                body_start = end;
                body_first_line = line.number + 1;
                break;
            }
            if is_skippable(line.text) || split_directive(line.text).is_some() {
                continue;
            }
            header_end = start;
            body_start = start;
            body_first_line = line.number;
            break;
        }

        Self {
            name: name.to_string(),
            version,
            header_start,
            header_end,
            body_start,
            body_first_line,
            text,
        }
    }

    /// Directive lines, blank and `#` lines skipped.
    pub fn header_lines(&self) -> impl Iterator<Item = Line<'_>> + '_ {
        LineCursor::new(&self.text[self.header_start..self.header_end], 2)
            .map(|(line, _, _)| line)
            .filter(|line| !is_skippable(line.text))
    }

    /// Token lines, blank, `#` and `//` lines skipped.
    pub fn body_lines(&self) -> impl Iterator<Item = Line<'_>> + '_ {
        LineCursor::new(&self.text[self.body_start..], self.body_first_line)
            .map(|(line, _, _)| line)
            .filter(|line| {
                !is_skippable(line.text) && !line.text.trim_start_matches([' ', '\t']).starts_with("//")
            })
    }
}

fn first_line(bytes: &[u8]) -> &[u8] {
    let end = memchr::memchr(b'\n', bytes).unwrap_or(bytes.len());
    &bytes[..end]
}

/// Load `text` and its ancestors, root first.
pub fn load_chain(
    name: &str,
    text: &[u8],
    resolver: &dyn SpecResolver,
    max_depth: usize,
) -> SpecResult<Vec<SpecSource>> {
    let mut chain: Vec<SpecSource> = Vec::new();
    let mut current_name = name.to_string();
    let mut current_text = text.to_vec();

    loop {
        let at_magic = |kind: SpecErrorKind| SpecError {
            location: Location::new(current_name.as_str(), 1),
            kind,
        };

        let magic = parse_magic(first_line(&current_text)).map_err(at_magic)?;
        let decoded = simdutf8::basic::from_utf8(&current_text)
            .map_err(|_| at_magic(SpecErrorKind::NotUtf8))?
            .to_string();
        tracing::debug!(spec = %current_name, version = %magic.version, parent = ?magic.parent, "loaded spec source");

        let parent = magic.parent.clone();
        chain.push(SpecSource::split(&current_name, magic.version, decoded));

        let Some(parent) = parent else { break };
        if parent == name || chain.iter().any(|s| s.name == parent) {
            return Err(at_magic(SpecErrorKind::MultipleParents(parent)));
        }
        if chain.len() > max_depth {
            return Err(at_magic(SpecErrorKind::InheritanceTooDeep {
                name: name.to_string(),
                max: max_depth,
            }));
        }
        let Some(parent_text) = resolver.resolve(&parent) else {
            return Err(at_magic(SpecErrorKind::ParentNotFound(parent)));
        };

        current_name = parent;
        current_text = parent_text;
    }

    chain.reverse();
    Ok(chain)
}
