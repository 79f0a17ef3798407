//! Compiler options.
//!
//! Options may be given in code or read from a JSON file, e.g.
//!
//! ```json
//! { "searchPaths": ["specs"], "maxInheritDepth": 4 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Value the `DOMAIN` directive must carry unless configured otherwise.
pub const DEFAULT_DOMAIN: &str = "uls.link2next.io://season-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    // Header checks
    pub domain: String,

    // Inheritance
    pub search_paths: Vec<PathBuf>,
    pub max_inherit_depth: usize,

    // Table limits
    pub max_wide_ranges: usize,

    // Escape maps
    pub escape_symbol: char,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            search_paths: Vec::new(),
            max_inherit_depth: 8,
            max_wide_ranges: 16,
            escape_symbol: '\\',
        }
    }
}

impl CompileOptions {
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("can't read options file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse options from JSON text. Missing fields take their defaults.
pub fn parse_options(text: &str) -> Result<CompileOptions, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn parse_options_file(path: &Path) -> Result<CompileOptions, OptionsError> {
    let text = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_options(&text)?)
}
