//! Lookup of parent specs by name.

use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// Extension of spec files on disk.
pub const SPEC_FILE_EXT: &str = "ulc";

/// Finds the text of a spec given its name.
pub trait SpecResolver {
    fn resolve(&self, name: &str) -> Option<Vec<u8>>;
}

/// Specs held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    specs: FxHashMap<String, Vec<u8>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<Vec<u8>>) -> &mut Self {
        self.specs.insert(name.into(), text.into());
        self
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl SpecResolver for MemoryResolver {
    fn resolve(&self, name: &str) -> Option<Vec<u8>> {
        self.specs.get(name).cloned()
    }
}

/// Probes `<dir>/<name>.ulc` in each search path, in order.
///
/// A `/` in the name selects a subdirectory.
#[derive(Debug, Clone, Default)]
pub struct DirResolver {
    search_paths: Vec<PathBuf>,
}

impl DirResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        self.search_paths.iter().map(move |dir| {
            let mut path = dir.clone();
            path.extend(name.split('/'));
            path.set_extension(SPEC_FILE_EXT);
            path
        })
    }
}

impl SpecResolver for DirResolver {
    fn resolve(&self, name: &str) -> Option<Vec<u8>> {
        self.candidates(name).find_map(|path| {
            let text = std::fs::read(&path).ok()?;
            tracing::debug!(path = %path.display(), "resolved parent spec");
            Some(text)
        })
    }
}

/// Resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl SpecResolver for NoResolver {
    fn resolve(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_resolver() {
        let mut res = MemoryResolver::new();
        res.insert("base", "text");
        assert_eq!(res.resolve("base").as_deref(), Some(&b"text"[..]));
        assert!(res.resolve("other").is_none());
        assert_eq!(res.len(), 1);
    }

    #[test]
    fn test_dir_candidates() {
        let res = DirResolver::new(vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        let paths: Vec<_> = res.candidates("lang/c").collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("/a/lang/c.ulc"), PathBuf::from("/b/lang/c.ulc")]
        );
    }

    #[test]
    fn test_dir_resolver_reads_files() {
        let dir = std::env::temp_dir().join(format!("ulc-resolver-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("base.ulc"), b"spec").unwrap();

        let res = DirResolver::new(vec![PathBuf::from("/nonexistent"), dir.clone()]);
        assert_eq!(res.resolve("base"), Some(b"spec".to_vec()));
        assert!(res.resolve("missing").is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
