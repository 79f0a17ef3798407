//! Shared storage for escape bindings.
//!
//! A pool keeps, per escape character, the list of distinct bindings created
//! so far. Registering a binding equal to one already pooled hands back the
//! existing entry, so maps derived from the same presets share storage.
//! Pools may chain to a parent (the registry's preset pool), which is
//! searched first.

use crate::map::{slot_index, Binding, EscapeString, MAP_SIZE};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct PoolInner {
    chains: Mutex<Vec<Vec<Arc<EscapeString>>>>,
    parent: Option<EscapeMapPool>,
}

/// Reference-counted escape binding pool. Clones share the same storage.
#[derive(Clone)]
pub struct EscapeMapPool {
    inner: Arc<PoolInner>,
}

impl EscapeMapPool {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A pool whose lookups fall back to `parent`.
    pub fn with_parent(parent: &EscapeMapPool) -> Self {
        Self::build(Some(parent.grab()))
    }

    fn build(parent: Option<EscapeMapPool>) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                chains: Mutex::new(vec![Vec::new(); MAP_SIZE]),
                parent,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Vec<Arc<EscapeString>>>> {
        self.inner.chains.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take another reference to this pool.
    pub fn grab(&self) -> Self {
        self.clone()
    }

    /// Drop a reference; storage goes away with the last one.
    pub fn ungrab(self) {}

    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn parent(&self) -> Option<&EscapeMapPool> {
        self.inner.parent.as_ref()
    }

    /// Find a pooled binding for `esc_ch`, looking in the parent chain first.
    pub fn search(&self, esc_ch: u8, binding: &Binding) -> Option<Arc<EscapeString>> {
        if let Some(found) = self.parent().and_then(|p| p.search(esc_ch, binding)) {
            return Some(found);
        }
        self.search_local(esc_ch, binding)
    }

    fn search_local(&self, esc_ch: u8, binding: &Binding) -> Option<Arc<EscapeString>> {
        let idx = slot_index(esc_ch)?;
        self.lock()[idx]
            .iter()
            .find(|e| e.binding() == binding)
            .cloned()
    }

    /// Return the local entry for `(esc_ch, binding)`, creating it if needed.
    ///
    /// Returns `None` if `esc_ch` cannot be escaped.
    pub fn intern(&self, esc_ch: u8, binding: Binding) -> Option<Arc<EscapeString>> {
        let idx = slot_index(esc_ch)?;
        let mut chains = self.lock();
        if let Some(found) = chains[idx].iter().find(|e| *e.binding() == binding) {
            return Some(Arc::clone(found));
        }
        let entry = Arc::new(EscapeString::new(esc_ch, binding));
        chains[idx].push(Arc::clone(&entry));
        Some(entry)
    }

    /// Number of entries held locally.
    pub fn len(&self) -> usize {
        self.lock().iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EscapeMapPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EscapeMapPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EscapeMapPool")
            .field("entries", &self.len())
            .field("refs", &self.ref_count())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_shares_equal_bindings() {
        let pool = EscapeMapPool::new();
        let a = pool.intern(b'n', Binding::literal(b"\n")).unwrap();
        let b = pool.intern(b'n', Binding::literal(b"\n")).unwrap();
        let c = pool.intern(b'n', Binding::literal(b"N")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_rejects_unescapable_char() {
        let pool = EscapeMapPool::new();
        assert!(pool.intern(b' ', Binding::literal(b" ")).is_none());
        assert!(pool.intern(0x7F, Binding::literal(b"x")).is_none());
    }

    #[test]
    fn test_search_prefers_parent() {
        let global = EscapeMapPool::new();
        let shared = global.intern(b't', Binding::literal(b"\t")).unwrap();

        let child = EscapeMapPool::with_parent(&global);
        let found = child.search(b't', &Binding::literal(b"\t")).unwrap();
        assert!(Arc::ptr_eq(&shared, &found));
        assert!(child.is_empty());
        assert_eq!(global.ref_count(), 2);
    }

    #[test]
    fn test_grab_and_ungrab() {
        let pool = EscapeMapPool::new();
        let other = pool.grab();
        assert_eq!(pool.ref_count(), 2);
        other.ungrab();
        assert_eq!(pool.ref_count(), 1);
    }
}
