//! String interning for identifier deduplication.
//!
//! Names, namespaces and member identifiers repeat heavily across a
//! codebase; interning them gives O(1) equality and hashing via `Atom`
//! handles. The interner is shared (`&self` methods) so that identity
//! registries layered on top of it can intern concurrently.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// Interned string handle. Equality and hashing compare the handle only;
/// two `Atom`s from the same `Interner` are equal iff their strings are.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    /// Raw index into the interner's string table.
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Append-only string table with a lock-free lookup map.
pub struct Interner {
    map: DashMap<Arc<str>, Atom>,
    strings: RwLock<Vec<Arc<str>>>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
            strings: RwLock::new(Vec::new()),
        }
    }

    /// Intern a string, returning its stable handle.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(atom) = self.map.get(text) {
            return *atom;
        }
        let mut strings = self.strings.write().expect("interner table poisoned");
        // Re-check under the write lock: another thread may have won the race.
        if let Some(atom) = self.map.get(text) {
            return *atom;
        }
        let arc: Arc<str> = Arc::from(text);
        let atom = Atom(u32::try_from(strings.len()).expect("interner table overflow"));
        strings.push(Arc::clone(&arc));
        self.map.insert(arc, atom);
        atom
    }

    /// Resolve a handle back to its string.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let strings = self.strings.read().expect("interner table poisoned");
        Arc::clone(&strings[atom.0 as usize])
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.strings.read().expect("interner table poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let interner = Interner::new();
        let a = interner.intern("Foo");
        let b = interner.intern("Foo");
        let c = interner.intern("foo");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(&*interner.resolve(a), "Foo");
        assert_eq!(&*interner.resolve(c), "foo");
    }

    #[test]
    fn len_counts_distinct_strings() {
        let interner = Interner::new();
        interner.intern("a");
        interner.intern("b");
        interner.intern("a");
        assert_eq!(interner.len(), 2);
    }
}
