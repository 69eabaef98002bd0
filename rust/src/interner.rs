//! Identifier interning for property lookups.
//!
//! Maps user-facing string identifiers to dense arena indices so that
//! cross-references resolve with a single hash lookup.

use rustc_hash::FxHashMap;

/// Maps identifier strings to dense indices in insertion order.
#[derive(Debug, Clone, Default)]
pub struct IdInterner {
    to_idx: FxHashMap<String, usize>,
}

impl IdInterner {
    /// Register a new identifier. Returns `None` if it is already taken.
    pub fn insert(&mut self, id: &str) -> Option<usize> {
        if self.to_idx.contains_key(id) {
            return None;
        }
        let idx = self.to_idx.len();
        self.to_idx.insert(id.to_string(), idx);
        Some(idx)
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<usize> {
        self.to_idx.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut interner = IdInterner::default();

        assert_eq!(interner.insert("design"), Some(0));
        assert_eq!(interner.insert("build"), Some(1));
        assert_eq!(interner.insert("design"), None, "ids are unique");
        assert_eq!(interner.get("build"), Some(1));
        assert_eq!(interner.get("ship"), None);
        assert_eq!(interner.insert("ship"), Some(2));
    }
}
