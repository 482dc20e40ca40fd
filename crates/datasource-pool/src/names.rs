//! Interning table for node names.
//!
//! Every name ever given to a node passes through [`NameTable::intern`].
//! Lookups go through [`NameTable::lookup`], which never inserts: a segment
//! that was never interned cannot name any node, so path resolution can bail
//! out without scanning children.

use indexmap::IndexSet;

/// Interned node name. Compares in O(1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Position of the name in its table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only set of names.
///
/// Entries are never removed, so a [`Symbol`] stays valid for the lifetime of
/// the table, including across a pool clear.
#[derive(Clone, Debug)]
pub struct NameTable {
    names: IndexSet<Box<str>>,
}

impl NameTable {
    /// A table holding only the empty name, at [`Symbol::default()`].
    pub fn new() -> Self {
        let mut names = IndexSet::new();
        names.insert(Box::from(""));
        Self { names }
    }

    /// Intern `name`, returning its existing symbol if already present.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(idx) = self.names.get_index_of(name) {
            return Symbol(idx as u32);
        }
        let (idx, _) = self.names.insert_full(Box::from(name));
        Symbol(idx as u32)
    }

    /// Symbol of `name` if it was ever interned.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.names.get_index_of(name).map(|idx| Symbol(idx as u32))
    }

    /// Text of a symbol. Unknown symbols resolve to the empty string.
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.names
            .get_index(symbol.index())
            .map(|s| &**s)
            .unwrap_or("")
    }

    /// Number of distinct names, the empty name included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: the empty name is pre-interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}
