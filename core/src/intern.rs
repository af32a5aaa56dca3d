//! Interned names with stable identifiers.
//!
//! A [`SymbolTable`] hands out one [`Symbol`] per distinct string and never
//! forgets it. Identifiers therefore stay valid for as long as the table
//! lives, even if the things they name are rebuilt (e.g. shader passes after
//! a reload).

use std::collections::HashMap;
use std::fmt;

/// Stable identifier of an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// The empty string. Always maps to `""` in any table.
    pub const EMPTY: Self = Self(0);

    /// Returns the raw index of this symbol.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// A deduplicating, append-only string table.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    strings: Vec<String>,
    lookup: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// Create a new table with the empty string pre-inserted at index 0.
    pub fn new() -> Self {
        let mut table = Self {
            strings: Vec::new(),
            lookup: HashMap::new(),
        };
        table.strings.push(String::new());
        table.lookup.insert(String::new(), Symbol::EMPTY);
        table
    }

    /// Intern a string, returning its [`Symbol`].
    ///
    /// If the string was already interned, returns the existing symbol.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }
        let id = Symbol(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.lookup.insert(s.to_string(), id);
        id
    }

    /// Look up a string without interning it.
    pub fn find(&self, s: &str) -> Option<Symbol> {
        self.lookup.get(s).copied()
    }

    /// Resolve a [`Symbol`], returning `None` if it came from another table.
    pub fn resolve(&self, id: Symbol) -> Option<&str> {
        self.strings.get(id.0 as usize).map(String::as_str)
    }

    /// Number of interned strings (including the empty string).
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the table contains only the empty string.
    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
