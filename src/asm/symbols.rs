//! Assembly-time symbol table.

use crate::asm::tables::{predefined_symbols, MAX_ADDRESS, VARIABLE_BASE};
use std::collections::HashMap;

/// Mapping from symbol name to address.
///
/// Seeded with the predefined registers and platform addresses. Labels are
/// bound to instruction positions during pass 1, variables are handed out
/// from address 16 upwards during pass 2.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    table: HashMap<String, u16>,
    next_variable: u16,
}

impl SymbolTable {
    /// Create a table holding only the predefined symbols.
    pub fn new() -> Self {
        Self {
            table: predefined_symbols().collect(),
            next_variable: VARIABLE_BASE,
        }
    }

    /// Look up a symbol.
    pub fn get(&self, name: &str) -> Option<u16> {
        self.table.get(name).copied()
    }

    /// Check whether a symbol is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Bind a label. Returns `false` if the name is already bound.
    pub fn define(&mut self, name: &str, addr: u16) -> bool {
        if self.table.contains_key(name) {
            return false;
        }
        self.table.insert(name.to_string(), addr);
        true
    }

    /// Resolve a symbol, allocating the next variable address if it is new.
    ///
    /// Returns `None` once the 15-bit address space is exhausted.
    pub fn resolve_or_allocate(&mut self, name: &str) -> Option<u16> {
        if let Some(addr) = self.get(name) {
            return Some(addr);
        }
        if self.next_variable > MAX_ADDRESS {
            return None;
        }
        let addr = self.next_variable;
        self.next_variable += 1;
        self.table.insert(name.to_string(), addr);
        tracing::debug!(symbol = name, addr, "allocated variable");
        Some(addr)
    }

    /// Address the next new variable would receive.
    pub fn next_variable(&self) -> u16 {
        self.next_variable
    }

    /// Number of bound symbols.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always false in practice; the predefined symbols are never removed.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// All bindings sorted by address, then name.
    pub fn entries(&self) -> Vec<(&str, u16)> {
        let mut entries: Vec<_> = self.table.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
