//! Scoped symbol tables.
//!
//! The parser, the printer, and the toy front end all resolve names the same
//! way: a stack of maps where lookups go from the innermost scope outwards.
//! A scope can be marked as isolated, which hides everything below it. This
//! is how function bodies start with a clean slate while still sitting on
//! top of their enclosing scopes.
use std::collections::HashMap;
use std::hash::Hash;

struct Scope<K, V> {
    entries: HashMap<K, V>,
    isolated: bool,
}

impl<K, V> Scope<K, V> {
    fn new(isolated: bool) -> Self {
        Scope {
            entries: HashMap::new(),
            isolated,
        }
    }
}

pub struct ScopedMap<K, V> {
    scopes: Vec<Scope<K, V>>,
}

impl<K: Eq + Hash, V> Default for ScopedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> ScopedMap<K, V> {
    /// Create a map with a single (root) scope.
    pub fn new() -> Self {
        ScopedMap {
            scopes: vec![Scope::new(false)],
        }
    }
    pub fn push(&mut self) {
        self.scopes.push(Scope::new(false));
    }
    /// Push a scope that hides all entries of the enclosing scopes.
    pub fn push_isolated(&mut self) {
        self.scopes.push(Scope::new(true));
    }
    /// Pop the innermost scope.
    ///
    /// The root scope is never popped; popping it is a no-op that returns
    /// `false`.
    pub fn pop(&mut self) -> bool {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            true
        } else {
            false
        }
    }
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
    /// Insert into the innermost scope and return the entry it shadowed in
    /// that same scope, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.scopes.last_mut() {
            Some(scope) => scope.entries.insert(key, value),
            None => None,
        }
    }
    /// Whether the key is defined in the innermost scope.
    pub fn contains_in_current(&self, key: &K) -> bool {
        self.scopes
            .last()
            .map(|scope| scope.entries.contains_key(key))
            .unwrap_or(false)
    }
    /// Search from the innermost scope outwards, stopping after the first
    /// isolated scope.
    pub fn lookup(&self, key: &K) -> Option<&V> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.entries.get(key) {
                return Some(value);
            }
            if scope.isolated {
                break;
            }
        }
        None
    }
}

/// Map from textual names to values.
pub type SymbolTable<V> = ScopedMap<String, V>;

impl<V> ScopedMap<String, V> {
    /// Return the first `{prefix}{n}` (counting from zero) that is not visible
    /// in the current scope.
    pub fn next_unused_symbol(&self, prefix: &str) -> String {
        let mut index = 0;
        loop {
            let name = format!("{prefix}{index}");
            if self.lookup(&name).is_none() {
                return name;
            }
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_searches_outwards() {
        let mut table: SymbolTable<i32> = SymbolTable::new();
        table.insert("a".to_string(), 1);
        table.push();
        table.insert("b".to_string(), 2);
        assert_eq!(table.lookup(&"a".to_string()), Some(&1));
        assert_eq!(table.lookup(&"b".to_string()), Some(&2));
        assert!(table.pop());
        assert_eq!(table.lookup(&"b".to_string()), None);
        assert!(!table.pop());
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn shadowing() {
        let mut table: SymbolTable<i32> = SymbolTable::new();
        table.insert("a".to_string(), 1);
        table.push();
        assert!(!table.contains_in_current(&"a".to_string()));
        assert_eq!(table.insert("a".to_string(), 2), None);
        assert_eq!(table.lookup(&"a".to_string()), Some(&2));
        assert_eq!(table.insert("a".to_string(), 3), Some(2));
        table.pop();
        assert_eq!(table.lookup(&"a".to_string()), Some(&1));
    }

    #[test]
    fn isolated_scope_hides_enclosing_entries() {
        let mut table: SymbolTable<i32> = SymbolTable::new();
        table.insert("%0".to_string(), 0);
        table.push_isolated();
        assert_eq!(table.lookup(&"%0".to_string()), None);
        assert_eq!(table.next_unused_symbol("%"), "%0");
        table.insert("%0".to_string(), 10);
        table.push();
        // Entries of the isolated scope itself stay visible.
        assert_eq!(table.lookup(&"%0".to_string()), Some(&10));
        assert_eq!(table.next_unused_symbol("%"), "%1");
        table.pop();
        table.pop();
        assert_eq!(table.lookup(&"%0".to_string()), Some(&0));
    }

    #[test]
    fn next_unused_symbol_by_prefix() {
        let mut table: SymbolTable<()> = SymbolTable::new();
        assert_eq!(table.next_unused_symbol("%arg"), "%arg0");
        table.insert("%arg0".to_string(), ());
        table.insert("%0".to_string(), ());
        assert_eq!(table.next_unused_symbol("%arg"), "%arg1");
        assert_eq!(table.next_unused_symbol("%"), "%1");
    }
}
