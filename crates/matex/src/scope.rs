//! Variable environments.
//!
//! A [`Scope`] maps variable names to string values.
//! Each `FOR` block runs in a child scope of the enclosing one,
//!     so the loop variable shadows any outer binding with the same name
//!     and disappears when the block ends.
//!
//! ```
//! # use matex::Scope;
//! let mut outer = Scope::new();
//! outer.insert("x", "outer");
//! outer.insert("y", "y");
//! let mut inner = outer.child();
//! inner.insert("x", "inner");
//! assert_eq!(inner.get("x"), Some("inner"));
//! assert_eq!(inner.get("y"), Some("y"));
//! assert_eq!(outer.get("x"), Some("outer"));
//! ```

use std::collections::HashMap;

/// Lexically scoped variable bindings.
#[derive(Debug, Default)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    bindings: HashMap<String, String>,
}

impl Scope<'static> {
    /// Creates an empty root scope.
    pub fn new() -> Scope<'static> {
        Default::default()
    }
}

impl<'a> Scope<'a> {
    /// Creates an empty scope whose lookups fall back to this scope.
    pub fn child(&self) -> Scope<'_> {
        Scope {
            parent: Some(self),
            bindings: Default::default(),
        }
    }

    /// Binds a variable in this scope, replacing any binding this scope already has.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.bindings.insert(name.into(), value.into());
    }

    /// Returns the value of the nearest binding of the variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.bindings.get(name) {
            Some(value) => Some(value),
            None => self.parent.and_then(|parent| parent.get(name)),
        }
    }

    /// Returns the number of enclosing scopes.
    pub fn depth(&self) -> usize {
        match self.parent {
            None => 0,
            Some(parent) => parent.depth() + 1,
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Scope<'static> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut scope = Scope::new();
        for (name, value) in iter {
            scope.insert(name, value);
        }
        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_binding_wins() {
        let outer: Scope = [("x", "1"), ("y", "2")].into_iter().collect();
        let mut middle = outer.child();
        middle.insert("x", "3");
        let mut inner = middle.child();
        inner.insert("z", "4");
        assert_eq!(inner.get("x"), Some("3"));
        assert_eq!(inner.get("y"), Some("2"));
        assert_eq!(inner.get("z"), Some("4"));
        assert_eq!(inner.get("w"), None);
        assert_eq!(middle.get("z"), None);
        assert_eq!(inner.depth(), 2);
    }

    #[test]
    fn insert_overwrites_in_same_scope() {
        let mut scope = Scope::new();
        scope.insert("x", "a");
        scope.insert("x", "b");
        assert_eq!(scope.get("x"), Some("b"));
    }
}
