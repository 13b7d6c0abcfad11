//! Scoped symbol stack for the type checker.

use std::collections::HashMap;

/// A named binding: its canonical type and mutability.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub ty: String,
    pub mutable: bool,
}

/// A stack of maps keyed by name. Redeclaration in the same scope is an
/// error; shadowing in an inner scope is allowed.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// Create a stack holding the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn leave_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    /// Declare a name in the innermost scope. Returns `Err` with the
    /// existing symbol's type when the name is already declared there.
    pub fn declare(&mut self, name: &str, symbol: Symbol) -> Result<(), String> {
        let scope = self.scopes.last_mut().expect("at least the global scope");
        if let Some(existing) = scope.get(name) {
            return Err(existing.ty.clone());
        }
        scope.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Overwrite a binding in the innermost scope that declares it.
    pub fn update(&mut self, name: &str, ty: String) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(symbol) = scope.get_mut(name) {
                symbol.ty = ty;
                return;
            }
        }
    }

    /// Look a name up, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// All visible names, used for near-miss suggestions.
    pub fn visible_names(&self) -> impl Iterator<Item = &str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.keys().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(ty: &str) -> Symbol {
        Symbol {
            ty: ty.to_string(),
            mutable: false,
        }
    }

    #[test]
    fn test_shadowing_is_allowed() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", sym("int")).unwrap();
        scopes.enter_scope();
        scopes.declare("x", sym("string")).unwrap();
        assert_eq!(scopes.lookup("x").unwrap().ty, "string");
        scopes.leave_scope();
        assert_eq!(scopes.lookup("x").unwrap().ty, "int");
    }

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", sym("int")).unwrap();
        assert!(scopes.declare("x", sym("int")).is_err());
    }

    #[test]
    fn test_lookup_misses_left_scopes() {
        let mut scopes = ScopeStack::new();
        scopes.enter_scope();
        scopes.declare("y", sym("int")).unwrap();
        scopes.leave_scope();
        assert!(scopes.lookup("y").is_none());
    }
}
