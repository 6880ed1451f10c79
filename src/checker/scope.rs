//! Scope tree (`spec.md` §3 "Scope"): identifier → symbol plus a parent
//! link, nested to match block/function/module structure. Insertions
//! enforce "rebinding `let` allowed within nested scopes, not within the
//! same scope" (`spec.md` §3).

use std::collections::HashMap;

use crate::types::SymbolId;

#[derive(Debug, Default)]
struct ScopeNode {
    parent: Option<usize>,
    bindings: HashMap<String, SymbolId>,
}

/// Index of a scope within its owning [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Vec<ScopeNode>,
}

impl ScopeTree {
    /// Creates the tree with its single module-level root scope.
    pub fn new() -> (Self, ScopeId) {
        let mut tree = Self { scopes: vec![] };
        let root = tree.push_root();
        (tree, root)
    }

    fn push_root(&mut self) -> ScopeId {
        self.scopes.push(ScopeNode::default());
        ScopeId(self.scopes.len() - 1)
    }

    pub fn child_of(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(ScopeNode {
            parent: Some(parent.0),
            bindings: HashMap::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// Binds `name` to `symbol` in `scope`. Returns `Err` with the
    /// previously-bound symbol if `name` is already declared *in this exact
    /// scope* — shadowing a name from an enclosing scope is fine and simply
    /// overwrites what `resolve` would otherwise find there.
    pub fn declare(&mut self, scope: ScopeId, name: &str, symbol: SymbolId) -> Result<(), SymbolId> {
        let node = &mut self.scopes[scope.0];
        if let Some(existing) = node.bindings.get(name) {
            return Err(*existing);
        }
        node.bindings.insert(name.to_string(), symbol);
        Ok(())
    }

    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope.0);
        while let Some(idx) = current {
            let node = &self.scopes[idx];
            if let Some(symbol) = node.bindings.get(name) {
                return Some(*symbol);
            }
            current = node.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_is_allowed_in_a_nested_scope() {
        let (mut tree, root) = ScopeTree::new();
        tree.declare(root, "x", SymbolId(0)).unwrap();
        let child = tree.child_of(root);
        tree.declare(child, "x", SymbolId(1)).unwrap();
        assert_eq!(tree.resolve(child, "x"), Some(SymbolId(1)));
        assert_eq!(tree.resolve(root, "x"), Some(SymbolId(0)));
    }

    #[test]
    fn redeclaration_in_the_same_scope_is_rejected() {
        let (mut tree, root) = ScopeTree::new();
        tree.declare(root, "x", SymbolId(0)).unwrap();
        assert_eq!(tree.declare(root, "x", SymbolId(1)), Err(SymbolId(0)));
    }

    #[test]
    fn resolution_walks_up_to_the_root() {
        let (mut tree, root) = ScopeTree::new();
        tree.declare(root, "g", SymbolId(7)).unwrap();
        let child = tree.child_of(root);
        let grandchild = tree.child_of(child);
        assert_eq!(tree.resolve(grandchild, "g"), Some(SymbolId(7)));
    }
}
