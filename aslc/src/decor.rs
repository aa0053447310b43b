//! Side tables attaching pass results to tree nodes.
//!
//! Writers are the symbols and annotation passes; the codegen pass only
//! reads. Reading a node nobody decorated means a pass was skipped or
//! walked the tree differently, which is unrecoverable.

use crate::symtab::ScopeId;
use crate::types::TypeId;
use ast::NodeId;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TreeDecoration {
    scopes: HashMap<NodeId, ScopeId>,
    types: HashMap<NodeId, TypeId>,
}

impl TreeDecoration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_scope(&mut self, node: NodeId, scope: ScopeId) {
        self.scopes.insert(node, scope);
    }

    pub fn get_scope(&self, node: NodeId) -> ScopeId {
        *self
            .scopes
            .get(&node)
            .unwrap_or_else(|| panic!("node {node} carries no scope decoration"))
    }

    pub fn put_type(&mut self, node: NodeId, ty: TypeId) {
        self.types.insert(node, ty);
    }

    pub fn get_type(&self, node: NodeId) -> TypeId {
        *self
            .types
            .get(&node)
            .unwrap_or_else(|| panic!("node {node} carries no type decoration"))
    }

    pub fn has_type(&self, node: NodeId) -> bool {
        self.types.contains_key(&node)
    }

    pub fn has_scope(&self, node: NodeId) -> bool {
        self.scopes.contains_key(&node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypesMgr;

    #[test]
    fn decorations_round_trip() {
        let types = TypesMgr::new();
        let mut decor = TreeDecoration::new();
        let node = NodeId::new();

        assert!(!decor.has_type(node));
        decor.put_type(node, types.create_integer());
        assert_eq!(decor.get_type(node), types.create_integer());
    }

    #[test]
    #[should_panic(expected = "no type decoration")]
    fn reading_an_undecorated_node_is_fatal() {
        let decor = TreeDecoration::new();
        decor.get_type(NodeId::new());
    }
}
