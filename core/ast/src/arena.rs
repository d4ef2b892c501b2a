use crate::nodes::{Ast, AstNode, Definition, FunctionDefinition, SourceFile};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Storage for every top-level node the builder produced.
///
/// Iteration helpers return nodes in id order, which is parse order, so every
/// consumer sees the same sequence for the same input.
#[derive(Default, Clone, Debug)]
pub struct Arena {
    pub(crate) nodes: FxHashMap<u32, AstNode>,
    pub(crate) parents: FxHashMap<u32, u32>,
}

impl Arena {
    #[must_use]
    pub fn source_files(&self) -> Vec<Rc<SourceFile>> {
        self.list_nodes_cmp(|node| {
            if let AstNode::Ast(Ast::SourceFile(source_file)) = node {
                Some(source_file.clone())
            } else {
                None
            }
        })
    }

    /// All top-level function definitions, in parse order.
    #[must_use]
    pub fn functions(&self) -> Vec<Rc<FunctionDefinition>> {
        self.list_nodes_cmp(|node| {
            if let AstNode::Definition(Definition::Function(func_def)) = node {
                Some(func_def.clone())
            } else {
                None
            }
        })
    }

    /// Looks up a top-level function by name.
    ///
    /// A later definition of the same name replaces an earlier one.
    #[must_use]
    pub fn find_function(&self, name: &str) -> Option<Rc<FunctionDefinition>> {
        self.functions()
            .into_iter()
            .rev()
            .find(|function| function.name.name == name)
    }

    /// Adds a node to the arena and records its parent.
    ///
    /// # Panics
    ///
    /// Panics if `node.id()` is zero or if a node with the same ID already exists in the arena.
    pub fn add_node(&mut self, node: AstNode, parent_id: u32) {
        assert!(node.id() != 0, "Node ID must be non-zero");
        assert!(
            !self.nodes.contains_key(&node.id()),
            "Node with ID {} already exists in the arena",
            node.id()
        );
        let id = node.id();
        self.nodes.insert(id, node);
        self.parents.insert(id, parent_id);
    }

    #[must_use]
    pub fn find_node(&self, id: u32) -> Option<AstNode> {
        self.nodes.get(&id).cloned()
    }

    #[must_use]
    pub fn find_parent_node(&self, id: u32) -> Option<u32> {
        self.parents
            .get(&id)
            .copied()
            .filter(|parent| *parent != u32::MAX)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn list_nodes_cmp<T, F>(&self, cmp: F) -> Vec<T>
    where
        F: Fn(&AstNode) -> Option<T>,
    {
        let mut ids: Vec<u32> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids.iter()
            .filter_map(|id| self.nodes.get(id))
            .filter_map(cmp)
            .collect()
    }
}
