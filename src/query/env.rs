//! Binding environment threaded through quantifier recursion.

use crate::model::{VertexId, VertexSet};

/// A quantifier binding: an individual vertex or a vertex subset.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Vertex(VertexId),
    Subset(VertexSet),
}

/// Name-to-binding environment.
///
/// Bindings are pushed on quantifier entry and popped on exit; lookups see
/// the innermost binding first. Sibling branches never observe each other's
/// bindings.
#[derive(Debug, Default)]
pub struct Env {
    bindings: Vec<(String, Binding)>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.push((name.into(), binding));
    }

    pub fn pop(&mut self) {
        self.bindings.pop();
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
    }

    /// The innermost subset binding, which scopes vertex-domain quantifiers
    /// and membership tests.
    pub fn innermost_subset(&self) -> Option<&VertexSet> {
        self.bindings.iter().rev().find_map(|(_, b)| match b {
            Binding::Subset(set) => Some(set),
            Binding::Vertex(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_sees_innermost_binding_first() {
        let mut env = Env::new();
        env.push("x", Binding::Vertex(VertexId(1)));
        env.push("s", Binding::Subset(VertexSet::from([VertexId(2)])));
        env.push("x", Binding::Vertex(VertexId(3)));

        assert_eq!(env.get("x"), Some(&Binding::Vertex(VertexId(3))));
        env.pop();
        assert_eq!(env.get("x"), Some(&Binding::Vertex(VertexId(1))));
        assert!(env.get("missing").is_none());
    }

    #[test]
    fn innermost_subset_skips_vertex_bindings() {
        let mut env = Env::new();
        assert!(env.innermost_subset().is_none());
        let outer = VertexSet::from([VertexId(1), VertexId(2)]);
        let inner = VertexSet::from([VertexId(3)]);
        env.push("s", Binding::Subset(outer));
        env.push("t", Binding::Subset(inner.clone()));
        env.push("x", Binding::Vertex(VertexId(9)));

        assert_eq!(env.innermost_subset(), Some(&inner));
    }
}
