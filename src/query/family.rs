//! Candidate families for subset-domain quantifiers.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::error::{MonacError, Result};
use crate::graph::GraphStore;
use crate::model::{VertexId, VertexSet};

/// Selects the family of vertex subsets a set quantifier ranges over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FamilySelector {
    /// All `2^|V|` subsets of the query-start snapshot, streamed.
    PowerSet,
    /// The weakly connected components.
    WeakComponents,
    /// The strongly connected components.
    StrongComponents,
    /// The communities reported by the store.
    Communities,
    /// The single set of vertices reachable from the seed along any edge
    /// direction.
    Bfs(VertexId),
}

/// Supplies candidate subsets for one query.
///
/// Partition families are read from the store on first access and memoized
/// for the lifetime of the query; the power set is re-streamed on every
/// pass and never materialized.
pub(crate) struct FamilyProvider<'g, G: GraphStore> {
    graph: &'g G,
    universe: Vec<VertexId>,
    selector: FamilySelector,
    max_power_set_vertices: usize,
    cached: RefCell<Option<Rc<Vec<VertexSet>>>>,
}

impl<'g, G: GraphStore> FamilyProvider<'g, G> {
    pub(crate) fn new(
        graph: &'g G,
        universe: Vec<VertexId>,
        selector: FamilySelector,
        max_power_set_vertices: usize,
    ) -> Self {
        Self {
            graph,
            universe,
            selector,
            max_power_set_vertices,
            cached: RefCell::new(None),
        }
    }

    /// Starts one pass over the candidate family.
    pub(crate) fn candidates(&self) -> Result<FamilyIter> {
        match self.selector {
            FamilySelector::PowerSet => {
                if self.universe.len() > self.max_power_set_vertices {
                    return Err(MonacError::OverLimit {
                        vertices: self.universe.len(),
                        max: self.max_power_set_vertices,
                    });
                }
                Ok(FamilyIter::Power(PowerSetIter::new(self.universe.clone())))
            }
            _ => Ok(FamilyIter::Partition {
                sets: self.partition_sets()?,
                index: 0,
            }),
        }
    }

    fn partition_sets(&self) -> Result<Rc<Vec<VertexSet>>> {
        if let Some(sets) = self.cached.borrow().as_ref() {
            return Ok(Rc::clone(sets));
        }
        let computed = match &self.selector {
            FamilySelector::WeakComponents => self.graph.components_weak()?,
            FamilySelector::StrongComponents => self.graph.components_strong()?,
            FamilySelector::Communities => self.graph.communities()?,
            FamilySelector::Bfs(seed) => vec![self.graph.bfs(*seed)?],
            FamilySelector::PowerSet => Vec::new(),
        };
        debug!(
            family = ?self.selector,
            subsets = computed.len(),
            "candidate family materialized"
        );
        let computed = Rc::new(computed);
        *self.cached.borrow_mut() = Some(Rc::clone(&computed));
        Ok(computed)
    }
}

#[derive(Debug)]
pub(crate) enum FamilyIter {
    Partition {
        sets: Rc<Vec<VertexSet>>,
        index: usize,
    },
    Power(PowerSetIter),
}

impl Iterator for FamilyIter {
    type Item = VertexSet;

    fn next(&mut self) -> Option<VertexSet> {
        match self {
            FamilyIter::Partition { sets, index } => {
                let set = sets.get(*index).cloned()?;
                *index += 1;
                Some(set)
            }
            FamilyIter::Power(iter) => iter.next(),
        }
    }
}

#[derive(Copy, Clone)]
#[derive(Debug)]
enum Phase {
    Include,
    Exclude,
}

/// Explicit-stack include/exclude walk over a fixed vertex ordering.
///
/// Leaves stream out as they are reached: the full set first, the empty set
/// last, one subset per leaf, `2^n` in total.
#[derive(Debug)]
pub(crate) struct PowerSetIter {
    verts: Vec<VertexId>,
    stack: Vec<Phase>,
    current: VertexSet,
    done: bool,
}

impl PowerSetIter {
    fn new(verts: Vec<VertexId>) -> Self {
        Self {
            verts,
            stack: Vec::new(),
            current: VertexSet::new(),
            done: false,
        }
    }
}

impl Iterator for PowerSetIter {
    type Item = VertexSet;

    fn next(&mut self) -> Option<VertexSet> {
        if self.done {
            return None;
        }
        // Descend include-first to the next leaf.
        while self.stack.len() < self.verts.len() {
            let v = self.verts[self.stack.len()];
            self.current.insert(v);
            self.stack.push(Phase::Include);
        }
        let leaf = self.current.clone();
        // Backtrack to the deepest include branch and flip it.
        loop {
            match self.stack.pop() {
                Some(Phase::Include) => {
                    self.current.remove(&self.verts[self.stack.len()]);
                    self.stack.push(Phase::Exclude);
                    break;
                }
                Some(Phase::Exclude) => continue,
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        Some(leaf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;

    fn provider(
        graph: &MemoryGraph,
        selector: FamilySelector,
        max_power: usize,
    ) -> FamilyProvider<'_, MemoryGraph> {
        let universe = graph.vertex_ids().expect("ids");
        FamilyProvider::new(graph, universe, selector, max_power)
    }

    fn three_vertices() -> MemoryGraph {
        let mut g = MemoryGraph::new();
        g.add_vertex("n");
        g.add_vertex("n");
        g.add_vertex("n");
        g
    }

    #[test]
    fn power_set_streams_all_subsets_once() {
        let g = three_vertices();
        let p = provider(&g, FamilySelector::PowerSet, 20);
        let subsets: Vec<VertexSet> = p.candidates().expect("family").collect();
        assert_eq!(subsets.len(), 8);
        // Full set first, empty set last.
        assert_eq!(subsets[0].len(), 3);
        assert!(subsets[7].is_empty());
        let distinct: std::collections::HashSet<_> = subsets.iter().cloned().collect();
        assert_eq!(distinct.len(), 8);
    }

    #[test]
    fn power_set_of_empty_graph_is_the_empty_set() {
        let g = MemoryGraph::new();
        let p = provider(&g, FamilySelector::PowerSet, 20);
        let subsets: Vec<VertexSet> = p.candidates().expect("family").collect();
        assert_eq!(subsets, vec![VertexSet::new()]);
    }

    #[test]
    fn power_set_respects_vertex_limit() {
        let g = three_vertices();
        let p = provider(&g, FamilySelector::PowerSet, 2);
        let err = p.candidates().unwrap_err();
        assert_eq!(err.code(), "OverLimit");
    }

    #[test]
    fn partition_families_are_memoized() {
        let mut g = MemoryGraph::new();
        let a = g.add_vertex("n");
        let b = g.add_vertex("n");
        g.add_vertex("n");
        g.add_edge(a, b, "e").expect("edge");

        let p = provider(&g, FamilySelector::WeakComponents, 20);
        let first: Vec<VertexSet> = p.candidates().expect("family").collect();
        let second: Vec<VertexSet> = p.candidates().expect("family").collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn bfs_family_is_a_single_set() {
        let mut g = MemoryGraph::new();
        let a = g.add_vertex("n");
        let b = g.add_vertex("n");
        g.add_vertex("n");
        g.add_edge(a, b, "e").expect("edge");

        let p = provider(&g, FamilySelector::Bfs(a), 20);
        let subsets: Vec<VertexSet> = p.candidates().expect("family").collect();
        assert_eq!(subsets, vec![VertexSet::from([a, b])]);
    }
}
