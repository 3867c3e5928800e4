use smallvec::SmallVec;

use crate::error::{MonacError, Result};
use crate::graph::GraphStore;
use crate::model::{Edge, EdgeId, PropertyValue, Vertex, VertexId, VertexSet};

type AdjacencyList = SmallVec<[EdgeId; 4]>;

/// In-memory reference store.
///
/// Vertices and edges live in arenas indexed by their ids; adjacency is a
/// pair of per-vertex edge-id vectors. Identity comparison is O(1) and the
/// natural vertex order is ascending id.
#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    pub(super) vertices: Vec<Vertex>,
    pub(super) edges: Vec<Edge>,
    pub(super) outgoing: Vec<AdjacencyList>,
    pub(super) incoming: Vec<AdjacencyList>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices in the store.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges in the store.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Adds a vertex and returns its id.
    pub fn add_vertex(&mut self, label: impl Into<String>) -> VertexId {
        let id = VertexId(self.vertices.len() as u64 + 1);
        self.vertices.push(Vertex::new(id, label));
        self.outgoing.push(AdjacencyList::new());
        self.incoming.push(AdjacencyList::new());
        id
    }

    /// Adds a directed edge between two existing vertices.
    pub fn add_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        label: impl Into<String>,
    ) -> Result<EdgeId> {
        let src_idx = self.vertex_index(source)?;
        let dst_idx = self.vertex_index(target)?;
        let id = EdgeId(self.edges.len() as u64 + 1);
        self.edges.push(Edge::new(id, source, target, label));
        self.outgoing[src_idx].push(id);
        self.incoming[dst_idx].push(id);
        Ok(id)
    }

    /// Sets an attribute on a vertex.
    pub fn set_vertex_property(
        &mut self,
        id: VertexId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let idx = self.vertex_index(id)?;
        self.vertices[idx].properties.insert(key.into(), value.into());
        Ok(())
    }

    /// Sets an attribute on an edge.
    pub fn set_edge_property(
        &mut self,
        id: EdgeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let idx = self.edge_index(id)?;
        self.edges[idx].properties.insert(key.into(), value.into());
        Ok(())
    }

    fn vertex_index(&self, id: VertexId) -> Result<usize> {
        let idx = id.0.checked_sub(1).map(|i| i as usize);
        match idx {
            Some(i) if i < self.vertices.len() => Ok(i),
            _ => Err(MonacError::Storage(format!("vertex {id} not found"))),
        }
    }

    fn edge_index(&self, id: EdgeId) -> Result<usize> {
        let idx = id.0.checked_sub(1).map(|i| i as usize);
        match idx {
            Some(i) if i < self.edges.len() => Ok(i),
            _ => Err(MonacError::Storage(format!("edge {id} not found"))),
        }
    }

    pub(super) fn edge_by_id(&self, id: EdgeId) -> &Edge {
        &self.edges[(id.0 - 1) as usize]
    }

    fn matches_label(&self, edge: EdgeId, label: Option<&str>) -> bool {
        match label {
            Some(l) => self.edge_by_id(edge).label == l,
            None => true,
        }
    }
}

impl GraphStore for MemoryGraph {
    fn vertex_ids(&self) -> Result<Vec<VertexId>> {
        Ok(self.vertices.iter().map(|v| v.id).collect())
    }

    fn edge_ids(&self) -> Result<Vec<EdgeId>> {
        Ok(self.edges.iter().map(|e| e.id).collect())
    }

    fn vertex(&self, id: VertexId) -> Result<Option<&Vertex>> {
        match self.vertex_index(id) {
            Ok(idx) => Ok(Some(&self.vertices[idx])),
            Err(_) => Ok(None),
        }
    }

    fn edge(&self, id: EdgeId) -> Result<Option<&Edge>> {
        match self.edge_index(id) {
            Ok(idx) => Ok(Some(&self.edges[idx])),
            Err(_) => Ok(None),
        }
    }

    fn out_neighbors(&self, v: VertexId, label: Option<&str>) -> Result<Vec<VertexId>> {
        let idx = self.vertex_index(v)?;
        Ok(self.outgoing[idx]
            .iter()
            .filter(|&&e| self.matches_label(e, label))
            .map(|&e| self.edge_by_id(e).target)
            .collect())
    }

    fn in_neighbors(&self, v: VertexId, label: Option<&str>) -> Result<Vec<VertexId>> {
        let idx = self.vertex_index(v)?;
        Ok(self.incoming[idx]
            .iter()
            .filter(|&&e| self.matches_label(e, label))
            .map(|&e| self.edge_by_id(e).source)
            .collect())
    }

    fn out_edges(&self, v: VertexId, label: Option<&str>) -> Result<Vec<EdgeId>> {
        let idx = self.vertex_index(v)?;
        Ok(self.outgoing[idx]
            .iter()
            .filter(|&&e| self.matches_label(e, label))
            .copied()
            .collect())
    }

    fn in_edges(&self, v: VertexId, label: Option<&str>) -> Result<Vec<EdgeId>> {
        let idx = self.vertex_index(v)?;
        Ok(self.incoming[idx]
            .iter()
            .filter(|&&e| self.matches_label(e, label))
            .copied()
            .collect())
    }

    fn components_weak(&self) -> Result<Vec<VertexSet>> {
        Ok(self.weak_components())
    }

    fn components_strong(&self) -> Result<Vec<VertexSet>> {
        Ok(self.strong_components())
    }

    fn communities(&self) -> Result<Vec<VertexSet>> {
        Ok(self.propagate_labels())
    }

    fn bfs(&self, seed: VertexId) -> Result<VertexSet> {
        self.vertex_index(seed)?;
        Ok(self.reachable_undirected(seed))
    }
}
