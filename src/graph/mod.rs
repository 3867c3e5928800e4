//! Storage surface consumed by the query engine.
//!
//! The engine is generic over [`GraphStore`]; [`MemoryGraph`] is the
//! arena-backed reference implementation used in tests and embeddings.

mod algo;
mod memory;

pub use memory::MemoryGraph;

use crate::error::Result;
use crate::model::{Edge, EdgeId, PropertyValue, Vertex, VertexId, VertexSet};

/// Read-only contract the second-order evaluator requires from a storage
/// engine.
///
/// All calls are idempotent. Neighbor scans return ids in the store's
/// natural order, which fixes the evaluator's enumeration order. Failures
/// surface as [`crate::MonacError::Storage`] and abort the query.
pub trait GraphStore {
    /// All vertex ids in natural (ascending) order.
    fn vertex_ids(&self) -> Result<Vec<VertexId>>;

    /// All edge ids in natural order.
    fn edge_ids(&self) -> Result<Vec<EdgeId>>;

    /// Looks up a single vertex.
    fn vertex(&self, id: VertexId) -> Result<Option<&Vertex>>;

    /// Looks up a single edge.
    fn edge(&self, id: EdgeId) -> Result<Option<&Edge>>;

    /// Targets of the outgoing edges of `v`, optionally restricted by label.
    fn out_neighbors(&self, v: VertexId, label: Option<&str>) -> Result<Vec<VertexId>>;

    /// Sources of the incoming edges of `v`, optionally restricted by label.
    fn in_neighbors(&self, v: VertexId, label: Option<&str>) -> Result<Vec<VertexId>>;

    /// Neighbors along either direction; duplicates are preserved when a
    /// pair is connected both ways.
    fn both_neighbors(&self, v: VertexId, label: Option<&str>) -> Result<Vec<VertexId>> {
        let mut neighbors = self.out_neighbors(v, label)?;
        neighbors.extend(self.in_neighbors(v, label)?);
        Ok(neighbors)
    }

    /// Outgoing edge ids of `v`, optionally restricted by label.
    fn out_edges(&self, v: VertexId, label: Option<&str>) -> Result<Vec<EdgeId>>;

    /// Incoming edge ids of `v`, optionally restricted by label.
    fn in_edges(&self, v: VertexId, label: Option<&str>) -> Result<Vec<EdgeId>>;

    /// Reads one vertex attribute.
    fn vertex_attr(&self, v: VertexId, key: &str) -> Result<Option<&PropertyValue>> {
        Ok(self.vertex(v)?.and_then(|vertex| vertex.properties.get(key)))
    }

    /// Reads one edge attribute.
    fn edge_attr(&self, e: EdgeId, key: &str) -> Result<Option<&PropertyValue>> {
        Ok(self.edge(e)?.and_then(|edge| edge.properties.get(key)))
    }

    /// Weakly connected components, a partition of the vertex set.
    fn components_weak(&self) -> Result<Vec<VertexSet>>;

    /// Strongly connected components, a partition of the vertex set.
    fn components_strong(&self) -> Result<Vec<VertexSet>>;

    /// Communities as computed by the store.
    fn communities(&self) -> Result<Vec<VertexSet>>;

    /// Vertices reachable from `seed` along any edge direction, `seed`
    /// included.
    fn bfs(&self, seed: VertexId) -> Result<VertexSet>;
}
