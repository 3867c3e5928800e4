//! Materializes evaluator output into a neutral structured value.

use std::collections::BTreeMap;
use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{MonacError, Result};
use crate::graph::GraphStore;
use crate::model::{EdgeId, PropertyValue, VertexId, VertexSet};

/// A vertex as emitted on the wire: stable identity string, label, native
/// scalar attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub id: String,
    pub label: String,
    pub attrs: BTreeMap<String, PropertyValue>,
}

/// An induced-subgraph edge as emitted on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub label: String,
    pub source_id: String,
    pub target_id: String,
    pub attrs: BTreeMap<String, PropertyValue>,
}

/// One witness subset together with its induced subgraph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubsetGraph {
    pub vertices: Vec<VertexRecord>,
    pub edges: Vec<EdgeRecord>,
    pub size: usize,
}

/// Structured query result handed to the serialization layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QueryOutput {
    /// Decision-mode outcome.
    Bool { value: bool, elapsed: Duration },
    /// Collection-mode outcome with per-subset induced subgraphs.
    Vset {
        subsets: Vec<SubsetGraph>,
        total_count: usize,
        elapsed: Duration,
    },
}

impl QueryOutput {
    pub fn decision(value: bool, elapsed: Duration) -> Self {
        QueryOutput::Bool { value, elapsed }
    }
}

/// Packages witness families for presentation.
pub struct Materializer<'g, G: GraphStore> {
    graph: &'g G,
}

impl<'g, G: GraphStore> Materializer<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self { graph }
    }

    /// Materializes witnesses with their induced subgraphs.
    ///
    /// The out-edges of every vertex appearing in any witness are scanned
    /// once into a cache; each witness then only intersects the cache, so
    /// vertices recurring across witnesses are never rescanned.
    pub fn collection(&self, witnesses: &[VertexSet], elapsed: Duration) -> Result<QueryOutput> {
        let edge_cache = self.scan_out_edges(witnesses)?;

        let mut subsets = Vec::with_capacity(witnesses.len());
        for witness in witnesses {
            let mut edges = Vec::new();
            for &v in witness {
                for &(id, target) in edge_cache.get(&v).map(Vec::as_slice).unwrap_or(&[]) {
                    if witness.contains(&target) {
                        edges.push(self.edge_record(id)?);
                    }
                }
            }
            subsets.push(SubsetGraph {
                vertices: self.vertex_records(witness)?,
                edges,
                size: witness.len(),
            });
        }

        Ok(QueryOutput::Vset {
            total_count: subsets.len(),
            subsets,
            elapsed,
        })
    }

    /// Vertices-only materialization, for clients that do not render edges.
    pub fn collection_vertices_only(
        &self,
        witnesses: &[VertexSet],
        elapsed: Duration,
    ) -> Result<QueryOutput> {
        let mut subsets = Vec::with_capacity(witnesses.len());
        for witness in witnesses {
            subsets.push(SubsetGraph {
                vertices: self.vertex_records(witness)?,
                edges: Vec::new(),
                size: witness.len(),
            });
        }
        Ok(QueryOutput::Vset {
            total_count: subsets.len(),
            subsets,
            elapsed,
        })
    }

    fn scan_out_edges(
        &self,
        witnesses: &[VertexSet],
    ) -> Result<FxHashMap<VertexId, Vec<(EdgeId, VertexId)>>> {
        let mut all_vertices: FxHashSet<VertexId> = FxHashSet::default();
        for witness in witnesses {
            all_vertices.extend(witness.iter().copied());
        }

        let mut cache: FxHashMap<VertexId, Vec<(EdgeId, VertexId)>> = FxHashMap::default();
        for &v in &all_vertices {
            let mut scanned = Vec::new();
            for id in self.graph.out_edges(v, None)? {
                let edge = self
                    .graph
                    .edge(id)?
                    .ok_or_else(|| MonacError::Storage(format!("edge {id} not found")))?;
                scanned.push((id, edge.target));
            }
            cache.insert(v, scanned);
        }
        Ok(cache)
    }

    fn vertex_records(&self, witness: &VertexSet) -> Result<Vec<VertexRecord>> {
        let mut records = Vec::with_capacity(witness.len());
        for &v in witness {
            let vertex = self
                .graph
                .vertex(v)?
                .ok_or_else(|| MonacError::Storage(format!("vertex {v} not found")))?;
            records.push(VertexRecord {
                id: vertex.id.to_string(),
                label: vertex.label.clone(),
                attrs: vertex.properties.clone(),
            });
        }
        Ok(records)
    }

    fn edge_record(&self, id: EdgeId) -> Result<EdgeRecord> {
        let edge = self
            .graph
            .edge(id)?
            .ok_or_else(|| MonacError::Storage(format!("edge {id} not found")))?;
        Ok(EdgeRecord {
            id: edge.id.to_string(),
            label: edge.label.clone(),
            source_id: edge.source.to_string(),
            target_id: edge.target.to_string(),
            attrs: edge.properties.clone(),
        })
    }
}
