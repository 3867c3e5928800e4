#![forbid(unsafe_code)]

//! monac, a second-order graph query engine.
//!
//! Classical graph traversal quantifies over individual vertices; monac
//! additionally quantifies over *sets* of vertices. A query declares an
//! ordered quantifier prefix (each entry ∃ or ∀, binding a vertex or a
//! subset drawn from a candidate family), a filter body in a small
//! traversal sublanguage, and optionally an aggregation predicate. Decision
//! mode reports whether the formula holds; collection mode enumerates every
//! witness subset together with its induced subgraph.
//!
//! ```
//! use monac::{FamilySelector, MemoryGraph, QueryBuilder, QueryEngine};
//!
//! let mut graph = MemoryGraph::new();
//! let alice = graph.add_vertex("person");
//! let bob = graph.add_vertex("person");
//! graph.add_edge(alice, bob, "knows").unwrap();
//! graph.add_edge(bob, alice, "knows").unwrap();
//!
//! let engine = QueryEngine::new(&graph);
//! let somebody_knows_somebody = QueryBuilder::new()
//!     .exists("x")
//!     .exists("y")
//!     .filter("g.V(x).out(\"knows\").is(y)")
//!     .decide(&engine)
//!     .unwrap();
//! assert!(somebody_knows_somebody);
//!
//! // Every subset in which each member knows some member: the empty set
//! // (vacuously) and {alice, bob}.
//! let witnesses = QueryBuilder::new()
//!     .forall("x")
//!     .exists("y")
//!     .exists_set("s")
//!     .filter("g.V(x).out(\"knows\").is(y)")
//!     .family(FamilySelector::PowerSet)
//!     .collect(&engine)
//!     .unwrap();
//! assert_eq!(witnesses.len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod query;

pub use config::EngineConfig;
pub use error::{MonacError, Result};
pub use graph::{GraphStore, MemoryGraph};
pub use model::{Edge, EdgeId, PropertyValue, Vertex, VertexId, VertexSet};
pub use query::{
    CancelToken, EdgeRecord, FamilySelector, Materializer, Quantifier, QuantifierDomain,
    QuantifierKind, QueryBuilder, QueryEngine, QueryOutput, QueryPlan, SubsetGraph, Value,
    VertexRecord,
};
