//! Second-order query stack: expression evaluation, candidate families,
//! the quantifier engine, plan assembly, and result materialization.

/// Fluent plan builder and plan types.
pub mod builder;

/// Quantifier engine and cancellation.
pub mod engine;

/// Candidate families for subset quantifiers.
pub mod family;

/// Structured result values and the materializer.
pub mod result;

/// Runtime value type for filter expressions.
pub mod value;

mod env;
mod expr;
mod traversal;

pub use builder::{Quantifier, QuantifierDomain, QuantifierKind, QueryBuilder, QueryPlan};
pub use engine::{CancelToken, QueryEngine};
pub use family::FamilySelector;
pub use result::{EdgeRecord, Materializer, QueryOutput, SubsetGraph, VertexRecord};
pub use value::Value;
