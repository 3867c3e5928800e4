//! Fluent assembly of second-order query plans.

use std::collections::HashSet;

use crate::error::{MonacError, Result};
use crate::graph::GraphStore;
use crate::model::VertexSet;
use crate::query::engine::QueryEngine;
use crate::query::family::FamilySelector;
use crate::query::result::QueryOutput;

/// Quantifier kind: existential or universal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantifierKind {
    Exists,
    ForAll,
}

/// What a quantifier binds: an individual vertex or a vertex subset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantifierDomain {
    Vertex,
    Subset,
}

/// One entry of the quantifier prefix.
#[derive(Clone, Debug)]
pub struct Quantifier {
    pub name: String,
    pub kind: QuantifierKind,
    pub domain: QuantifierDomain,
}

/// A validated execution plan: the quantifier prefix, the filter body, an
/// optional aggregation predicate on witnesses, and the candidate-family
/// selector subset quantifiers draw from.
#[derive(Clone, Debug)]
pub struct QueryPlan {
    pub prefix: Vec<Quantifier>,
    pub filter: String,
    pub having: Option<String>,
    pub family: Option<FamilySelector>,
}

impl QueryPlan {
    /// Checks the invariants the builder enforces, for plans assembled by
    /// hand.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(MonacError::PlanInvalid(
                "at least one quantifier is required",
            ));
        }
        if self.filter.trim().is_empty() {
            return Err(MonacError::PlanInvalid("filter body must not be empty"));
        }
        let mut names = HashSet::new();
        for quantifier in &self.prefix {
            if quantifier.name.trim().is_empty() {
                return Err(MonacError::PlanInvalid("quantifier names must not be empty"));
            }
            if !names.insert(quantifier.name.as_str()) {
                return Err(MonacError::PlanInvalid("quantifier names must be unique"));
            }
        }
        let has_subset = self
            .prefix
            .iter()
            .any(|q| q.domain == QuantifierDomain::Subset);
        if has_subset && self.family.is_none() {
            return Err(MonacError::PlanInvalid(
                "subset quantifiers require a candidate-family selector",
            ));
        }
        Ok(())
    }
}

/// Builds [`QueryPlan`]s with the original fluent surface:
/// `exists`/`forall` declare vertex quantifiers, `exists_set`/`forall_set`
/// declare subset quantifiers, `filter` supplies the formula, `having`
/// constrains witnesses, and `family` selects the subset domain.
#[derive(Default)]
pub struct QueryBuilder {
    prefix: Vec<Quantifier>,
    filter: Option<String>,
    having: Option<String>,
    family: Option<FamilySelector>,
}

impl QueryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an existential vertex quantifier (∃ name).
    pub fn exists(self, name: impl Into<String>) -> Self {
        self.quantifier(name, QuantifierKind::Exists, QuantifierDomain::Vertex)
    }

    /// Declares a universal vertex quantifier (∀ name).
    pub fn forall(self, name: impl Into<String>) -> Self {
        self.quantifier(name, QuantifierKind::ForAll, QuantifierDomain::Vertex)
    }

    /// Declares an existential subset quantifier (∃ name ⊆ V).
    pub fn exists_set(self, name: impl Into<String>) -> Self {
        self.quantifier(name, QuantifierKind::Exists, QuantifierDomain::Subset)
    }

    /// Declares a universal subset quantifier (∀ name ⊆ V).
    pub fn forall_set(self, name: impl Into<String>) -> Self {
        self.quantifier(name, QuantifierKind::ForAll, QuantifierDomain::Subset)
    }

    fn quantifier(
        mut self,
        name: impl Into<String>,
        kind: QuantifierKind,
        domain: QuantifierDomain,
    ) -> Self {
        self.prefix.push(Quantifier {
            name: name.into(),
            kind,
            domain,
        });
        self
    }

    /// Sets the filter body evaluated at every fully bound leaf.
    pub fn filter(mut self, expr: impl Into<String>) -> Self {
        self.filter = Some(expr.into());
        self
    }

    /// Sets the aggregation predicate applied to each witness before
    /// admission.
    pub fn having(mut self, expr: impl Into<String>) -> Self {
        self.having = Some(expr.into());
        self
    }

    /// Selects the candidate family subset quantifiers range over.
    pub fn family(mut self, selector: FamilySelector) -> Self {
        self.family = Some(selector);
        self
    }

    /// Validates and produces the plan.
    pub fn build(self) -> Result<QueryPlan> {
        let plan = QueryPlan {
            prefix: self.prefix,
            filter: self.filter.unwrap_or_default(),
            having: self.having,
            family: self.family,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Builds the plan and runs it in decision mode.
    pub fn decide<G: GraphStore>(self, engine: &QueryEngine<'_, G>) -> Result<bool> {
        engine.decide(&self.build()?)
    }

    /// Builds the plan and runs it in collection mode.
    pub fn collect<G: GraphStore>(self, engine: &QueryEngine<'_, G>) -> Result<Vec<VertexSet>> {
        engine.collect(&self.build()?)
    }

    /// Builds the plan, runs collection mode, and materializes the result.
    pub fn execute<G: GraphStore>(self, engine: &QueryEngine<'_, G>) -> Result<QueryOutput> {
        engine.execute_collection(&self.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_quantifiers_and_filter() {
        let err = QueryBuilder::new().filter("true").build().unwrap_err();
        assert_eq!(err.code(), "PlanInvalid");

        let err = QueryBuilder::new().exists("x").build().unwrap_err();
        assert_eq!(err.code(), "PlanInvalid");

        let err = QueryBuilder::new()
            .exists("x")
            .filter("   ")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "PlanInvalid");
    }

    #[test]
    fn build_rejects_duplicate_names() {
        let err = QueryBuilder::new()
            .exists("x")
            .forall("x")
            .filter("true")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "PlanInvalid");
    }

    #[test]
    fn subset_quantifiers_require_a_family() {
        let err = QueryBuilder::new()
            .exists_set("s")
            .filter("true")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "PlanInvalid");

        let plan = QueryBuilder::new()
            .exists_set("s")
            .filter("true")
            .family(FamilySelector::WeakComponents)
            .build()
            .expect("plan");
        assert_eq!(plan.prefix.len(), 1);
        assert_eq!(plan.prefix[0].domain, QuantifierDomain::Subset);
    }

    #[test]
    fn prefix_preserves_declaration_order() {
        let plan = QueryBuilder::new()
            .forall("x")
            .exists("y")
            .exists_set("s")
            .filter("g.V(x).out(\"knows\").is(y)")
            .having("g.V(s).count() > 1")
            .family(FamilySelector::PowerSet)
            .build()
            .expect("plan");
        let names: Vec<&str> = plan.prefix.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "s"]);
        assert_eq!(plan.prefix[0].kind, QuantifierKind::ForAll);
        assert!(plan.having.is_some());
    }
}
