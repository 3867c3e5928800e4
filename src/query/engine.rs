//! Recursive quantifier engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{MonacError, Result};
use crate::graph::GraphStore;
use crate::model::{VertexId, VertexSet};
use crate::query::builder::{Quantifier, QuantifierDomain, QuantifierKind, QueryPlan};
use crate::query::env::{Binding, Env};
use crate::query::expr::ExprEvaluator;
use crate::query::family::FamilyProvider;
use crate::query::result::{Materializer, QueryOutput};
use crate::query::traversal::TraversalScope;

/// Cooperative cancellation signal, checked at every quantifier entry and
/// at every leaf. The host owns any timers and flips the token to enforce a
/// timeout.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Evaluates second-order query plans against a store.
///
/// The engine holds no mutable state; every call snapshots the vertex set,
/// builds a fresh environment, and runs to completion. Hosts may run many
/// engines in parallel over one externally synchronized store.
pub struct QueryEngine<'g, G: GraphStore> {
    graph: &'g G,
    config: EngineConfig,
    cancel: CancelToken,
}

impl<'g, G: GraphStore> QueryEngine<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self::with_config(graph, EngineConfig::default())
    }

    pub fn with_config(graph: &'g G, config: EngineConfig) -> Self {
        Self {
            graph,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Installs a shared cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The token that cancels this engine's queries.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Decision mode: binds the prefix in order and reports whether the
    /// formula holds.
    pub fn decide(&self, plan: &QueryPlan) -> Result<bool> {
        plan.validate()?;
        let snapshot = self.graph.vertex_ids()?;
        debug!(
            quantifiers = plan.prefix.len(),
            vertices = snapshot.len(),
            "deciding second-order query"
        );
        let provider = self.provider_for(plan, &snapshot);
        let evaluator = self.evaluator_for(&snapshot);
        let ctx = RunCtx {
            prefix: &plan.prefix,
            filter: &plan.filter,
            snapshot: &snapshot,
            provider: provider.as_ref(),
            evaluator: &evaluator,
        };
        let mut env = Env::new();
        self.eval_prefix(&ctx, &mut env, 0)
    }

    /// Collection mode: enumerates the candidate family bound to the last
    /// (subset-domain) quantifier and returns every witness, deduplicated
    /// and in a deterministic order.
    pub fn collect(&self, plan: &QueryPlan) -> Result<Vec<VertexSet>> {
        plan.validate()?;
        let Some((last, head)) = plan.prefix.split_last() else {
            return Err(MonacError::PlanInvalid("prefix must not be empty"));
        };
        if last.domain != QuantifierDomain::Subset {
            return Err(MonacError::PlanInvalid(
                "collection requires the last quantifier to bind a subset",
            ));
        }

        let snapshot = self.graph.vertex_ids()?;
        debug!(
            quantifiers = plan.prefix.len(),
            vertices = snapshot.len(),
            "collecting witness subsets"
        );
        let provider = self
            .provider_for(plan, &snapshot)
            .ok_or(MonacError::PlanInvalid(
                "collection requires a candidate-family selector",
            ))?;
        let evaluator = self.evaluator_for(&snapshot);
        let ctx = RunCtx {
            prefix: head,
            filter: &plan.filter,
            snapshot: &snapshot,
            provider: Some(&provider),
            evaluator: &evaluator,
        };

        let mut witnesses: FxHashSet<VertexSet> = FxHashSet::default();
        let mut env = Env::new();
        // No short-circuit across candidates: each subset is admitted or
        // rejected on its own.
        for candidate in provider.candidates()? {
            if self.cancel.is_cancelled() {
                return Err(MonacError::Cancelled);
            }
            env.push(last.name.as_str(), Binding::Subset(candidate.clone()));
            let mut admit = self.eval_prefix(&ctx, &mut env, 0)?;
            if admit {
                if let Some(having) = &plan.having {
                    admit = evaluator.eval_truth(&env, having)?;
                }
            }
            env.pop();
            if admit && witnesses.insert(candidate) && witnesses.len() > self.config.max_result_subsets
            {
                return Err(MonacError::TooLargeResult {
                    max: self.config.max_result_subsets,
                });
            }
        }

        let mut ordered: Vec<VertexSet> = witnesses.into_iter().collect();
        ordered.sort();
        Ok(ordered)
    }

    /// Times a decision run and wraps it for serialization.
    pub fn execute_decision(&self, plan: &QueryPlan) -> Result<QueryOutput> {
        let started = Instant::now();
        let value = self.decide(plan)?;
        Ok(QueryOutput::decision(value, started.elapsed()))
    }

    /// Times a collection run and materializes induced subgraphs.
    pub fn execute_collection(&self, plan: &QueryPlan) -> Result<QueryOutput> {
        let started = Instant::now();
        let witnesses = self.collect(plan)?;
        Materializer::new(self.graph).collection(&witnesses, started.elapsed())
    }

    fn provider_for(
        &self,
        plan: &QueryPlan,
        snapshot: &[VertexId],
    ) -> Option<FamilyProvider<'g, G>> {
        plan.family.clone().map(|selector| {
            FamilyProvider::new(
                self.graph,
                snapshot.to_vec(),
                selector,
                self.config.max_power_set_vertices,
            )
        })
    }

    fn evaluator_for<'s>(&self, snapshot: &'s [VertexId]) -> ExprEvaluator<'s, G>
    where
        'g: 's,
    {
        ExprEvaluator::new(
            TraversalScope {
                graph: self.graph,
                snapshot,
            },
            self.config.catch_expression_errors,
        )
    }

    fn eval_prefix(&self, ctx: &RunCtx<'_, '_, G>, env: &mut Env, index: usize) -> Result<bool> {
        if self.cancel.is_cancelled() {
            return Err(MonacError::Cancelled);
        }

        let Some(quantifier) = ctx.prefix.get(index) else {
            return ctx.evaluator.eval_truth(env, ctx.filter);
        };

        match quantifier.domain {
            QuantifierDomain::Vertex => {
                // Vertex quantifiers range over the innermost subset binding
                // when one is in scope, otherwise over the snapshot.
                let domain: Vec<VertexId> = match env.innermost_subset() {
                    Some(set) => set.iter().copied().collect(),
                    None => ctx.snapshot.to_vec(),
                };
                self.eval_quantifier(ctx, env, index, quantifier, domain.into_iter().map(Binding::Vertex))
            }
            QuantifierDomain::Subset => {
                let provider = ctx.provider.ok_or(MonacError::PlanInvalid(
                    "subset quantifier requires a candidate-family selector",
                ))?;
                let candidates = provider.candidates()?;
                self.eval_quantifier(ctx, env, index, quantifier, candidates.map(Binding::Subset))
            }
        }
    }

    fn eval_quantifier(
        &self,
        ctx: &RunCtx<'_, '_, G>,
        env: &mut Env,
        index: usize,
        quantifier: &Quantifier,
        bindings: impl Iterator<Item = Binding>,
    ) -> Result<bool> {
        for binding in bindings {
            env.push(quantifier.name.as_str(), binding);
            let child = self.eval_prefix(ctx, env, index + 1);
            env.pop();
            let child = child?;
            match quantifier.kind {
                QuantifierKind::Exists if child => return Ok(true),
                QuantifierKind::ForAll if !child => return Ok(false),
                _ => {}
            }
        }
        // Vacuous laws: an exhausted ∃ is false, an exhausted ∀ is true.
        Ok(quantifier.kind == QuantifierKind::ForAll)
    }
}

struct RunCtx<'r, 'g, G: GraphStore> {
    prefix: &'r [Quantifier],
    filter: &'r str,
    snapshot: &'r [VertexId],
    provider: Option<&'r FamilyProvider<'g, G>>,
    evaluator: &'r ExprEvaluator<'r, G>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::query::builder::QueryBuilder;
    use crate::query::family::FamilySelector;

    fn knows_cycle() -> MemoryGraph {
        let mut g = MemoryGraph::new();
        let a = g.add_vertex("person");
        let b = g.add_vertex("person");
        let c = g.add_vertex("person");
        g.add_vertex("person");
        g.add_edge(a, b, "knows").expect("a->b");
        g.add_edge(b, c, "knows").expect("b->c");
        g.add_edge(c, a, "knows").expect("c->a");
        g
    }

    #[test]
    fn vacuous_laws_on_the_empty_graph() {
        let g = MemoryGraph::new();
        let engine = QueryEngine::new(&g);

        let forall = QueryBuilder::new()
            .forall("x")
            .filter("false")
            .build()
            .expect("plan");
        assert!(engine.decide(&forall).expect("decide"));

        let exists = QueryBuilder::new()
            .exists("x")
            .filter("true")
            .build()
            .expect("plan");
        assert!(!engine.decide(&exists).expect("decide"));
    }

    #[test]
    fn single_vertex_graph_reduces_to_the_filter() {
        let mut g = MemoryGraph::new();
        g.add_vertex("person");
        let engine = QueryEngine::new(&g);

        let plan = QueryBuilder::new()
            .exists("x")
            .filter("g.V(x)")
            .build()
            .expect("plan");
        assert!(engine.decide(&plan).expect("decide"));

        let plan = QueryBuilder::new()
            .forall("x")
            .filter("g.V(x).out()")
            .build()
            .expect("plan");
        assert!(!engine.decide(&plan).expect("decide"));
    }

    #[test]
    fn decision_is_idempotent() {
        let g = knows_cycle();
        let engine = QueryEngine::new(&g);
        let plan = QueryBuilder::new()
            .exists("x")
            .exists("y")
            .filter("g.V(x).out(\"knows\").is(y)")
            .build()
            .expect("plan");
        let first = engine.decide(&plan).expect("decide");
        let second = engine.decide(&plan).expect("decide");
        assert!(first);
        assert_eq!(first, second);
    }

    #[test]
    fn collection_comprehends_over_the_family() {
        let g = knows_cycle();
        let engine = QueryEngine::new(&g);
        // Subsets where every member knows some member.
        let plan = QueryBuilder::new()
            .forall("x")
            .exists("y")
            .exists_set("s")
            .filter("g.V(x).out(\"knows\").is(y)")
            .family(FamilySelector::PowerSet)
            .build()
            .expect("plan");
        let witnesses = engine.collect(&plan).expect("collect");
        // The empty set is vacuous and the 3-cycle closes on itself; nothing
        // containing the isolated vertex qualifies.
        let empty = VertexSet::new();
        let cycle: VertexSet = [VertexId(1), VertexId(2), VertexId(3)].into_iter().collect();
        assert_eq!(witnesses, vec![empty, cycle]);
    }

    #[test]
    fn collection_requires_trailing_subset_quantifier() {
        let g = knows_cycle();
        let engine = QueryEngine::new(&g);
        let plan = QueryBuilder::new()
            .exists_set("s")
            .exists("x")
            .filter("g.V(x)")
            .family(FamilySelector::PowerSet)
            .build()
            .expect("plan");
        let err = engine.collect(&plan).unwrap_err();
        assert_eq!(err.code(), "PlanInvalid");
    }

    #[test]
    fn result_cap_is_enforced() {
        let g = knows_cycle();
        let config = EngineConfig {
            max_result_subsets: 3,
            ..EngineConfig::default()
        };
        let engine = QueryEngine::with_config(&g, config);
        let plan = QueryBuilder::new()
            .exists_set("s")
            .filter("true")
            .family(FamilySelector::PowerSet)
            .build()
            .expect("plan");
        let err = engine.collect(&plan).unwrap_err();
        assert_eq!(err.code(), "TooLargeResult");
    }

    #[test]
    fn cancellation_aborts_the_run() {
        let g = knows_cycle();
        let engine = QueryEngine::new(&g);
        engine.cancel_token().cancel();
        let plan = QueryBuilder::new()
            .forall("x")
            .filter("true")
            .build()
            .expect("plan");
        let err = engine.decide(&plan).unwrap_err();
        assert_eq!(err.code(), "Cancelled");
    }

    #[test]
    fn strict_config_propagates_expression_errors() {
        let g = knows_cycle();
        let engine = QueryEngine::with_config(&g, EngineConfig::strict());
        let plan = QueryBuilder::new()
            .exists("x")
            .filter("g.V(x).explode()")
            .build()
            .expect("plan");
        let err = engine.decide(&plan).unwrap_err();
        assert_eq!(err.code(), "Expression");
    }

    #[test]
    fn power_set_limit_surfaces_through_decide() {
        let g = knows_cycle();
        let config = EngineConfig {
            max_power_set_vertices: 2,
            ..EngineConfig::default()
        };
        let engine = QueryEngine::with_config(&g, config);
        let plan = QueryBuilder::new()
            .exists_set("s")
            .filter("true")
            .family(FamilySelector::PowerSet)
            .build()
            .expect("plan");
        let err = engine.decide(&plan).unwrap_err();
        assert_eq!(err.code(), "OverLimit");
    }
}
