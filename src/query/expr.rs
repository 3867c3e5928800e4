//! Boolean composer over traversal subexpressions.
//!
//! The composer owns `||`, `&&`, `!`, grouping parentheses, and comparisons;
//! only operator-free fragments reach the traversal interpreter. Grouping
//! parentheses are told apart from call parentheses by one rule: a `(` whose
//! preceding character is alphanumeric belongs to a call. Groups are
//! resolved rightmost-first by splicing the literal `true`/`false` back into
//! the expression text.

use tracing::warn;

use crate::error::{MonacError, Result};
use crate::graph::GraphStore;
use crate::query::env::Env;
use crate::query::traversal::{self, TraversalScope};
use crate::query::value::Value;

pub(crate) struct ExprEvaluator<'g, G: GraphStore> {
    scope: TraversalScope<'g, G>,
    catch_errors: bool,
}

impl<'g, G: GraphStore> ExprEvaluator<'g, G> {
    pub(crate) fn new(scope: TraversalScope<'g, G>, catch_errors: bool) -> Self {
        Self {
            scope,
            catch_errors,
        }
    }

    /// Evaluates a filter body to its truth value.
    pub(crate) fn eval_truth(&self, env: &Env, expr: &str) -> Result<bool> {
        self.eval_bool(env, expr.trim())
    }

    /// Evaluates a filter body to a [`Value`]. Expressions with boolean
    /// structure produce `Bool`; a plain traversal materializes its result,
    /// or `Null` when it fails under the recovering policy.
    pub(crate) fn evaluate(&self, env: &Env, expr: &str) -> Result<Value> {
        let expr = expr.trim();
        if self.has_boolean_structure(expr) {
            return Ok(Value::Bool(self.eval_bool(env, expr)?));
        }
        match traversal::evaluate_value(self.scope, env, expr) {
            Ok(value) => Ok(value),
            Err(err) => self.recover(expr, err).map(|_| Value::Null),
        }
    }

    fn has_boolean_structure(&self, expr: &str) -> bool {
        expr.eq_ignore_ascii_case("true")
            || expr.eq_ignore_ascii_case("false")
            || expr.starts_with('!')
            || split_top_level(expr, "||").len() > 1
            || split_top_level(expr, "&&").len() > 1
            || find_group_paren(expr).is_some()
            || find_comparison(expr).is_some()
    }

    fn eval_bool(&self, env: &Env, expr: &str) -> Result<bool> {
        let mut expr = expr.trim().to_owned();

        // Resolve grouping parentheses until none remain.
        loop {
            match self.resolve_group(env, &expr)? {
                Some(next) => expr = next,
                None => break,
            }
        }

        let or_parts = split_top_level(&expr, "||");
        if or_parts.len() > 1 {
            for part in or_parts {
                if self.eval_bool(env, part.trim())? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }

        let and_parts = split_top_level(&expr, "&&");
        if and_parts.len() > 1 {
            for part in and_parts {
                if !self.eval_bool(env, part.trim())? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        let trimmed = expr.trim();
        if let Some(inner) = trimmed.strip_prefix('!') {
            return Ok(!self.eval_bool(env, inner.trim())?);
        }

        self.eval_basic(env, trimmed)
    }

    /// Replaces the rightmost grouping parenthesis with its truth value.
    fn resolve_group(&self, env: &Env, expr: &str) -> Result<Option<String>> {
        let Some(open) = find_group_paren(expr) else {
            return Ok(None);
        };
        let bytes = expr.as_bytes();
        let mut depth = 0usize;
        let mut close = None;
        for (i, &b) in bytes.iter().enumerate().skip(open + 1) {
            match b {
                b'(' => depth += 1,
                b')' => {
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        // An unmatched group parenthesis falls through to the traversal
        // parser, which reports it.
        let Some(close) = close else {
            return Ok(None);
        };

        let inner = &expr[open + 1..close];
        let value = self.eval_bool(env, inner)?;
        let mut next = String::with_capacity(expr.len());
        next.push_str(&expr[..open]);
        next.push_str(if value { "true" } else { "false" });
        next.push_str(&expr[close + 1..]);
        Ok(Some(next))
    }

    fn eval_basic(&self, env: &Env, expr: &str) -> Result<bool> {
        if expr.eq_ignore_ascii_case("true") {
            return Ok(true);
        }
        if expr.eq_ignore_ascii_case("false") {
            return Ok(false);
        }

        if let Some((pos, op)) = find_comparison(expr) {
            let lhs = &expr[..pos];
            let rhs = &expr[pos + op.len()..];
            return match self.compare(env, expr, lhs.trim(), rhs.trim(), op) {
                Ok(outcome) => Ok(outcome),
                Err(err) => self.recover(expr, err),
            };
        }

        match traversal::evaluate_truthy(self.scope, env, expr) {
            Ok(outcome) => Ok(outcome),
            Err(err) => self.recover(expr, err),
        }
    }

    fn compare(
        &self,
        env: &Env,
        whole: &str,
        lhs: &str,
        rhs: &str,
        op: &str,
    ) -> Result<bool> {
        let left = unwrap_single(traversal::evaluate_value(self.scope, env, lhs)?);
        let right = unwrap_single(traversal::evaluate_value(self.scope, env, rhs)?);
        match op {
            "==" => Ok(left.loose_eq(&right)),
            "!=" => Ok(!left.loose_eq(&right)),
            _ => {
                let ordering = left.partial_cmp_value(&right).ok_or_else(|| {
                    MonacError::expression(whole, "operands of an ordering comparison must share a type")
                })?;
                Ok(match op {
                    "<" => ordering.is_lt(),
                    "<=" => ordering.is_le(),
                    ">" => ordering.is_gt(),
                    _ => ordering.is_ge(),
                })
            }
        }
    }

    /// Recovering policy: failed subexpressions coerce to false and are
    /// reported on the warn channel; strict mode propagates.
    fn recover(&self, expr: &str, err: MonacError) -> Result<bool> {
        if matches!(err, MonacError::Cancelled) {
            return Err(err);
        }
        if self.catch_errors {
            warn!(expression = expr, cause = %err, "filter subexpression failed, coerced to false");
            return Ok(false);
        }
        match err {
            already @ MonacError::Expression { .. } => Err(already),
            other => Err(MonacError::expression(expr, other.to_string())),
        }
    }
}

/// Splits at parenthesis depth zero on `op`, returning the whole expression
/// as a single part when the operator never occurs.
fn split_top_level<'e>(expr: &'e str, op: &str) -> Vec<&'e str> {
    let bytes = expr.as_bytes();
    let op_bytes = op.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut last_split = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            _ if depth == 0 && bytes[i..].starts_with(op_bytes) => {
                parts.push(&expr[last_split..i]);
                i += op_bytes.len();
                last_split = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    if last_split < expr.len() {
        parts.push(&expr[last_split..]);
    }
    if parts.is_empty() {
        parts.push(expr);
    }
    parts
}

/// The rightmost `(` that opens a group: its preceding character is not
/// alphanumeric (a call parenthesis follows an identifier).
fn find_group_paren(expr: &str) -> Option<usize> {
    let bytes = expr.as_bytes();
    for i in (0..bytes.len()).rev() {
        if bytes[i] != b'(' {
            continue;
        }
        if i == 0 || !bytes[i - 1].is_ascii_alphanumeric() {
            return Some(i);
        }
    }
    None
}

/// Leftmost depth-zero comparison operator, two-character forms first.
fn find_comparison(expr: &str) -> Option<(usize, &'static str)> {
    let bytes = expr.as_bytes();
    let mut depth = 0usize;
    for i in 0..bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => {
                for op in ["==", "!=", "<=", ">="] {
                    if bytes[i..].starts_with(op.as_bytes()) {
                        return Some((i, op));
                    }
                }
                if bytes[i] == b'<' {
                    return Some((i, "<"));
                }
                if bytes[i] == b'>' {
                    return Some((i, ">"));
                }
            }
            _ => {}
        }
    }
    None
}

fn unwrap_single(value: Value) -> Value {
    match value {
        Value::Vertices(ref items) if items.len() == 1 => Value::Vertex(items[0]),
        Value::List(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphStore, MemoryGraph};
    use crate::model::{VertexId, VertexSet};
    use crate::query::env::Binding;

    struct Fixture {
        graph: MemoryGraph,
        snapshot: Vec<VertexId>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut graph = MemoryGraph::new();
            let a = graph.add_vertex("person");
            let b = graph.add_vertex("person");
            graph.add_edge(a, b, "knows").expect("a->b");
            let snapshot = graph.vertex_ids().expect("ids");
            Self { graph, snapshot }
        }

        fn truth(&self, env: &Env, expr: &str) -> bool {
            self.truth_with(env, expr, true).expect("evaluate")
        }

        fn truth_with(&self, env: &Env, expr: &str, catch: bool) -> Result<bool> {
            let scope = TraversalScope {
                graph: &self.graph,
                snapshot: &self.snapshot,
            };
            ExprEvaluator::new(scope, catch).eval_truth(env, expr)
        }
    }

    #[test]
    fn constants_and_negation() {
        let f = Fixture::new();
        let env = Env::new();
        assert!(f.truth(&env, "true"));
        assert!(!f.truth(&env, "false"));
        assert!(f.truth(&env, "!false"));
        assert!(f.truth(&env, "!!true"));
    }

    #[test]
    fn disjunction_short_circuits_past_bad_operands() {
        let f = Fixture::new();
        let env = Env::new();
        // The second operand would error; it is never reached.
        assert!(f.truth(&env, "true || g.V().explode()"));
        assert!(!f.truth(&env, "false && g.V().explode()"));
    }

    #[test]
    fn group_parens_resolve_before_operators() {
        let f = Fixture::new();
        let env = Env::new();
        assert!(f.truth(&env, "(true || false) && true"));
        assert!(!f.truth(&env, "((true || false) && false)"));
        assert!(f.truth(&env, "!(false && true)"));
    }

    #[test]
    fn call_parens_are_not_groups() {
        let f = Fixture::new();
        let mut env = Env::new();
        env.push("x", Binding::Vertex(VertexId(1)));
        env.push("y", Binding::Vertex(VertexId(2)));
        assert!(f.truth(&env, "g.V(x).out(\"knows\").is(y) || g.V(y).is(x)"));
        assert!(!f.truth(&env, "g.V(y).out(\"knows\").is(x) || g.V(y).is(x)"));
    }

    #[test]
    fn comparisons_on_counts_and_literals() {
        let f = Fixture::new();
        let env = Env::new();
        assert!(f.truth(&env, "g.V().count() == 2"));
        assert!(f.truth(&env, "g.V().count() > 1"));
        assert!(!f.truth(&env, "g.V().count() >= 3"));
        assert!(f.truth(&env, "g.E().count() != 0"));
        assert!(f.truth(&env, "1 < 2"));
    }

    #[test]
    fn subset_size_comparison() {
        let f = Fixture::new();
        let mut env = Env::new();
        env.push(
            "s",
            Binding::Subset(VertexSet::from([VertexId(1), VertexId(2)])),
        );
        assert!(f.truth(&env, "g.V(s).count() > 1"));
        assert!(!f.truth(&env, "g.V(s).count() > 2"));
    }

    #[test]
    fn errors_coerce_to_false_by_default() {
        let f = Fixture::new();
        let env = Env::new();
        assert!(!f.truth(&env, "g.V().explode()"));
        assert!(!f.truth(&env, "g.V(unbound)"));
        // Type-mismatched ordering comparison recovers too.
        assert!(!f.truth(&env, "g.V().label() > 1"));
    }

    #[test]
    fn strict_mode_propagates_errors() {
        let f = Fixture::new();
        let env = Env::new();
        let err = f.truth_with(&env, "g.V().explode()", false).unwrap_err();
        assert_eq!(err.code(), "Expression");
    }

    #[test]
    fn value_evaluation_distinguishes_shapes() {
        let f = Fixture::new();
        let env = Env::new();
        let scope = TraversalScope {
            graph: &f.graph,
            snapshot: &f.snapshot,
        };
        let evaluator = ExprEvaluator::new(scope, true);
        assert_eq!(
            evaluator.evaluate(&env, "true && true").expect("bool"),
            Value::Bool(true)
        );
        assert_eq!(
            evaluator.evaluate(&env, "g.V().count()").expect("count"),
            Value::Int(2)
        );
        assert_eq!(
            evaluator.evaluate(&env, "g.V().explode()").expect("recovered"),
            Value::Null
        );
    }

    #[test]
    fn whitespace_is_tolerated() {
        let f = Fixture::new();
        let env = Env::new();
        assert!(f.truth(&env, "  ( true )  &&  ! false "));
    }
}
