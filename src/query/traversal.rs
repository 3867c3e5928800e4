//! Pull-based interpreter for the first-order traversal sublanguage.
//!
//! A filter body like `g.V(x).out("knows").is(y)` is parsed into an anchor
//! plus a step chain and evaluated as a lazy element stream, so truthiness
//! checks pull at most one element and `count()` terminates a chain with a
//! scalar.

use crate::error::{MonacError, Result};
use crate::graph::GraphStore;
use crate::model::{Edge, EdgeId, Vertex, VertexId};
use crate::query::env::{Binding, Env};
use crate::query::value::Value;

/// Read scope for one evaluation: the store plus the query-start vertex
/// snapshot that `V()` ranges over.
pub(crate) struct TraversalScope<'g, G: GraphStore> {
    pub(crate) graph: &'g G,
    pub(crate) snapshot: &'g [VertexId],
}

impl<'g, G: GraphStore> Clone for TraversalScope<'g, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'g, G: GraphStore> Copy for TraversalScope<'g, G> {}

/// Evaluates a traversal expression to its truth value, pulling at most one
/// element from a stream result.
pub(crate) fn evaluate_truthy<G: GraphStore>(
    scope: TraversalScope<'_, G>,
    env: &Env,
    expr: &str,
) -> Result<bool> {
    let chain = parse_chain(expr)?;
    match eval_chain(scope, env, &chain)? {
        Outcome::Scalar(value) => Ok(value.truthy()),
        Outcome::Stream(mut stream) => match stream.next() {
            Some(Ok(_)) => Ok(true),
            Some(Err(err)) => Err(err),
            None => Ok(false),
        },
    }
}

/// Evaluates a traversal expression and materializes the result.
pub(crate) fn evaluate_value<G: GraphStore>(
    scope: TraversalScope<'_, G>,
    env: &Env,
    expr: &str,
) -> Result<Value> {
    let chain = parse_chain(expr)?;
    match eval_chain(scope, env, &chain)? {
        Outcome::Scalar(value) => Ok(value),
        Outcome::Stream(stream) => {
            let mut vertices = Vec::new();
            let mut scalars = Vec::new();
            for item in stream {
                match item? {
                    Elem::V(v) => vertices.push(v),
                    Elem::E { id, .. } => scalars.push(Value::Int(id.0 as i64)),
                    Elem::Val(value) => scalars.push(value),
                }
            }
            if !vertices.is_empty() {
                Ok(Value::Vertices(vertices))
            } else if !scalars.is_empty() {
                Ok(Value::List(scalars))
            } else {
                Ok(Value::List(Vec::new()))
            }
        }
    }
}

/// One element flowing through a step pipeline. Edges remember the vertex
/// they were reached from so `otherV` can pick the far endpoint.
#[derive(Clone, Debug)]
enum Elem {
    V(VertexId),
    E { id: EdgeId, from: Option<VertexId> },
    Val(Value),
}

type ElemIter<'g> = Box<dyn Iterator<Item = Result<Elem>> + 'g>;

enum Outcome<'g> {
    Scalar(Value),
    Stream(ElemIter<'g>),
}

#[derive(Debug, PartialEq)]
enum Anchor {
    /// `V()`: every vertex of the query-start snapshot.
    AllVertices,
    /// `E()`: every edge.
    AllEdges,
    /// `V(x)`: the binding of `x`, one vertex or every member of a subset.
    BoundVar(String),
    /// A bare variable reference.
    Var(String),
    /// A literal operand (number, string, bool, null).
    Literal(Value),
}

#[derive(Debug, PartialEq)]
enum Arg {
    Str(String),
    Ident(String),
    Num(Value),
}

#[derive(Debug, PartialEq)]
struct StepCall {
    name: String,
    args: Vec<Arg>,
}

#[derive(Debug, PartialEq)]
struct Chain {
    anchor: Anchor,
    steps: Vec<StepCall>,
}

fn step_error(step: &str, reason: impl Into<String>) -> MonacError {
    MonacError::expression(step, reason)
}

fn require_vertex<'g, G: GraphStore>(graph: &'g G, v: VertexId) -> Result<&'g Vertex> {
    graph
        .vertex(v)?
        .ok_or_else(|| MonacError::Storage(format!("vertex {v} not found")))
}

fn require_edge<'g, G: GraphStore>(graph: &'g G, e: EdgeId) -> Result<&'g Edge> {
    graph
        .edge(e)?
        .ok_or_else(|| MonacError::Storage(format!("edge {e} not found")))
}

fn flat_map_elems<'g, F>(input: ElemIter<'g>, f: F) -> ElemIter<'g>
where
    F: Fn(Elem) -> Result<Vec<Elem>> + 'g,
{
    Box::new(input.flat_map(move |item| {
        let expanded = match item.and_then(|elem| f(elem)) {
            Ok(elems) => elems.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(err) => vec![Err(err)],
        };
        expanded.into_iter()
    }))
}

fn binding_elems(binding: &Binding) -> Vec<Elem> {
    match binding {
        Binding::Vertex(v) => vec![Elem::V(*v)],
        Binding::Subset(set) => set.iter().map(|&v| Elem::V(v)).collect(),
    }
}

fn eval_chain<'g, G: GraphStore>(
    scope: TraversalScope<'g, G>,
    env: &Env,
    chain: &Chain,
) -> Result<Outcome<'g>> {
    let graph = scope.graph;

    let mut stream: ElemIter<'g> = match &chain.anchor {
        Anchor::AllVertices => Box::new(scope.snapshot.iter().map(|&v| Ok(Elem::V(v)))),
        Anchor::AllEdges => {
            let ids = graph.edge_ids()?;
            Box::new(ids.into_iter().map(|id| Ok(Elem::E { id, from: None })))
        }
        Anchor::BoundVar(name) | Anchor::Var(name) => {
            let binding = env
                .get(name)
                .ok_or_else(|| step_error(name, format!("unknown variable '{name}'")))?;
            if matches!(chain.anchor, Anchor::Var(_)) && chain.steps.is_empty() {
                // A bare variable evaluates to its binding.
                return Ok(Outcome::Scalar(match binding {
                    Binding::Vertex(v) => Value::Vertex(*v),
                    Binding::Subset(set) => Value::Vertices(set.iter().copied().collect()),
                }));
            }
            Box::new(binding_elems(binding).into_iter().map(Ok))
        }
        Anchor::Literal(value) => {
            if !chain.steps.is_empty() {
                return Err(step_error(&chain.steps[0].name, "cannot step from a literal"));
            }
            return Ok(Outcome::Scalar(value.clone()));
        }
    };

    for (index, step) in chain.steps.iter().enumerate() {
        match step.name.as_str() {
            "out" | "in" | "both" => {
                let label = step.optional_label()?;
                let direction = step.name.clone();
                stream = flat_map_elems(stream, move |elem| match elem {
                    Elem::V(v) => {
                        let neighbors = match direction.as_str() {
                            "out" => graph.out_neighbors(v, label.as_deref())?,
                            "in" => graph.in_neighbors(v, label.as_deref())?,
                            _ => graph.both_neighbors(v, label.as_deref())?,
                        };
                        Ok(neighbors.into_iter().map(Elem::V).collect())
                    }
                    _ => Err(step_error(&direction, "applies to vertices")),
                });
            }
            "outE" | "inE" | "bothE" => {
                let label = step.optional_label()?;
                let direction = step.name.clone();
                stream = flat_map_elems(stream, move |elem| match elem {
                    Elem::V(v) => {
                        let mut edges = Vec::new();
                        if direction != "inE" {
                            edges.extend(graph.out_edges(v, label.as_deref())?);
                        }
                        if direction != "outE" {
                            edges.extend(graph.in_edges(v, label.as_deref())?);
                        }
                        Ok(edges
                            .into_iter()
                            .map(|id| Elem::E { id, from: Some(v) })
                            .collect())
                    }
                    _ => Err(step_error(&direction, "applies to vertices")),
                });
            }
            "outV" | "inV" | "otherV" => {
                let which = step.name.clone();
                step.expect_no_args()?;
                stream = flat_map_elems(stream, move |elem| match elem {
                    Elem::E { id, from } => {
                        let edge = require_edge(graph, id)?;
                        let endpoint = match which.as_str() {
                            "outV" => edge.source,
                            "inV" => edge.target,
                            _ => match from {
                                Some(v) if v == edge.source => edge.target,
                                Some(_) => edge.source,
                                None => {
                                    return Err(step_error(
                                        "otherV",
                                        "requires an incident vertex on the path",
                                    ))
                                }
                            },
                        };
                        Ok(vec![Elem::V(endpoint)])
                    }
                    _ => Err(step_error(&which, "applies to edges")),
                });
            }
            "has" => {
                let (key, literal) = step.key_value_args()?;
                stream = flat_map_elems(stream, move |elem| {
                    let attr = match &elem {
                        Elem::V(v) => graph.vertex_attr(*v, &key)?.map(Value::from),
                        Elem::E { id, .. } => graph.edge_attr(*id, &key)?.map(Value::from),
                        Elem::Val(_) => {
                            return Err(step_error("has", "applies to vertices or edges"))
                        }
                    };
                    Ok(match attr {
                        Some(value) if value.loose_eq(&literal) => vec![elem],
                        _ => Vec::new(),
                    })
                });
            }
            "hasLabel" => {
                let wanted = step.single_string_arg()?;
                stream = flat_map_elems(stream, move |elem| {
                    let label = match &elem {
                        Elem::V(v) => require_vertex(graph, *v)?.label.clone(),
                        Elem::E { id, .. } => require_edge(graph, *id)?.label.clone(),
                        Elem::Val(_) => {
                            return Err(step_error("hasLabel", "applies to vertices or edges"))
                        }
                    };
                    Ok(if label == wanted { vec![elem] } else { Vec::new() })
                });
            }
            "is" => {
                let var = step.single_ident_arg()?;
                let target = env
                    .get(&var)
                    .ok_or_else(|| step_error("is", format!("unknown variable '{var}'")))?
                    .clone();
                stream = flat_map_elems(stream, move |elem| match (&elem, &target) {
                    (Elem::V(v), Binding::Vertex(bound)) => {
                        Ok(if v == bound { vec![elem] } else { Vec::new() })
                    }
                    (Elem::V(v), Binding::Subset(set)) => {
                        Ok(if set.contains(v) { vec![elem] } else { Vec::new() })
                    }
                    _ => Err(step_error("is", "applies to vertices")),
                });
            }
            "values" => {
                let key = step.single_string_arg()?;
                stream = flat_map_elems(stream, move |elem| {
                    let attr = match &elem {
                        Elem::V(v) => graph.vertex_attr(*v, &key)?.map(Value::from),
                        Elem::E { id, .. } => graph.edge_attr(*id, &key)?.map(Value::from),
                        Elem::Val(_) => {
                            return Err(step_error("values", "applies to vertices or edges"))
                        }
                    };
                    Ok(attr.map(Elem::Val).into_iter().collect())
                });
            }
            "id" => {
                step.expect_no_args()?;
                stream = flat_map_elems(stream, |elem| match elem {
                    Elem::V(v) => Ok(vec![Elem::Val(Value::Int(v.0 as i64))]),
                    Elem::E { id, .. } => Ok(vec![Elem::Val(Value::Int(id.0 as i64))]),
                    Elem::Val(_) => Err(step_error("id", "applies to vertices or edges")),
                });
            }
            "label" => {
                step.expect_no_args()?;
                stream = flat_map_elems(stream, move |elem| match elem {
                    Elem::V(v) => Ok(vec![Elem::Val(Value::String(
                        require_vertex(graph, v)?.label.clone(),
                    ))]),
                    Elem::E { id, .. } => Ok(vec![Elem::Val(Value::String(
                        require_edge(graph, id)?.label.clone(),
                    ))]),
                    Elem::Val(_) => Err(step_error("label", "applies to vertices or edges")),
                });
            }
            "count" => {
                step.expect_no_args()?;
                if index + 1 != chain.steps.len() {
                    return Err(step_error("count", "terminates a chain"));
                }
                let mut total: i64 = 0;
                for item in stream {
                    item?;
                    total += 1;
                }
                return Ok(Outcome::Scalar(Value::Int(total)));
            }
            other => return Err(step_error(other, format!("unknown step '{other}'"))),
        }
    }

    Ok(Outcome::Stream(stream))
}

impl StepCall {
    fn optional_label(&self) -> Result<Option<String>> {
        match self.args.as_slice() {
            [] => Ok(None),
            [Arg::Str(label)] => Ok(Some(label.clone())),
            _ => Err(step_error(&self.name, "takes at most one label string")),
        }
    }

    fn single_string_arg(&self) -> Result<String> {
        match self.args.as_slice() {
            [Arg::Str(value)] => Ok(value.clone()),
            _ => Err(step_error(&self.name, "takes exactly one string argument")),
        }
    }

    fn single_ident_arg(&self) -> Result<String> {
        match self.args.as_slice() {
            [Arg::Ident(name)] => Ok(name.clone()),
            _ => Err(step_error(&self.name, "takes exactly one variable name")),
        }
    }

    fn key_value_args(&self) -> Result<(String, Value)> {
        match self.args.as_slice() {
            [Arg::Str(key), value] => {
                let literal = match value {
                    Arg::Str(s) => Value::String(s.clone()),
                    Arg::Num(n) => n.clone(),
                    Arg::Ident(word) => match word.as_str() {
                        "true" => Value::Bool(true),
                        "false" => Value::Bool(false),
                        "null" => Value::Null,
                        _ => {
                            return Err(step_error(
                                &self.name,
                                "value must be a string, number, bool, or null literal",
                            ))
                        }
                    },
                };
                Ok((key.clone(), literal))
            }
            _ => Err(step_error(&self.name, "takes a key string and a literal value")),
        }
    }

    fn expect_no_args(&self) -> Result<()> {
        if self.args.is_empty() {
            Ok(())
        } else {
            Err(step_error(&self.name, "takes no arguments"))
        }
    }
}

struct Scanner<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Scanner<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(MonacError::expression(
                self.src,
                format!("expected '{expected}' at offset {}", self.pos),
            ))
        }
    }

    fn ident(&mut self) -> Option<&'s str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                self.bump();
            }
            _ => return None,
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        Some(&self.src[start..self.pos])
    }

    fn string_lit(&mut self) -> Result<String> {
        let quote = self.bump().unwrap_or('"');
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let text = self.src[start..self.pos].to_owned();
                self.bump();
                return Ok(text);
            }
            self.bump();
        }
        Err(MonacError::expression(self.src, "unterminated string literal"))
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let mut is_float = false;
        if self.peek() == Some('.')
            && self.rest()[1..].chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = &self.src[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|e| MonacError::expression(self.src, format!("bad float literal: {e}")))
        } else {
            text.parse::<i64>()
                .map(Value::Int)
                .map_err(|e| MonacError::expression(self.src, format!("bad integer literal: {e}")))
        }
    }

    fn at_end(&mut self) -> bool {
        self.eat_ws();
        self.peek().is_none()
    }
}

fn parse_chain(expr: &str) -> Result<Chain> {
    let mut s = Scanner::new(expr.trim());
    s.eat_ws();

    match s.peek() {
        Some('"') | Some('\'') => {
            let lit = s.string_lit()?;
            if !s.at_end() {
                return Err(MonacError::expression(expr, "trailing input after string"));
            }
            return Ok(Chain {
                anchor: Anchor::Literal(Value::String(lit)),
                steps: Vec::new(),
            });
        }
        Some(c) if c.is_ascii_digit() || c == '-' => {
            let num = s.number()?;
            if !s.at_end() {
                return Err(MonacError::expression(expr, "trailing input after number"));
            }
            return Ok(Chain {
                anchor: Anchor::Literal(num),
                steps: Vec::new(),
            });
        }
        _ => {}
    }

    let first = s
        .ident()
        .ok_or_else(|| MonacError::expression(expr, "expected a traversal or variable"))?;

    // `g.` is the conventional traversal-source prefix; it only carries the
    // anchor that follows it.
    let anchor_name = if first == "g" && s.peek() == Some('.') {
        s.bump();
        s.ident()
            .ok_or_else(|| MonacError::expression(expr, "expected an anchor after 'g.'"))?
    } else {
        first
    };

    let anchor = if s.peek() == Some('(') {
        s.bump();
        s.eat_ws();
        match anchor_name {
            "V" => {
                if s.eat(')') {
                    Anchor::AllVertices
                } else {
                    let var = s
                        .ident()
                        .ok_or_else(|| MonacError::expression(expr, "expected a variable in V()"))?
                        .to_owned();
                    s.eat_ws();
                    s.expect(')')?;
                    Anchor::BoundVar(var)
                }
            }
            "E" => {
                s.expect(')')?;
                Anchor::AllEdges
            }
            other => {
                return Err(MonacError::expression(
                    expr,
                    format!("unknown anchor '{other}'"),
                ))
            }
        }
    } else {
        match anchor_name {
            "true" => Anchor::Literal(Value::Bool(true)),
            "false" => Anchor::Literal(Value::Bool(false)),
            "null" => Anchor::Literal(Value::Null),
            name => Anchor::Var(name.to_owned()),
        }
    };

    let mut steps = Vec::new();
    loop {
        s.eat_ws();
        if !s.eat('.') {
            break;
        }
        let name = s
            .ident()
            .ok_or_else(|| MonacError::expression(expr, "expected a step name after '.'"))?
            .to_owned();
        let mut args = Vec::new();
        s.eat_ws();
        if s.eat('(') {
            s.eat_ws();
            if !s.eat(')') {
                loop {
                    s.eat_ws();
                    let arg = match s.peek() {
                        Some('"') | Some('\'') => Arg::Str(s.string_lit()?),
                        Some(c) if c.is_ascii_digit() || c == '-' => Arg::Num(s.number()?),
                        _ => {
                            let ident = s.ident().ok_or_else(|| {
                                MonacError::expression(expr, format!("bad argument to '{name}'"))
                            })?;
                            Arg::Ident(ident.to_owned())
                        }
                    };
                    args.push(arg);
                    s.eat_ws();
                    if s.eat(',') {
                        continue;
                    }
                    s.expect(')')?;
                    break;
                }
            }
        }
        steps.push(StepCall { name, args });
    }

    if !s.at_end() {
        return Err(MonacError::expression(
            expr,
            format!("trailing input at offset {}", s.pos),
        ));
    }

    Ok(Chain { anchor, steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::model::VertexSet;

    fn sample() -> (MemoryGraph, Vec<VertexId>) {
        let mut g = MemoryGraph::new();
        let a = g.add_vertex("person");
        let b = g.add_vertex("person");
        let c = g.add_vertex("robot");
        g.set_vertex_property(a, "name", "alice").expect("prop");
        g.set_vertex_property(b, "name", "bob").expect("prop");
        g.set_vertex_property(a, "age", 31i64).expect("prop");
        g.add_edge(a, b, "knows").expect("a->b");
        g.add_edge(b, c, "owns").expect("b->c");
        let snapshot = g.vertex_ids().expect("ids");
        (g, snapshot)
    }

    fn truthy(g: &MemoryGraph, snapshot: &[VertexId], env: &Env, expr: &str) -> bool {
        let scope = TraversalScope { graph: g, snapshot };
        evaluate_truthy(scope, env, expr).expect("evaluate")
    }

    fn value(g: &MemoryGraph, snapshot: &[VertexId], env: &Env, expr: &str) -> Value {
        let scope = TraversalScope { graph: g, snapshot };
        evaluate_value(scope, env, expr).expect("evaluate")
    }

    #[test]
    fn anchors_and_basic_steps() {
        let (g, snapshot) = sample();
        let env = Env::new();
        assert_eq!(
            value(&g, &snapshot, &env, "g.V().count()"),
            Value::Int(3)
        );
        assert_eq!(value(&g, &snapshot, &env, "g.E().count()"), Value::Int(2));
        assert_eq!(
            value(&g, &snapshot, &env, "g.V().hasLabel(\"person\").count()"),
            Value::Int(2)
        );
        assert_eq!(
            value(&g, &snapshot, &env, "g.V().out(\"knows\").count()"),
            Value::Int(1)
        );
    }

    #[test]
    fn bound_variable_anchors() {
        let (g, snapshot) = sample();
        let mut env = Env::new();
        env.push("x", Binding::Vertex(VertexId(1)));
        env.push("s", Binding::Subset(VertexSet::from([VertexId(1), VertexId(2)])));

        assert_eq!(
            value(&g, &snapshot, &env, "g.V(x).out().count()"),
            Value::Int(1)
        );
        assert_eq!(value(&g, &snapshot, &env, "g.V(s).count()"), Value::Int(2));
        assert_eq!(value(&g, &snapshot, &env, "x"), Value::Vertex(VertexId(1)));
        assert_eq!(
            value(&g, &snapshot, &env, "s"),
            Value::Vertices(vec![VertexId(1), VertexId(2)])
        );
    }

    #[test]
    fn is_step_matches_vertex_and_subset_bindings() {
        let (g, snapshot) = sample();
        let mut env = Env::new();
        env.push("x", Binding::Vertex(VertexId(1)));
        env.push("y", Binding::Vertex(VertexId(2)));
        env.push("s", Binding::Subset(VertexSet::from([VertexId(3)])));

        assert!(truthy(&g, &snapshot, &env, "g.V(x).out(\"knows\").is(y)"));
        assert!(!truthy(&g, &snapshot, &env, "g.V(y).out(\"knows\").is(x)"));
        // Membership against a subset binding.
        assert!(truthy(&g, &snapshot, &env, "g.V(y).out(\"owns\").is(s)"));
    }

    #[test]
    fn has_and_values_read_attributes() {
        let (g, snapshot) = sample();
        let env = Env::new();
        assert!(truthy(&g, &snapshot, &env, "g.V().has(\"name\", \"alice\")"));
        assert!(!truthy(&g, &snapshot, &env, "g.V().has(\"name\", \"mallory\")"));
        assert!(truthy(&g, &snapshot, &env, "g.V().has(\"age\", 31)"));
        assert_eq!(
            value(&g, &snapshot, &env, "g.V().values(\"name\")"),
            Value::List(vec![
                Value::String("alice".into()),
                Value::String("bob".into())
            ])
        );
    }

    #[test]
    fn edge_steps_and_other_v() {
        let (g, snapshot) = sample();
        let mut env = Env::new();
        env.push("b", Binding::Vertex(VertexId(2)));

        // b has one incoming and one outgoing edge.
        assert_eq!(
            value(&g, &snapshot, &env, "g.V(b).bothE().count()"),
            Value::Int(2)
        );
        // otherV from b's incident edges reaches both far endpoints.
        assert_eq!(
            value(&g, &snapshot, &env, "g.V(b).bothE().otherV().count()"),
            Value::Int(2)
        );
        assert_eq!(
            value(&g, &snapshot, &env, "g.V(b).outE().inV().count()"),
            Value::Int(1)
        );
    }

    #[test]
    fn empty_stream_is_falsy() {
        let (g, snapshot) = sample();
        let env = Env::new();
        assert!(!truthy(&g, &snapshot, &env, "g.V().hasLabel(\"ghost\")"));
        assert!(!truthy(&g, &snapshot, &env, "g.V().out(\"owns\").out(\"owns\")"));
    }

    #[test]
    fn count_zero_is_falsy() {
        let (g, snapshot) = sample();
        let env = Env::new();
        assert!(!truthy(&g, &snapshot, &env, "g.V().hasLabel(\"ghost\").count()"));
        assert!(truthy(&g, &snapshot, &env, "g.V().count()"));
    }

    #[test]
    fn unknown_step_and_variable_error() {
        let (g, snapshot) = sample();
        let env = Env::new();
        let scope = TraversalScope { graph: &g, snapshot: &snapshot };
        assert!(evaluate_truthy(scope, &env, "g.V().teleport()").is_err());
        assert!(evaluate_truthy(scope, &env, "g.V(missing)").is_err());
        assert!(evaluate_truthy(scope, &env, "g.V().count().out()").is_err());
    }

    #[test]
    fn parser_handles_whitespace_and_quotes() {
        let chain = parse_chain(" g.V( x ).out( 'knows' ).is( y ) ").expect("parse");
        assert_eq!(chain.anchor, Anchor::BoundVar("x".into()));
        assert_eq!(chain.steps.len(), 2);
        assert_eq!(chain.steps[0].args, vec![Arg::Str("knows".into())]);
    }
}
