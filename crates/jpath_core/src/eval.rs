//! Selection engine for parsed queries
//!
//! Queries are evaluated segment by segment. Each segment maps every input
//! node to the nodes its selectors produce, and the results are concatenated
//! in input order. Descendant segments visit a node before its children,
//! array elements in index order and object members in document order.

use crate::ast::{
    BasicExpr, Comparable, Comparison, FuncArg, FunctionCall, LogicalAnd, LogicalOr, Query,
    Segment, Selector, Slice,
};
use crate::compare::compare;
use crate::path::{LocatedNode, NormalizedPath, PathElement};
use crate::types::{PathValue, value_is_truthy};
use serde_json::Value;
use std::borrow::Cow;
use tracing::trace;

impl Query {
    /// Select the nodes of `doc` this query matches, in result order
    pub fn select<'a>(&self, doc: &'a Value) -> Vec<&'a Value> {
        self.select_from(doc, doc)
    }

    /// Like [`select`](Self::select), pairing each value with its normalized path
    pub fn select_located<'a>(&self, doc: &'a Value) -> Vec<LocatedNode<'a>> {
        let mut nodes = vec![LocatedNode {
            value: doc,
            path: NormalizedPath::root(),
        }];
        for segment in &self.segments {
            let mut next = Vec::new();
            for node in &nodes {
                segment.apply_located(node.value, &node.path, doc, &mut next);
            }
            trace!(%segment, selected = next.len(), "applied segment");
            nodes = next;
        }
        nodes
    }

    /// Evaluate with `@` bound to `current`; `$` queries ignore it
    pub(crate) fn select_from<'a>(&self, current: &'a Value, root: &'a Value) -> Vec<&'a Value> {
        let mut nodes = vec![if self.root { root } else { current }];
        for segment in &self.segments {
            if nodes.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for node in nodes {
                segment.apply(node, root, &mut next);
            }
            trace!(%segment, selected = next.len(), "applied segment");
            nodes = next;
        }
        nodes
    }
}

impl Segment {
    fn apply<'a>(&self, node: &'a Value, root: &'a Value, out: &mut Vec<&'a Value>) {
        for selector in &self.selectors {
            selector.select(node, root, out);
        }
        if self.descendant {
            match node {
                Value::Array(arr) => arr.iter().for_each(|child| self.apply(child, root, out)),
                Value::Object(map) => map.values().for_each(|child| self.apply(child, root, out)),
                _ => {}
            }
        }
    }

    fn apply_located<'a>(
        &self,
        node: &'a Value,
        path: &NormalizedPath,
        root: &'a Value,
        out: &mut Vec<LocatedNode<'a>>,
    ) {
        for selector in &self.selectors {
            selector.select_located(node, path, root, out);
        }
        if self.descendant {
            match node {
                Value::Array(arr) => {
                    for (i, child) in arr.iter().enumerate() {
                        self.apply_located(child, &path.child(i), root, out);
                    }
                }
                Value::Object(map) => {
                    for (key, child) in map {
                        self.apply_located(child, &path.child(key.as_str()), root, out);
                    }
                }
                _ => {}
            }
        }
    }
}

impl Selector {
    fn select<'a>(&self, node: &'a Value, root: &'a Value, out: &mut Vec<&'a Value>) {
        match (self, node) {
            (Selector::Name(name), Value::Object(map)) => out.extend(map.get(name)),
            (Selector::Index(index), Value::Array(arr)) => {
                out.extend(normalize_index(*index, arr.len()).and_then(|i| arr.get(i)));
            }
            (Selector::Wildcard, Value::Array(arr)) => out.extend(arr),
            (Selector::Wildcard, Value::Object(map)) => out.extend(map.values()),
            (Selector::Slice(slice), Value::Array(arr)) => {
                out.extend(slice.indices(arr.len()).into_iter().filter_map(|i| arr.get(i)));
            }
            (Selector::Filter(expr), Value::Array(arr)) => {
                out.extend(arr.iter().filter(|child| expr.test(child, root)));
            }
            (Selector::Filter(expr), Value::Object(map)) => {
                out.extend(map.values().filter(|child| expr.test(child, root)));
            }
            _ => {}
        }
    }

    fn select_located<'a>(
        &self,
        node: &'a Value,
        path: &NormalizedPath,
        root: &'a Value,
        out: &mut Vec<LocatedNode<'a>>,
    ) {
        let mut push = |value: &'a Value, element: PathElement| {
            out.push(LocatedNode {
                value,
                path: path.child(element),
            });
        };
        match (self, node) {
            (Selector::Name(name), Value::Object(map)) => {
                if let Some(value) = map.get(name) {
                    push(value, name.as_str().into());
                }
            }
            (Selector::Index(index), Value::Array(arr)) => {
                let found = normalize_index(*index, arr.len()).and_then(|i| Some((i, arr.get(i)?)));
                if let Some((i, value)) = found {
                    push(value, i.into());
                }
            }
            (Selector::Wildcard, Value::Array(arr)) => {
                arr.iter().enumerate().for_each(|(i, v)| push(v, i.into()));
            }
            (Selector::Wildcard, Value::Object(map)) => {
                map.iter().for_each(|(k, v)| push(v, k.as_str().into()));
            }
            (Selector::Slice(slice), Value::Array(arr)) => {
                for i in slice.indices(arr.len()) {
                    if let Some(value) = arr.get(i) {
                        push(value, i.into());
                    }
                }
            }
            (Selector::Filter(expr), Value::Array(arr)) => {
                for (i, child) in arr.iter().enumerate() {
                    if expr.test(child, root) {
                        push(child, i.into());
                    }
                }
            }
            (Selector::Filter(expr), Value::Object(map)) => {
                for (key, child) in map {
                    if expr.test(child, root) {
                        push(child, key.as_str().into());
                    }
                }
            }
            _ => {}
        }
    }
}

/// Negative indexes count back from the end; out of range is None
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    if index >= 0 {
        usize::try_from(index).ok().filter(|&i| i < len)
    } else {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        len.checked_sub(back)
    }
}

impl Slice {
    /// Array indexes selected from an array of length `len`, in selection order
    /// (RFC 9535 section 2.3.4.2.2)
    pub fn indices(&self, len: usize) -> Vec<usize> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Vec::new();
        }
        let len = i64::try_from(len).unwrap_or(i64::MAX);
        let normalize = |i: i64| if i >= 0 { i } else { len + i };
        let stride = usize::try_from(step.unsigned_abs()).unwrap_or(usize::MAX);

        let selected: Vec<i64> = if step > 0 {
            let lower = normalize(self.start.unwrap_or(0)).clamp(0, len);
            let upper = normalize(self.end.unwrap_or(len)).clamp(0, len);
            (lower..upper).step_by(stride).collect()
        } else {
            let upper = normalize(self.start.unwrap_or(len - 1)).clamp(-1, len - 1);
            let lower = normalize(self.end.unwrap_or(-len - 1)).clamp(-1, len - 1);
            ((lower + 1)..=upper).rev().step_by(stride).collect()
        };
        selected
            .into_iter()
            .filter_map(|i| usize::try_from(i).ok())
            .collect()
    }
}

impl LogicalOr {
    /// Evaluate the filter with `@` bound to `current`
    pub fn test(&self, current: &Value, root: &Value) -> bool {
        self.0.iter().any(|and| and.test(current, root))
    }
}

impl LogicalAnd {
    fn test(&self, current: &Value, root: &Value) -> bool {
        self.0.iter().all(|expr| expr.test(current, root))
    }
}

impl BasicExpr {
    fn test(&self, current: &Value, root: &Value) -> bool {
        match self {
            BasicExpr::Exists(query) => !query.select_from(current, root).is_empty(),
            BasicExpr::NotExists(query) => query.select_from(current, root).is_empty(),
            BasicExpr::Comparison(comparison) => comparison.test(current, root),
            BasicExpr::Function(call) => call.evaluate(current, root).is_truthy(),
            BasicExpr::NotFunction(call) => !call.evaluate(current, root).is_truthy(),
            BasicExpr::Paren(expr) => expr.test(current, root),
            BasicExpr::NotParen(expr) => !expr.test(current, root),
            BasicExpr::Literal(value) => value_is_truthy(value),
        }
    }
}

impl Comparison {
    fn test(&self, current: &Value, root: &Value) -> bool {
        let left = self.left.evaluate(current, root);
        let right = self.right.evaluate(current, root);
        compare(left.as_deref(), self.op, right.as_deref())
    }
}

impl Comparable {
    fn evaluate<'a>(&'a self, current: &'a Value, root: &'a Value) -> Option<Cow<'a, Value>> {
        match self {
            Comparable::Literal(value) => Some(Cow::Borrowed(value)),
            Comparable::Query(query) => query
                .select_from(current, root)
                .into_iter()
                .next()
                .map(Cow::Borrowed),
            Comparable::Function(call) => call.evaluate(current, root).into_value(),
        }
    }
}

impl FunctionCall {
    pub(crate) fn evaluate<'a>(&'a self, current: &'a Value, root: &'a Value) -> PathValue<'a> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.evaluate(current, root))
            .collect();
        self.function.evaluate(args)
    }
}

impl FuncArg {
    fn evaluate<'a>(&'a self, current: &'a Value, root: &'a Value) -> PathValue<'a> {
        match self {
            FuncArg::Literal(value) => PathValue::Value(Some(Cow::Borrowed(value))),
            FuncArg::Query(query) => PathValue::Nodes(
                query
                    .select_from(current, root)
                    .into_iter()
                    .map(Cow::Borrowed)
                    .collect(),
            ),
            FuncArg::Function(call) => call.evaluate(current, root),
            FuncArg::Logical(expr) => PathValue::Logical(expr.test(current, root)),
        }
    }
}
