//! AST definitions for JSONPath queries (RFC 9535)
//!
//! Every node prints back in canonical form through `Display`, so a parsed
//! query can be logged or compared by text.

use crate::path::write_quoted;
use crate::registry::FunctionExtension;
use crate::types::{FuncType, PathType};
use serde_json::Value;
use std::fmt::{self, Write};
use std::sync::Arc;

/// A complete JSONPath query, or a filter query relative to `@`
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub segments: Vec<Segment>,
    /// `true` when the query starts at `$`, `false` for `@`
    pub root: bool,
}

/// A segment in a JSONPath query
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub selectors: Vec<Selector>,
    /// `..` segments visit the input node and all of its descendants
    pub descendant: bool,
}

/// A selector within a segment
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Name selector: `.key` or `['key']`
    Name(String),
    /// Index selector: `[0]` or `[-1]`
    Index(i64),
    /// Wildcard selector: `*` or `[*]`
    Wildcard,
    /// Array slice selector: `[start:end:step]`
    Slice(Slice),
    /// Filter selector: `[?expr]`
    Filter(LogicalOr),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub step: Option<i64>,
}

/// `a || b || ...`
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOr(pub Vec<LogicalAnd>);

/// `a && b && ...`
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalAnd(pub Vec<BasicExpr>);

#[derive(Debug, Clone, PartialEq)]
pub enum BasicExpr {
    /// `@.a`: true when the query selects at least one node
    Exists(Query),
    /// `!@.a`
    NotExists(Query),
    Comparison(Comparison),
    /// A `LogicalType` or `NodesType` function used as a test
    Function(FunctionCall),
    NotFunction(FunctionCall),
    Paren(LogicalOr),
    NotParen(LogicalOr),
    /// A literal used as a test, true when the value is truthy
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Comparable,
    pub op: CompOp,
    pub right: Comparable,
}

/// Operand of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Comparable {
    Literal(Value),
    /// Always a singular query
    Query(Query),
    /// Always a function with a `ValueType` result
    Function(FunctionCall),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    /// Equal: `==`
    Eq,
    /// Not equal: `!=`
    Ne,
    /// Less than: `<`
    Lt,
    /// Greater than: `>`
    Gt,
    /// Less than or equal: `<=`
    Le,
    /// Greater than or equal: `>=`
    Ge,
}

/// A call to a registered function extension, checked at parse time
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub function: Arc<FunctionExtension>,
    pub args: Vec<FuncArg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FuncArg {
    Literal(Value),
    Query(Query),
    Function(FunctionCall),
    Logical(LogicalOr),
}

impl Query {
    pub fn new(segments: Vec<Segment>, root: bool) -> Self {
        Self { segments, root }
    }

    /// A query that can select at most one node: names and indexes only
    pub fn is_singular(&self) -> bool {
        self.segments.iter().all(Segment::is_singular)
    }
}

impl Segment {
    pub fn child(selectors: Vec<Selector>) -> Self {
        Self {
            selectors,
            descendant: false,
        }
    }

    pub fn descendant(selectors: Vec<Selector>) -> Self {
        Self {
            selectors,
            descendant: true,
        }
    }

    pub fn is_singular(&self) -> bool {
        !self.descendant && self.selectors.len() == 1 && self.selectors[0].is_singular()
    }
}

impl Selector {
    pub fn is_singular(&self) -> bool {
        matches!(self, Selector::Name(_) | Selector::Index(_))
    }
}

impl FunctionCall {
    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn result_type(&self) -> PathType {
        self.function.result_type()
    }
}

impl FuncArg {
    /// Classification handed to the function's validator
    pub fn arg_type(&self) -> FuncType {
        match self {
            FuncArg::Literal(_) => FuncType::Literal,
            FuncArg::Query(q) if q.is_singular() => FuncType::SingularQuery,
            FuncArg::Query(_) => FuncType::NodeList,
            FuncArg::Function(call) => call.result_type().into(),
            FuncArg::Logical(_) => FuncType::Logical,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(if self.root { '$' } else { '@' })?;
        self.segments.iter().try_for_each(|s| write!(f, "{s}"))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descendant {
            f.write_str("..")?;
        }
        f.write_char('[')?;
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{selector}")?;
        }
        f.write_char(']')
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => write_quoted(f, name),
            Selector::Index(i) => write!(f, "{i}"),
            Selector::Wildcard => f.write_char('*'),
            Selector::Slice(slice) => write!(f, "{slice}"),
            Selector::Filter(expr) => write!(f, "?{expr}"),
        }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_char(':')?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

impl fmt::Display for LogicalOr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, and) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" || ")?;
            }
            write!(f, "{and}")?;
        }
        Ok(())
    }
}

impl fmt::Display for LogicalAnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" && ")?;
            }
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}

impl fmt::Display for BasicExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasicExpr::Exists(q) => write!(f, "{q}"),
            BasicExpr::NotExists(q) => write!(f, "!{q}"),
            BasicExpr::Comparison(c) => write!(f, "{} {} {}", c.left, c.op, c.right),
            BasicExpr::Function(call) => write!(f, "{call}"),
            BasicExpr::NotFunction(call) => write!(f, "!{call}"),
            BasicExpr::Paren(expr) => write!(f, "({expr})"),
            BasicExpr::NotParen(expr) => write!(f, "!({expr})"),
            BasicExpr::Literal(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Display for Comparable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparable::Literal(v) => write!(f, "{v}"),
            Comparable::Query(q) => write!(f, "{q}"),
            Comparable::Function(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompOp::Eq => "==",
            CompOp::Ne => "!=",
            CompOp::Lt => "<",
            CompOp::Gt => ">",
            CompOp::Le => "<=",
            CompOp::Ge => ">=",
        })
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match arg {
                FuncArg::Literal(v) => write!(f, "{v}")?,
                FuncArg::Query(q) => write!(f, "{q}")?,
                FuncArg::Function(call) => write!(f, "{call}")?,
                FuncArg::Logical(expr) => write!(f, "{expr}")?,
            }
        }
        f.write_char(')')
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_singular() {
        let q = Query::new(
            vec![
                Segment::child(vec![Selector::Name("a".to_string())]),
                Segment::child(vec![Selector::Index(-1)]),
            ],
            false,
        );
        assert!(q.is_singular());
        assert!(Query::new(vec![], true).is_singular());

        let q = Query::new(vec![Segment::descendant(vec![Selector::Index(0)])], true);
        assert!(!q.is_singular());

        let q = Query::new(
            vec![Segment::child(vec![Selector::Index(0), Selector::Index(1)])],
            true,
        );
        assert!(!q.is_singular());
        assert!(!Selector::Wildcard.is_singular());
        assert!(!Selector::Slice(Slice::default()).is_singular());
    }

    #[test]
    fn test_display() {
        let q = Query::new(
            vec![
                Segment::child(vec![Selector::Name("store".to_string())]),
                Segment::descendant(vec![
                    Selector::Wildcard,
                    Selector::Index(-1),
                    Selector::Slice(Slice {
                        start: None,
                        end: Some(3),
                        step: Some(-1),
                    }),
                ]),
            ],
            true,
        );
        assert_eq!(q.to_string(), "$['store']..[*, -1, :3:-1]");
    }
}
