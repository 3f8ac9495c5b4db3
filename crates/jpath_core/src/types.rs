//! Function expression types (RFC 9535 section 2.4.1)
//!
//! Two layers live here. [`PathValue`] is what filter expressions and
//! function extensions produce at evaluation time. [`FuncType`] is the
//! parse-time classification of a function argument, used by extension
//! validators to decide whether an argument can be converted to the
//! [`PathType`] a parameter declares.
//!
//! # Contract for custom extensions
//!
//! A validator that accepts an argument promises the evaluator that the
//! corresponding [`PathValue`] can be converted with [`PathValue::into_value`],
//! [`PathValue::into_nodes`] or [`PathValue::into_logical`]. These conversions
//! panic when that promise is broken, because the bug is in the extension and
//! not in the query or the document.

use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Ordered list of nodes produced by a query or a `NodesType` function
pub type NodeList<'a> = Vec<Cow<'a, Value>>;

/// Value of an evaluated function argument or function result
#[derive(Debug, Clone, PartialEq)]
pub enum PathValue<'a> {
    /// `NodesType`
    Nodes(NodeList<'a>),
    /// `ValueType`; `None` is the special result Nothing
    Value(Option<Cow<'a, Value>>),
    /// `LogicalType`
    Logical(bool),
}

impl<'a> PathValue<'a> {
    /// The `ValueType` result Nothing
    pub fn nothing() -> Self {
        PathValue::Value(None)
    }

    /// Owned `ValueType` result
    pub fn value(value: impl Into<Value>) -> Self {
        PathValue::Value(Some(Cow::Owned(value.into())))
    }

    pub fn path_type(&self) -> PathType {
        match self {
            PathValue::Nodes(_) => PathType::Nodes,
            PathValue::Value(_) => PathType::Value,
            PathValue::Logical(_) => PathType::Logical,
        }
    }

    /// Convert to a node list: Nothing is empty, a value is a single node.
    ///
    /// # Panics
    ///
    /// Panics on `Logical`, which no validated argument can produce.
    #[allow(clippy::panic)]
    pub fn into_nodes(self) -> NodeList<'a> {
        match self {
            PathValue::Nodes(nodes) => nodes,
            PathValue::Value(value) => value.into_iter().collect(),
            PathValue::Logical(_) => {
                panic!("cannot convert LogicalType to NodesType: extension validator accepted an invalid argument")
            }
        }
    }

    /// Convert to a value: a singular node list yields its node or Nothing.
    ///
    /// # Panics
    ///
    /// Panics on `Logical` or on a node list with more than one node.
    #[allow(clippy::panic)]
    pub fn into_value(self) -> Option<Cow<'a, Value>> {
        match self {
            PathValue::Value(value) => value,
            PathValue::Nodes(mut nodes) if nodes.len() <= 1 => nodes.pop(),
            PathValue::Nodes(nodes) => panic!(
                "cannot convert a list of {} nodes to ValueType: extension validator accepted a non-singular query",
                nodes.len()
            ),
            PathValue::Logical(_) => {
                panic!("cannot convert LogicalType to ValueType: extension validator accepted an invalid argument")
            }
        }
    }

    /// Convert to a logical: a node list is true when non-empty.
    ///
    /// # Panics
    ///
    /// Panics on `Value`, which is never convertible to `LogicalType`.
    #[allow(clippy::panic)]
    pub fn into_logical(self) -> bool {
        match self {
            PathValue::Logical(b) => b,
            PathValue::Nodes(nodes) => !nodes.is_empty(),
            PathValue::Value(_) => {
                panic!("cannot convert ValueType to LogicalType: extension validator accepted an invalid argument")
            }
        }
    }

    /// Result of using this value directly as a filter test
    pub fn is_truthy(&self) -> bool {
        match self {
            PathValue::Nodes(nodes) => !nodes.is_empty(),
            PathValue::Value(value) => value.as_deref().is_some_and(value_is_truthy),
            PathValue::Logical(b) => *b,
        }
    }
}

/// JSON truthiness: `null`, `false` and zero are falsy
pub fn value_is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(_) | Value::Array(_) | Value::Object(_) => true,
    }
}

/// Declared type of a function parameter or result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathType {
    Value,
    Nodes,
    Logical,
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathType::Value => "ValueType",
            PathType::Nodes => "NodesType",
            PathType::Logical => "LogicalType",
        })
    }
}

/// Parse-time classification of a function argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncType {
    /// A JSON literal
    Literal,
    /// A query that selects at most one node
    SingularQuery,
    /// A function returning `ValueType`
    Value,
    /// A non-singular query or a function returning `NodesType`
    NodeList,
    /// A logical expression or a function returning `LogicalType`
    Logical,
}

impl FuncType {
    /// Whether an argument of this kind may be passed where `target` is declared
    pub fn converts_to(self, target: PathType) -> bool {
        match self {
            FuncType::Literal | FuncType::Value => target == PathType::Value,
            FuncType::SingularQuery => true,
            FuncType::NodeList => matches!(target, PathType::Nodes | PathType::Logical),
            FuncType::Logical => target == PathType::Logical,
        }
    }
}

impl From<PathType> for FuncType {
    fn from(t: PathType) -> Self {
        match t {
            PathType::Value => FuncType::Value,
            PathType::Nodes => FuncType::NodeList,
            PathType::Logical => FuncType::Logical,
        }
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FuncType::Literal => "literal",
            FuncType::SingularQuery => "singular query",
            FuncType::Value => "ValueType",
            FuncType::NodeList => "NodesType",
            FuncType::Logical => "LogicalType",
        })
    }
}

/// Check argument classifications against declared parameter types.
///
/// Most validators are a single call to this.
pub fn check_args(args: &[FuncType], params: &[PathType]) -> Result<(), String> {
    if args.len() != params.len() {
        let plural = if params.len() == 1 { "" } else { "s" };
        return Err(format!(
            "expected {} argument{plural} but found {}",
            params.len(),
            args.len()
        ));
    }
    for (i, (arg, param)) in args.iter().zip(params).enumerate() {
        if !arg.converts_to(*param) {
            return Err(format!("cannot convert argument {} from {arg} to {param}", i + 1));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversion_lattice() {
        use FuncType::*;
        let cases = [
            (Literal, [true, false, false]),
            (Value, [true, false, false]),
            (SingularQuery, [true, true, true]),
            (NodeList, [false, true, true]),
            (Logical, [false, false, true]),
        ];
        for (arg, expected) in cases {
            let actual = [
                arg.converts_to(PathType::Value),
                arg.converts_to(PathType::Nodes),
                arg.converts_to(PathType::Logical),
            ];
            assert_eq!(actual, expected, "{arg}");
        }
    }

    #[test]
    fn test_check_args() {
        assert!(check_args(&[FuncType::SingularQuery], &[PathType::Value]).is_ok());
        assert_eq!(
            check_args(&[], &[PathType::Value]).unwrap_err(),
            "expected 1 argument but found 0"
        );
        assert_eq!(
            check_args(&[FuncType::NodeList], &[PathType::Value]).unwrap_err(),
            "cannot convert argument 1 from NodesType to ValueType"
        );
    }

    #[test]
    fn test_into_nodes() {
        let v = json!(1);
        assert!(PathValue::nothing().into_nodes().is_empty());
        assert_eq!(
            PathValue::Value(Some(Cow::Borrowed(&v))).into_nodes(),
            vec![Cow::Borrowed(&v)]
        );
        let nodes = vec![Cow::Borrowed(&v), Cow::Borrowed(&v)];
        assert_eq!(PathValue::Nodes(nodes.clone()).into_nodes(), nodes);
    }

    #[test]
    fn test_into_value() {
        let v = json!("x");
        assert_eq!(PathValue::Nodes(vec![]).into_value(), None);
        assert_eq!(
            PathValue::Nodes(vec![Cow::Borrowed(&v)]).into_value(),
            Some(Cow::Borrowed(&v))
        );
        assert_eq!(PathValue::value(3).into_value(), Some(Cow::Owned(json!(3))));
    }

    #[test]
    fn test_into_logical() {
        let v = json!(null);
        assert!(PathValue::Logical(true).into_logical());
        assert!(!PathValue::Nodes(vec![]).into_logical());
        assert!(PathValue::Nodes(vec![Cow::Borrowed(&v)]).into_logical());
    }

    #[test]
    #[should_panic(expected = "cannot convert ValueType to LogicalType")]
    fn test_into_logical_rejects_value() {
        PathValue::value(1).into_logical();
    }

    #[test]
    #[should_panic(expected = "cannot convert LogicalType to ValueType")]
    fn test_into_value_rejects_logical() {
        PathValue::Logical(false).into_value();
    }

    #[test]
    fn test_truthiness() {
        assert!(!PathValue::nothing().is_truthy());
        assert!(!PathValue::value(json!(null)).is_truthy());
        assert!(!PathValue::value(false).is_truthy());
        assert!(!PathValue::value(0).is_truthy());
        assert!(!PathValue::value(0.0).is_truthy());
        assert!(PathValue::value("").is_truthy());
        assert!(PathValue::value(json!([])).is_truthy());
        assert!(PathValue::value(json!({})).is_truthy());
        assert!(PathValue::value(-1).is_truthy());
        assert!(!PathValue::Nodes(vec![]).is_truthy());
        assert!(PathValue::Logical(true).is_truthy());
    }
}
