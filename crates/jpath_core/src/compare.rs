//! Comparison of filter operands (RFC 9535 section 2.3.5.2.2)

use crate::ast::CompOp;
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Compare two operands; `None` is the absent value Nothing
pub fn compare(left: Option<&Value>, op: CompOp, right: Option<&Value>) -> bool {
    match op {
        CompOp::Eq => operands_equal(left, right),
        CompOp::Ne => !operands_equal(left, right),
        CompOp::Lt => operand_less(left, right),
        CompOp::Gt => operand_less(right, left),
        CompOp::Le => operand_less(left, right) || operands_equal(left, right),
        CompOp::Ge => operand_less(right, left) || operands_equal(left, right),
    }
}

fn operands_equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => value_equal(l, r),
        (None, None) => true,
        _ => false,
    }
}

fn operand_less(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => value_less(l, r),
        _ => false,
    }
}

/// Structural equality with numbers compared by value
pub fn value_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => number_cmp(l, r) == Some(Ordering::Equal),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| value_equal(a, b))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(k, v)| r.get(k).is_some_and(|other| value_equal(v, other)))
        }
        (Value::Null, Value::Null) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::String(l), Value::String(r)) => l == r,
        _ => false,
    }
}

/// Ordering is defined for numbers and for strings only
pub fn value_less(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => number_cmp(l, r) == Some(Ordering::Less),
        // Byte order of UTF-8 is scalar value order.
        (Value::String(l), Value::String(r)) => l < r,
        _ => false,
    }
}

/// Exact for integers of either sign, falls back to f64 otherwise
fn number_cmp(l: &Number, r: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (l.as_i64(), r.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (l.as_u64(), r.as_u64()) {
        return Some(a.cmp(&b));
    }
    l.as_f64()?.partial_cmp(&r.as_f64()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cmp(l: Value, op: CompOp, r: Value) -> bool {
        compare(Some(&l), op, Some(&r))
    }

    #[test]
    fn test_numbers() {
        assert!(cmp(json!(1), CompOp::Eq, json!(1.0)));
        assert!(cmp(json!(1), CompOp::Lt, json!(1.5)));
        assert!(cmp(json!(-1), CompOp::Lt, json!(u64::MAX)));
        assert!(!cmp(json!(u64::MAX), CompOp::Eq, json!(u64::MAX - 1)));
        assert!(cmp(json!(1e2), CompOp::Eq, json!(100)));
        assert!(cmp(json!(2), CompOp::Ge, json!(2.0)));
    }

    #[test]
    fn test_type_mismatch() {
        assert!(!cmp(json!("1"), CompOp::Eq, json!(1)));
        assert!(cmp(json!("1"), CompOp::Ne, json!(1)));
        assert!(!cmp(json!(true), CompOp::Lt, json!(1)));
        assert!(!cmp(json!(true), CompOp::Le, json!(false)));
        assert!(!cmp(json!(null), CompOp::Ge, json!(0)));
        assert!(cmp(json!(true), CompOp::Le, json!(true)));
    }

    #[test]
    fn test_strings() {
        assert!(cmp(json!("a"), CompOp::Lt, json!("b")));
        assert!(cmp(json!("a"), CompOp::Lt, json!("aa")));
        assert!(cmp(json!("Z"), CompOp::Lt, json!("a")));
        assert!(cmp(json!("\u{e9}"), CompOp::Lt, json!("\u{1f600}")));
        assert!(!cmp(json!("b"), CompOp::Le, json!("a")));
    }

    #[test]
    fn test_structures() {
        assert!(cmp(json!([1, 2]), CompOp::Eq, json!([1, 2.0])));
        assert!(!cmp(json!([1, 2]), CompOp::Eq, json!([2, 1])));
        assert!(cmp(json!({"a": 1, "b": [2]}), CompOp::Eq, json!({"b": [2], "a": 1.0})));
        assert!(!cmp(json!({"a": 1}), CompOp::Eq, json!({"a": 1, "b": 2})));
        assert!(!cmp(json!([1]), CompOp::Lt, json!([2])));
        assert!(cmp(json!({}), CompOp::Le, json!({})));
    }

    #[test]
    fn test_nothing() {
        let one = json!(1);
        assert!(compare(None, CompOp::Eq, None));
        assert!(compare(None, CompOp::Le, None));
        assert!(!compare(None, CompOp::Lt, None));
        assert!(!compare(Some(&one), CompOp::Eq, None));
        assert!(compare(None, CompOp::Ne, Some(&one)));
        assert!(!compare(None, CompOp::Lt, Some(&one)));
    }
}
