//! jpath_core - JSONPath query compiler and evaluator (RFC 9535)
//!
//! Queries are parsed once into a [`Query`] and can then be run against any
//! number of `serde_json` documents.
//!
//! ```
//! use jpath_core::Query;
//! use serde_json::json;
//!
//! let doc = json!({"store": {"book": [{"price": 8}, {"price": 23}]}});
//! let query = Query::parse("$.store.book[?@.price < 10]").unwrap();
//! assert_eq!(query.select(&doc), vec![&json!({"price": 8})]);
//!
//! let located = query.select_located(&doc);
//! assert_eq!(located[0].path.to_string(), "$['store']['book'][0]");
//! assert_eq!(located[0].path.to_pointer(), "/store/book/0");
//! ```

pub mod ast;
pub mod compare;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod registry;
pub mod types;

pub use ast::Query;
pub use parser::Parser;
pub use path::{LocatedNode, NormalizedPath, PathElement};
pub use registry::{Evaluator, FunctionExtension, Registry, Validator};
pub use types::{FuncType, NodeList, PathType, PathValue};

use serde_json::Value;

/// Error type for JSONPath operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed query; `position` is the char offset counted from 0
    #[error("jsonpath: {message} at position {}", .position + 1)]
    Parse { message: String, position: usize },
    /// Rejected function extension
    #[error("jsonpath: {0}")]
    Registration(String),
}

impl Error {
    /// Offset of a parse error, counted in chars from 0
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Parse { position, .. } => Some(*position),
            Error::Registration(_) => None,
        }
    }
}

/// Parse a query using the standard function extensions
pub fn parse(jsonpath: &str) -> Result<Query, Error> {
    Query::parse(jsonpath)
}

/// Parse a query that is known to be valid, such as a literal in source code
///
/// # Panics
///
/// Panics with the parse error when `jsonpath` is malformed.
#[allow(clippy::panic)]
pub fn must_parse(jsonpath: &str) -> Query {
    match Query::parse(jsonpath) {
        Ok(query) => query,
        Err(e) => panic!("{e}"),
    }
}

/// Execute a JSONPath query against a JSON value
///
/// # Arguments
/// * `jsonpath` - A JSONPath query string (e.g., "$.store.book[*].author")
/// * `json` - The JSON value to query
///
/// # Returns
/// Clones of the matching values, or an error if the query is invalid
///
/// # Example
/// ```
/// use serde_json::json;
/// use jpath_core::query;
///
/// let json = json!({"foo": "bar"});
/// let results = query("$.foo", &json).unwrap();
/// assert_eq!(results, vec![json!("bar")]);
/// ```
pub fn query(jsonpath: &str, json: &Value) -> Result<Vec<Value>, Error> {
    let path = Query::parse(jsonpath)?;
    Ok(path.select(json).into_iter().cloned().collect())
}
