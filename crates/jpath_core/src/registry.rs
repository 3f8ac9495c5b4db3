//! Function extension registry (RFC 9535 section 2.4)
//!
//! A [`Registry`] maps function names to [`FunctionExtension`]s. The parser
//! looks names up while it builds a filter, runs the extension's validator
//! against the argument types, and stores an `Arc` to the extension in the
//! AST. Evaluation never goes back to the registry.

use crate::Error;
use crate::functions::standard_functions;
use crate::types::{FuncType, PathType, PathValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

/// Parse-time argument check; the error text is reported with the call's position
pub type Validator = fn(&[FuncType]) -> Result<(), String>;

/// Evaluation of a validated call
pub type Evaluator = for<'a> fn(Vec<PathValue<'a>>) -> PathValue<'a>;

/// A named function usable inside filter expressions
pub struct FunctionExtension {
    name: String,
    result: PathType,
    validator: Validator,
    evaluator: Evaluator,
}

impl FunctionExtension {
    pub fn new(
        name: impl Into<String>,
        result: PathType,
        validator: Validator,
        evaluator: Evaluator,
    ) -> Self {
        Self {
            name: name.into(),
            result,
            validator,
            evaluator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn result_type(&self) -> PathType {
        self.result
    }

    pub fn validate(&self, args: &[FuncType]) -> Result<(), String> {
        (self.validator)(args)
    }

    pub fn evaluate<'a>(&self, args: Vec<PathValue<'a>>) -> PathValue<'a> {
        (self.evaluator)(args)
    }
}

impl fmt::Debug for FunctionExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionExtension")
            .field("name", &self.name)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

// Names are unique within a registry.
impl PartialEq for FunctionExtension {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.result == other.result
    }
}

/// Table of function extensions available to the parser
///
/// `Registry::new()` comes preloaded with `length`, `count`, `value`,
/// `match` and `search`. Share one across threads with `Arc<Registry>`.
pub struct Registry {
    functions: RwLock<HashMap<String, Arc<FunctionExtension>>>,
}

static DEFAULT: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Registry used by [`Query::parse`](crate::Query::parse)
pub(crate) fn default_registry() -> &'static Registry {
    &DEFAULT
}

impl Registry {
    pub fn new() -> Self {
        let functions = standard_functions()
            .into_iter()
            .map(|f| (f.name.clone(), Arc::new(f)))
            .collect();
        Self {
            functions: RwLock::new(functions),
        }
    }

    /// A registry without any functions
    pub fn empty() -> Self {
        Self {
            functions: RwLock::new(HashMap::new()),
        }
    }

    /// Add an extension; names must be unique and follow the function-name grammar
    pub fn register(&self, function: FunctionExtension) -> Result<(), Error> {
        if !is_function_name(&function.name) {
            return Err(Error::Registration(format!(
                "invalid function name {:?}",
                function.name
            )));
        }
        let mut functions = self.functions.write().unwrap_or_else(PoisonError::into_inner);
        if functions.contains_key(&function.name) {
            return Err(Error::Registration(format!(
                "function {}() is already registered",
                function.name
            )));
        }
        debug!(name = %function.name, result = %function.result, "registered function extension");
        functions.insert(function.name.clone(), Arc::new(function));
        Ok(())
    }

    /// Like [`register`](Self::register), for setup code where failure is a bug
    ///
    /// # Panics
    ///
    /// Panics when the name is invalid or already registered.
    #[allow(clippy::panic)]
    pub fn must_register(&self, function: FunctionExtension) {
        if let Err(e) = self.register(function) {
            panic!("{e}");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<FunctionExtension>> {
        self.functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.names())
            .finish()
    }
}

/// `function-name = function-name-first *function-name-char`
fn is_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
