/*!
# Predicate Facade

Binds a query to a reusable predicate. Construction compiles the query
(including every regex operand) exactly once; `test` then walks one
document per call, allocation-free and without touching the query
again.

## Examples

```rust
use jsonmatch::{Predicate, value::Value};
use serde_json::json;

let pred = Predicate::new(Value::from(json!({"age": {"$gte": 21}})));
assert!(pred.test(&Value::from(json!({"age": 30}))));
assert!(!pred.test(&Value::from(json!({"age": 18}))));
```

Validation is opt-in and chains:

```rust
use jsonmatch::{Predicate, value::Value};
use serde_json::json;

let matched = Predicate::new(Value::from(json!({"tags": {"$size": 2}})))
    .validate()
    .expect("well-formed query")
    .test(&Value::from(json!({"tags": ["a", "b"]})));
assert!(matched);
```
*/
use std::fmt;
use std::sync::Arc;

use crate::query::ast::Node;
use crate::query::compile::compile;
use crate::query::eval::{eval, Ctx, WhereFn};
use crate::query::validate::{validate_query, StructuralError};
use crate::value::Value;

/// A compiled, reusable document predicate.
///
/// Immutable after construction: one predicate may be shared across
/// threads and tested against any number of documents concurrently.
#[derive(Clone)]
pub struct Predicate {
    query: Value,
    compiled: Node,
    where_fn: Option<Arc<WhereFn>>,
}

impl Predicate {
    /// Compile a query into a predicate. Never fails: structurally
    /// broken queries compile to predicates that match nothing, and
    /// [`validate`](Self::validate) reports what is wrong with them.
    #[must_use]
    pub fn new(query: Value) -> Self {
        let compiled = compile(&query);
        Self {
            query,
            compiled,
            where_fn: None,
        }
    }

    /// Compile a query whose `$where` clauses are delegated to a host
    /// evaluator. The evaluator receives the `$where` operand verbatim
    /// and the document under test; the engine never interprets the
    /// operand itself.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonmatch::{Predicate, value::Value};
    /// use serde_json::json;
    ///
    /// let pred = Predicate::with_where(
    ///     Value::from(json!({"$where": "wide"})),
    ///     |operand, doc| {
    ///         operand.as_str() == Some("wide")
    ///             && doc.as_map().is_some_and(|m| m.len() > 2)
    ///     },
    /// );
    /// assert!(pred.test(&Value::from(json!({"a": 1, "b": 2, "c": 3}))));
    /// assert!(!pred.test(&Value::from(json!({"a": 1}))));
    /// ```
    #[must_use]
    pub fn with_where<F>(query: Value, evaluator: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        let compiled = compile(&query);
        Self {
            query,
            compiled,
            where_fn: Some(Arc::new(evaluator)),
        }
    }

    /// Test one document. Total over any input: ill-typed operator
    /// arguments and unreachable paths are non-matches, never errors.
    #[must_use]
    pub fn test(&self, doc: &Value) -> bool {
        eval(
            &self.compiled,
            doc,
            Ctx {
                where_fn: self.where_fn.as_deref(),
            },
        )
    }

    /// Run the structural validation of the underlying query once,
    /// returning `self` for chaining.
    ///
    /// # Errors
    ///
    /// Returns a [`StructuralError`] naming the offending operator.
    pub fn validate(&self) -> Result<&Self, StructuralError> {
        validate_query(&self.query, self.where_fn.is_some())?;
        Ok(self)
    }

    /// Borrow the query this predicate was built from.
    #[must_use]
    pub const fn query(&self) -> &Value {
        &self.query
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("query", &self.query)
            .field("where_fn", &self.where_fn.as_ref().map(|_| ".."))
            .finish()
    }
}

/// One-shot convenience: compile `query` and test `doc` once.
#[must_use]
pub fn matches(query: &Value, doc: &Value) -> bool {
    Predicate::new(query.clone()).test(doc)
}
