/*!
# Query Builder

Fluent construction of query documents without writing JSON by hand.
The builder emits an ordinary query [`Value`], so its output can be
validated, printed, or handed straight to
[`Predicate::new`](crate::query::Predicate::new).

# Examples

```rust
use jsonmatch::query::QueryBuilder;
use jsonmatch::value::Value;

let query = QueryBuilder::new()
    .gte("age", 21)
    .regex("name", "^a", "i")
    .build();
assert_eq!(
    query,
    Value::try_from(
        r#"{"age": {"$gte": 21}, "name": {"$regex": "^a", "$options": "i"}}"#
    )
    .unwrap()
);
```
*/
use crate::value::{Map, Value};

/// Builder for query documents. Operators added for the same field
/// merge into one expression; combinator methods attach at the top
/// level.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    clauses: Map,
}

impl QueryBuilder {
    /// Creates a builder for an empty query, which matches every
    /// document.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonmatch::query::QueryBuilder;
    /// use jsonmatch::value::Value;
    ///
    /// assert_eq!(QueryBuilder::new().build(), Value::Map(Default::default()));
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value` (full `$eq` semantics,
    /// including array fan-out).
    #[must_use]
    pub fn eq<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.operator(field, "$eq", value.into())
    }

    /// Require `field` to differ from `value` along the whole path.
    #[must_use]
    pub fn ne<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.operator(field, "$ne", value.into())
    }

    /// Require `field` to order strictly above `value`.
    #[must_use]
    pub fn gt<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.operator(field, "$gt", value.into())
    }

    /// Require `field` to order at or above `value`.
    #[must_use]
    pub fn gte<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.operator(field, "$gte", value.into())
    }

    /// Require `field` to order strictly below `value`.
    #[must_use]
    pub fn lt<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.operator(field, "$lt", value.into())
    }

    /// Require `field` to order at or below `value`.
    #[must_use]
    pub fn lte<V: Into<Value>>(self, field: &str, value: V) -> Self {
        self.operator(field, "$lte", value.into())
    }

    /// Require `field` to equal one of `values`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonmatch::query::{matches, QueryBuilder};
    /// use jsonmatch::value::Value;
    ///
    /// let query = QueryBuilder::new()
    ///     .in_list(
    ///         "status",
    ///         vec![Value::String("active".to_string()), Value::String("pending".to_string())],
    ///     )
    ///     .build();
    /// let doc = Value::try_from(r#"{"status": "active"}"#).unwrap();
    /// assert!(matches(&query, &doc));
    /// ```
    #[must_use]
    pub fn in_list<V: Into<Value>>(self, field: &str, values: Vec<V>) -> Self {
        self.operator(field, "$in", Value::from(values))
    }

    /// Require `field` to equal none of `values`.
    #[must_use]
    pub fn nin<V: Into<Value>>(self, field: &str, values: Vec<V>) -> Self {
        self.operator(field, "$nin", Value::from(values))
    }

    /// Negate a sub-expression at `field`. The expression is given as
    /// a value, e.g. the output of another builder's field clause.
    #[must_use]
    pub fn not(self, field: &str, expression: Value) -> Self {
        self.operator(field, "$not", expression)
    }

    /// Require the string at `field` to match `pattern` under the
    /// option letters in `flags` (`i`, `m`, `s`; others are ignored).
    #[must_use]
    pub fn regex(self, field: &str, pattern: &str, flags: &str) -> Self {
        let with_pattern = self.operator(field, "$regex", Value::String(pattern.to_string()));
        if flags.is_empty() {
            with_pattern
        } else {
            with_pattern.operator(field, "$options", Value::String(flags.to_string()))
        }
    }

    /// Require the number at `field` to leave `remainder` when divided
    /// by `divisor`.
    #[must_use]
    pub fn modulo(self, field: &str, divisor: f64, remainder: f64) -> Self {
        self.operator(
            field,
            "$mod",
            Value::Array(vec![Value::Number(divisor), Value::Number(remainder)]),
        )
    }

    /// Require the array at `field` to have exactly `size` elements.
    #[must_use]
    pub fn size(self, field: &str, size: i64) -> Self {
        self.operator(field, "$size", Value::from(size))
    }

    /// Require some element of the array at `field` to match the
    /// sub-query `query` as a document of its own.
    #[must_use]
    pub fn elem_match(self, field: &str, query: Value) -> Self {
        self.operator(field, "$elemMatch", query)
    }

    /// Require the array at `field` to contain every one of `values`.
    #[must_use]
    pub fn all<V: Into<Value>>(self, field: &str, values: Vec<V>) -> Self {
        self.operator(field, "$all", Value::from(values))
    }

    /// Conjoin `queries` at the top level.
    #[must_use]
    pub fn and(mut self, queries: Vec<Value>) -> Self {
        self.clauses.insert("$and".to_string(), Value::Array(queries));
        self
    }

    /// Require at least one of `queries` at the top level.
    #[must_use]
    pub fn or(mut self, queries: Vec<Value>) -> Self {
        self.clauses.insert("$or".to_string(), Value::Array(queries));
        self
    }

    /// Require none of `queries` at the top level.
    #[must_use]
    pub fn nor(mut self, queries: Vec<Value>) -> Self {
        self.clauses.insert("$nor".to_string(), Value::Array(queries));
        self
    }

    /// Return the built query as a [`Value`].
    #[must_use]
    pub fn build(self) -> Value {
        Value::Map(self.clauses)
    }

    fn operator(mut self, field: &str, op: &str, operand: Value) -> Self {
        match self.clauses.get_mut(field) {
            Some(Value::Map(expr)) => {
                expr.insert(op.to_string(), operand);
            }
            _ => {
                let mut expr = Map::new();
                expr.insert(op.to_string(), operand);
                self.clauses.insert(field.to_string(), Value::Map(expr));
            }
        }
        self
    }
}
