/*!
# Query Validator

One-pass structural check of a query tree. Validation is the only
place a query can fail loudly: matching itself never raises and treats
every ill-typed operand as a non-match.

## Examples

```rust
use jsonmatch::query::validate;
use jsonmatch::value::Value;

let query = Value::try_from(r#"{"age": {"$gte": 21}}"#).unwrap();
assert!(validate(&query).is_ok());

let bad = Value::try_from(r#"{"$and": 5}"#).unwrap();
let err = validate(&bad).unwrap_err();
assert!(err.to_string().contains("$and"));
```
*/
use std::error::Error;
use std::fmt;

use crate::query::compile::is_expression;
use crate::value::{Map, Value};

/// Error raised when a query fails structural validation. The message
/// names the offending operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
    message: String,
}

impl StructuralError {
    pub(crate) fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for StructuralError {}

/// Validate a query's structure. Combinator branches are validated
/// recursively; condition expressions are checked for the operand
/// shapes their operators demand. Queries containing `$where` are
/// rejected here, since a bare query has no host evaluator; a
/// predicate built with one validates through
/// [`Predicate::validate`](crate::query::Predicate::validate) instead.
///
/// # Errors
///
/// Returns a [`StructuralError`] naming the offending operator.
pub fn validate(query: &Value) -> Result<(), StructuralError> {
    validate_query(query, false)
}

pub(crate) fn validate_query(query: &Value, where_allowed: bool) -> Result<(), StructuralError> {
    let Value::Map(clauses) = query else {
        return Err(StructuralError::new(format!(
            "query must be a document, got {}",
            kind(query)
        )));
    };
    for (key, operand) in clauses {
        match key.as_str() {
            "$and" | "$or" | "$nor" => {
                let Some(branches) = operand.as_array() else {
                    return Err(StructuralError::new(format!(
                        "{key} expects an array of sub-queries, got {}",
                        kind(operand)
                    )));
                };
                for branch in branches {
                    validate_query(branch, where_allowed)?;
                }
            }
            "$where" => {
                if !where_allowed {
                    return Err(StructuralError::new(
                        "$where requires a predicate built with a host evaluator",
                    ));
                }
            }
            _ => {
                if is_expression(operand) {
                    if let Some(expr) = operand.as_map() {
                        validate_expression(expr)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn validate_expression(expr: &Map) -> Result<(), StructuralError> {
    for (op, operand) in expr {
        match op.as_str() {
            "$in" | "$nin" => {
                if operand.as_array().is_none() {
                    return Err(StructuralError::new(format!(
                        "{op} expects an array, got {}",
                        kind(operand)
                    )));
                }
            }
            "$all" => validate_all(operand)?,
            "$mod" => {
                let two_numbers = operand.as_array().is_some_and(|elems| {
                    elems.len() == 2 && elems.iter().all(|e| matches!(e, Value::Number(_)))
                });
                if !two_numbers {
                    return Err(StructuralError::new(
                        "$mod expects a [divisor, remainder] array of two numbers",
                    ));
                }
            }
            "$size" => {
                if !matches!(operand, Value::Number(_)) {
                    return Err(StructuralError::new(format!(
                        "$size expects a number, got {}",
                        kind(operand)
                    )));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_all(operand: &Value) -> Result<(), StructuralError> {
    let Some(elems) = operand.as_array() else {
        return Err(StructuralError::new(format!(
            "$all expects an array, got {}",
            kind(operand)
        )));
    };
    // The elemMatch form: once every element is an operator document,
    // each must be an $elemMatch.
    let operator_documents = !elems.is_empty()
        && elems
            .iter()
            .all(|e| e.as_map().is_some_and(|m| m.keys().any(|k| k.starts_with('$'))));
    if operator_documents {
        for elem in elems {
            if !elem.as_map().is_some_and(|m| m.contains_key("$elemMatch")) {
                return Err(StructuralError::new(
                    "$all operator documents must each carry $elemMatch",
                ));
            }
        }
    }
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Regex(..) => "a regex",
        Value::Array(_) => "an array",
        Value::Map(_) => "a document",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validated(query: serde_json::Value) -> Result<(), StructuralError> {
        validate(&Value::from(query))
    }

    #[test]
    fn accepts_well_formed_queries() {
        assert!(validated(json!({})).is_ok());
        assert!(validated(json!({"a": 1, "b.c": {"$gt": 2}})).is_ok());
        assert!(validated(json!({"$and": [{"a": 1}, {"$or": [{"b": 2}]}]})).is_ok());
        assert!(validated(json!({"a": {"$in": [1, null]}, "b": {"$mod": [10, 1]}})).is_ok());
        assert!(validated(json!({"a": {"$size": 3}})).is_ok());
        assert!(validated(json!({"$nor": []})).is_ok());
    }

    #[test]
    fn rejects_non_document_queries() {
        assert!(validated(json!([1, 2])).is_err());
        assert!(validated(json!("query")).is_err());
        assert!(validated(json!(null)).is_err());
    }

    #[test]
    fn rejects_malformed_combinators() {
        let err = validated(json!({"$and": 5})).unwrap_err();
        assert!(err.message().contains("$and"));
        assert!(validated(json!({"$or": {"a": 1}})).is_err());
        assert!(validated(json!({"$nor": "x"})).is_err());
    }

    #[test]
    fn recurses_into_combinator_branches() {
        let err = validated(json!({"$or": [{"a": {"$in": 5}}]})).unwrap_err();
        assert!(err.message().contains("$in"));
        assert!(validated(json!({"$and": [5]})).is_err());
    }

    #[test]
    fn rejects_non_list_in_and_nin() {
        assert!(validated(json!({"a": {"$in": 5}})).is_err());
        let err = validated(json!({"a": {"$nin": "x"}})).unwrap_err();
        assert!(err.message().contains("$nin"));
    }

    #[test]
    fn rejects_malformed_mod() {
        assert!(validated(json!({"a": {"$mod": 5}})).is_err());
        assert!(validated(json!({"a": {"$mod": [10]}})).is_err());
        assert!(validated(json!({"a": {"$mod": [10, 1, 2]}})).is_err());
        assert!(validated(json!({"a": {"$mod": ["10", 1]}})).is_err());
        assert!(validated(json!({"a": {"$mod": []}})).is_err());
    }

    #[test]
    fn rejects_non_numeric_size() {
        let err = validated(json!({"a": {"$size": "3"}})).unwrap_err();
        assert!(err.message().contains("$size"));
    }

    #[test]
    fn all_elem_match_form_must_be_uniform() {
        assert!(validated(json!({"a": {"$all": [
            {"$elemMatch": {"b": 1}},
            {"$elemMatch": {"c": 2}}
        ]}}))
        .is_ok());
        // An operator document that is not $elemMatch is rejected.
        let err = validated(json!({"a": {"$all": [{"$gt": 4}]}})).unwrap_err();
        assert!(err.message().contains("$elemMatch"));
        // Plain values remain a plain list.
        assert!(validated(json!({"a": {"$all": [1, {"b": 2}]}})).is_ok());
        assert!(validated(json!({"a": {"$all": []}})).is_ok());
        assert!(validated(json!({"a": {"$all": 5}})).is_err());
    }

    #[test]
    fn operand_maps_with_unknown_keys_need_no_checks() {
        // Not an expression, so the ill-shaped "$mod" inside is just a
        // literal to deep-equal against.
        assert!(validated(json!({"a": {"$mod": [10], "b": 1}})).is_ok());
        assert!(validated(json!({"a": {" $size": "x"}})).is_ok());
    }

    #[test]
    fn where_requires_an_evaluator() {
        let err = validated(json!({"$where": "this.a > 1"})).unwrap_err();
        assert!(err.message().contains("$where"));
    }
}
