/*!
# `jsonmatch` Library

Reusable MongoDB-style find-filter predicates over dynamically-shaped
JSON documents.

```
use jsonmatch::{Predicate, value::Value};
use serde_json::json;

let pred = Predicate::new(Value::from(json!({"user.roles": "admin"})));
assert!(pred.test(&Value::from(json!({"user": {"roles": ["admin", "ops"]}}))));
```
*/

pub mod query;
pub mod utils;
pub mod value;

// Re-exports
pub use query::{matches, Predicate, QueryBuilder, StructuralError};
pub use value::Value;
