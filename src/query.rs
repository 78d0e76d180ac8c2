//! # Document Query Dialect
//!
//! A MongoDB find-filter dialect over [`Value`](crate::value::Value)
//! documents with support for:
//! - Implicit and explicit equality, range comparisons, `$in`/`$nin`
//! - Dotted paths with array fan-out and index segments
//! - `$regex`/`$options`, `$mod`, `$size`, `$elemMatch`, `$all`, `$not`
//! - The `$and`/`$or`/`$nor` combinators
//!
//! A query compiles once into a reusable [`Predicate`]; validation is
//! a separate, opt-in pass that reports structural problems the
//! matcher would otherwise silently treat as non-matches.

pub(crate) mod ast;
pub mod builder;
pub(crate) mod compile;
pub(crate) mod eval;
pub(crate) mod path;
pub mod predicate;
pub mod validate;

/// The condition operators of the dialect. A map in value position
/// whose every key appears here is an expression; any other value is
/// an operand matched by implicit equality.
pub const CONDITION_OPERATORS: [&str; 15] = [
    "$eq",
    "$ne",
    "$gt",
    "$gte",
    "$lt",
    "$lte",
    "$in",
    "$nin",
    "$not",
    "$regex",
    "$options",
    "$mod",
    "$all",
    "$elemMatch",
    "$size",
];

/// The query combinators, each taking a list of sub-queries.
pub const COMBINATORS: [&str; 3] = ["$and", "$or", "$nor"];

// Re-exports
pub use builder::QueryBuilder;
pub use eval::WhereFn;
pub use predicate::{matches, Predicate};
pub use validate::{validate, StructuralError};
