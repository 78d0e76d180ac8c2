/*!
# Compiled Predicate Tree

The internal representation a query is compiled into before any
document is tested. Combinators become [`Node`] branches, each dotted
path with its operators becomes a [`Condition`], and every regex
operand is compiled exactly once here so repeated `test` calls never
touch the regex parser again.

Compilation is total: query shapes that can never match (a combinator
whose argument is not a list, an unparsable pattern, a malformed
`$mod`) become never-matching nodes instead of errors. Structural
diagnostics are the validator's job.
*/
use regex::{Regex, RegexBuilder};

use crate::query::path::Segment;
use crate::value::Value;

/// One clause of a compiled query.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    /// Conjunction; an empty list matches everything.
    And(Vec<Node>),
    /// Disjunction; an empty list matches nothing.
    Or(Vec<Node>),
    /// Negated disjunction; an empty list matches everything.
    Nor(Vec<Node>),
    /// Operators applied at a dotted path.
    Cond(Condition),
    /// Host-evaluated `$where` clause carrying its operand verbatim.
    Where(Value),
    /// A clause that can never match.
    Never,
}

/// A dotted path together with the operators evaluated against it.
/// Multiple operators on one path are an implicit conjunction.
#[derive(Debug, Clone)]
pub(crate) struct Condition {
    pub segments: Vec<Segment>,
    pub ops: Vec<CondOp>,
}

/// One compiled condition operator.
#[derive(Debug, Clone)]
pub(crate) enum CondOp {
    Eq(EqOperand),
    Ne(EqOperand),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<EqOperand>),
    Nin(Vec<EqOperand>),
    /// Negated conjunction of the inner operators at the same path.
    Not(Vec<CondOp>),
    /// `None` when the pattern failed to compile; such a clause never
    /// matches.
    Regex(Option<Regex>),
    Mod {
        divisor: f64,
        remainder: f64,
    },
    Size(f64),
    /// Sub-query each array element is tested against as its own
    /// document.
    ElemMatch(Box<Node>),
    /// Scalar-form `$all` operand list, matched by deep equality.
    All(Vec<Value>),
    /// An operator whose operand shape rules out any match.
    Never,
}

/// An equality operand with its pattern pre-compiled when the operand
/// is a regex. Shared by `$eq`, `$ne`, and the `$in`/`$nin` element
/// tests, all of which treat a regex operand both as a literal and as
/// a pattern against string leaves.
#[derive(Debug, Clone)]
pub(crate) struct EqOperand {
    pub value: Value,
    pub pattern: Option<Regex>,
}

impl EqOperand {
    pub(crate) fn new(value: Value) -> Self {
        let pattern = match &value {
            Value::Regex(pattern, flags) => build_regex(pattern, flags),
            _ => None,
        };
        Self { value, pattern }
    }
}

/// Compile a pattern with the option letters `i`, `m`, and `s`; any
/// other letters are ignored. Returns `None` when the pattern does not
/// parse.
pub(crate) fn build_regex(pattern: &str, flags: &str) -> Option<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            _ => &mut builder,
        };
    }
    builder.build().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_operand_compiles_regex_values() {
        let op = EqOperand::new(Value::regex("^a", "i"));
        assert!(op.pattern.as_ref().is_some_and(|re| re.is_match("Abc")));

        let plain = EqOperand::new(Value::String("literal".to_string()));
        assert!(plain.pattern.is_none());
    }

    #[test]
    fn build_regex_honors_ims_only() {
        assert!(build_regex("^b", "i").unwrap().is_match("Bar"));
        assert!(build_regex("^baz", "m").unwrap().is_match("bar\nbaz"));
        assert!(build_regex("a.b", "s").unwrap().is_match("a\nb"));
        // Unknown letters are ignored rather than rejected.
        assert!(build_regex("a", "xzu").is_some());
    }

    #[test]
    fn build_regex_rejects_bad_patterns() {
        assert!(build_regex("(", "").is_none());
    }
}
