/*!
# Matching Engine

Evaluates a compiled [`Node`] tree against one document. Every
condition operator shares the same traversal skeleton and differs only
in its terminal predicate and its absence policy:

- Dotted segments descend through maps by key. A digit segment against
  an array is tried as an integer index first.
- Intermediate arrays fan out: the operator matches if any element
  matches with the full remaining path.
- At the leaf, arrays fan out once more (elements first, then the
  array itself); `$size` is the one operator that skips this, since an
  array is its required leaf.
- When the path cannot reach a value, the operator's absence policy
  decides: equality and the inclusive range operators accept a null
  operand, `$in` accepts a list containing null, and everything else
  reports a non-match. The negating operators (`$ne`, `$nin`, `$not`)
  invert the full path evaluation of their positive twin, so absence
  flips with them.

All recursion is capped at [`MAX_DEPTH`] nesting levels; a walk that
runs past the cap reports a non-match rather than exhausting the host
stack.
*/
use std::cmp::Ordering;

use regex::Regex;

use crate::query::ast::{CondOp, EqOperand, Node};
use crate::query::path::Segment;
use crate::value::{self, Value, MAX_DEPTH};

/// Host callback backing `$where`: called with the `$where` operand and
/// the document under test.
pub type WhereFn = dyn Fn(&Value, &Value) -> bool + Send + Sync;

/// Per-call evaluation context.
#[derive(Clone, Copy)]
pub(crate) struct Ctx<'a> {
    pub where_fn: Option<&'a WhereFn>,
}

/// Evaluate a compiled query against a document.
pub(crate) fn eval(node: &Node, doc: &Value, ctx: Ctx) -> bool {
    eval_at(node, doc, ctx, MAX_DEPTH)
}

fn eval_at(node: &Node, doc: &Value, ctx: Ctx, depth: usize) -> bool {
    if depth == 0 {
        return false;
    }
    match node {
        Node::And(branches) => branches.iter().all(|b| eval_at(b, doc, ctx, depth - 1)),
        Node::Or(branches) => branches.iter().any(|b| eval_at(b, doc, ctx, depth - 1)),
        Node::Nor(branches) => !branches.iter().any(|b| eval_at(b, doc, ctx, depth - 1)),
        Node::Cond(cond) => cond
            .ops
            .iter()
            .all(|op| eval_op(op, doc, &cond.segments, ctx, depth)),
        Node::Where(operand) => ctx.where_fn.is_some_and(|f| f(operand, doc)),
        Node::Never => false,
    }
}

/// Comparison direction for the range operators.
#[derive(Clone, Copy)]
enum CmpOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A positive operator's terminal view, borrowing its operand.
enum Term<'a> {
    Eq(&'a EqOperand),
    Cmp(CmpOp, &'a Value),
    In(&'a [EqOperand]),
    Regex(Option<&'a Regex>),
    Mod { divisor: f64, remainder: f64 },
    Size(f64),
    ElemMatch(&'a Node),
    All(&'a [Value]),
}

impl Term<'_> {
    /// `$size` demands the array itself; every other operator also
    /// tries each element at the leaf.
    const fn fans_out_at_leaf(&self) -> bool {
        !matches!(self, Self::Size(_))
    }
}

fn eval_op(op: &CondOp, doc: &Value, segments: &[Segment], ctx: Ctx, depth: usize) -> bool {
    if depth == 0 {
        return false;
    }
    let term = match op {
        CondOp::Eq(operand) => Term::Eq(operand),
        CondOp::Ne(operand) => return !traverse(&Term::Eq(operand), Some(doc), segments, ctx, depth),
        CondOp::Gt(rhs) => Term::Cmp(CmpOp::Gt, rhs),
        CondOp::Gte(rhs) => Term::Cmp(CmpOp::Gte, rhs),
        CondOp::Lt(rhs) => Term::Cmp(CmpOp::Lt, rhs),
        CondOp::Lte(rhs) => Term::Cmp(CmpOp::Lte, rhs),
        CondOp::In(list) => Term::In(list),
        CondOp::Nin(list) => return !traverse(&Term::In(list), Some(doc), segments, ctx, depth),
        CondOp::Not(ops) => {
            return !ops
                .iter()
                .all(|sub| eval_op(sub, doc, segments, ctx, depth - 1));
        }
        CondOp::Regex(re) => Term::Regex(re.as_ref()),
        CondOp::Mod { divisor, remainder } => Term::Mod {
            divisor: *divisor,
            remainder: *remainder,
        },
        CondOp::Size(n) => Term::Size(*n),
        CondOp::ElemMatch(node) => Term::ElemMatch(node),
        CondOp::All(elems) => Term::All(elems),
        CondOp::Never => return false,
    };
    traverse(&term, Some(doc), segments, ctx, depth)
}

/// The shared traversal skeleton of every positive operator.
fn traverse(
    term: &Term,
    doc: Option<&Value>,
    segments: &[Segment],
    ctx: Ctx,
    depth: usize,
) -> bool {
    if depth == 0 {
        return false;
    }
    let Some(node) = doc else {
        return absent(term);
    };
    let Some((seg, rest)) = segments.split_first() else {
        if let Value::Array(elems) = node {
            if term.fans_out_at_leaf()
                && elems.iter().any(|elem| terminal(term, elem, ctx, depth - 1))
            {
                return true;
            }
        }
        return terminal(term, node, ctx, depth);
    };
    match node {
        // A map key always wins, even for digit segments.
        Value::Map(map) if map.contains_key(&seg.name) => {
            traverse(term, map.get(&seg.name), rest, ctx, depth - 1)
        }
        Value::Array(elems) => {
            if let Some(idx) = seg.index {
                if idx < elems.len() && traverse(term, Some(&elems[idx]), rest, ctx, depth - 1) {
                    return true;
                }
            }
            // Fan out over the elements with the path unchanged.
            elems
                .iter()
                .any(|elem| traverse(term, Some(elem), segments, ctx, depth - 1))
        }
        // Scalars and maps without the key: the path dead-ends here.
        _ => absent(term),
    }
}

/// Outcome when the path never reaches a value.
fn absent(term: &Term) -> bool {
    match term {
        Term::Eq(operand) => operand.value.is_null(),
        Term::Cmp(CmpOp::Gte | CmpOp::Lte, rhs) => rhs.is_null(),
        Term::In(list) => list.iter().any(|operand| operand.value.is_null()),
        _ => false,
    }
}

/// Apply an operator's terminal predicate to a reached leaf.
fn terminal(term: &Term, leaf: &Value, ctx: Ctx, depth: usize) -> bool {
    if depth == 0 {
        return false;
    }
    match term {
        Term::Eq(operand) => eq_leaf(leaf, operand),
        Term::Cmp(op, rhs) => {
            let Some(ordering) = value::compare(leaf, rhs) else {
                return false;
            };
            match op {
                CmpOp::Gt => ordering == Ordering::Greater,
                CmpOp::Gte => ordering != Ordering::Less,
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::Lte => ordering != Ordering::Greater,
            }
        }
        Term::In(list) => list.iter().any(|operand| eq_leaf(leaf, operand)),
        Term::Regex(Some(re)) => leaf.as_str().is_some_and(|s| re.is_match(s)),
        Term::Regex(None) => false,
        Term::Mod { divisor, remainder } => match leaf {
            Value::Number(n) => n.floor() % divisor.floor() == remainder.floor(),
            _ => false,
        },
        #[allow(clippy::cast_precision_loss)]
        Term::Size(want) => match leaf {
            Value::Array(elems) => elems.len() as f64 == want.trunc(),
            _ => false,
        },
        Term::ElemMatch(node) => leaf
            .as_array()
            .is_some_and(|elems| elems.iter().any(|elem| eval_at(node, elem, ctx, depth - 1))),
        Term::All(operands) => {
            let Value::Array(elems) = leaf else {
                return false;
            };
            operands.iter().all(|operand| {
                elems.iter().any(|elem| value::deep_eq(elem, operand))
                    || value::deep_eq(leaf, operand)
            })
        }
    }
}

/// Equality with the two layered exceptions: a regex operand also
/// matches string leaves as a pattern, and regex operands still equal
/// regex leaves structurally.
fn eq_leaf(leaf: &Value, operand: &EqOperand) -> bool {
    if let (Some(re), Value::String(s)) = (&operand.pattern, leaf) {
        if re.is_match(s) {
            return true;
        }
    }
    value::deep_eq(leaf, &operand.value)
}
