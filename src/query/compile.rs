/*!
# Query Compiler

Translates a raw query [`Value`] into the compiled [`Node`] tree.

Compilation is total by design: `test` must never raise, so every
malformed construct (a combinator whose argument is not a list, a
`$mod` that is not a two-number list, an unparsable regex pattern)
becomes a never-matching node. The validator reports those shapes as
errors; the compiler just makes them inert.
*/
use crate::query::ast::{build_regex, CondOp, Condition, EqOperand, Node};
use crate::query::path;
use crate::value::{Map, Value};

/// Is `key` one of the condition operators of the dialect?
pub(crate) fn is_condition_operator(key: &str) -> bool {
    crate::query::CONDITION_OPERATORS.contains(&key)
}

/// An expression is a plain non-empty map whose every key is a known
/// condition operator. Anything else in value position is an operand
/// and means implicit `$eq`.
pub(crate) fn is_expression(value: &Value) -> bool {
    value.as_map().is_some_and(is_expression_map)
}

fn is_expression_map(map: &Map) -> bool {
    !map.is_empty() && map.keys().all(|key| is_condition_operator(key))
}

/// Compile a query into its evaluation tree. Top-level clauses are an
/// implicit conjunction; a non-map query can never match.
pub(crate) fn compile(query: &Value) -> Node {
    let Value::Map(clauses) = query else {
        return Node::Never;
    };
    Node::And(
        clauses
            .iter()
            .map(|(key, operand)| compile_clause(key, operand))
            .collect(),
    )
}

fn compile_clause(key: &str, operand: &Value) -> Node {
    match key {
        "$and" => combinator(operand, Node::And),
        "$or" => combinator(operand, Node::Or),
        "$nor" => combinator(operand, Node::Nor),
        "$where" => Node::Where(operand.clone()),
        path => compile_condition(path, operand),
    }
}

fn combinator(operand: &Value, wrap: fn(Vec<Node>) -> Node) -> Node {
    match operand.as_array() {
        Some(branches) => wrap(branches.iter().map(compile).collect()),
        None => Node::Never,
    }
}

fn compile_condition(dotted: &str, operand: &Value) -> Node {
    let segments = path::split(dotted);
    let ops = match operand.as_map() {
        Some(expr) if is_expression_map(expr) => compile_expression(expr),
        _ => vec![CondOp::Eq(EqOperand::new(operand.clone()))],
    };
    Node::Cond(Condition { segments, ops })
}

fn compile_expression(expr: &Map) -> Vec<CondOp> {
    let mut ops = Vec::new();
    for (op, operand) in expr {
        match op.as_str() {
            "$eq" => ops.push(CondOp::Eq(EqOperand::new(operand.clone()))),
            "$ne" => ops.push(CondOp::Ne(EqOperand::new(operand.clone()))),
            "$gt" => ops.push(CondOp::Gt(operand.clone())),
            "$gte" => ops.push(CondOp::Gte(operand.clone())),
            "$lt" => ops.push(CondOp::Lt(operand.clone())),
            "$lte" => ops.push(CondOp::Lte(operand.clone())),
            "$in" => ops.push(compile_list(operand, CondOp::In)),
            "$nin" => ops.push(compile_list(operand, CondOp::Nin)),
            "$not" => ops.push(CondOp::Not(compile_negated(operand))),
            "$regex" => ops.push(compile_regex(expr, operand)),
            // Consumed as a modifier by "$regex" above.
            "$options" => {}
            "$mod" => ops.push(compile_mod(operand)),
            "$size" => ops.push(match operand {
                Value::Number(n) => CondOp::Size(*n),
                _ => CondOp::Never,
            }),
            "$elemMatch" => ops.push(compile_elem_match(operand)),
            "$all" => compile_all(operand, &mut ops),
            // Unreachable behind `is_expression_map`.
            _ => ops.push(CondOp::Never),
        }
    }
    ops
}

fn compile_list(operand: &Value, wrap: fn(Vec<EqOperand>) -> CondOp) -> CondOp {
    match operand.as_array() {
        Some(elems) => wrap(elems.iter().cloned().map(EqOperand::new).collect()),
        None => CondOp::Never,
    }
}

/// `$not` negates a whole sub-expression; a bare operand (a literal or
/// a regex) negates the implicit equality on it.
fn compile_negated(operand: &Value) -> Vec<CondOp> {
    match operand.as_map() {
        Some(sub) if is_expression_map(sub) => compile_expression(sub),
        _ => vec![CondOp::Eq(EqOperand::new(operand.clone()))],
    }
}

/// Fuse `$regex` with any sibling `$options`. A string `$options`
/// replaces the flags of a regex-valued operand; otherwise the operand
/// keeps its own flags (a string pattern has none).
fn compile_regex(expr: &Map, operand: &Value) -> CondOp {
    let (pattern, own_flags) = match operand {
        Value::String(pattern) => (pattern.as_str(), ""),
        Value::Regex(pattern, flags) => (pattern.as_str(), flags.as_str()),
        _ => return CondOp::Never,
    };
    let flags = match expr.get("$options") {
        Some(Value::String(options)) => options.as_str(),
        _ => own_flags,
    };
    CondOp::Regex(build_regex(pattern, flags))
}

fn compile_mod(operand: &Value) -> CondOp {
    match operand.as_array() {
        Some([Value::Number(divisor), Value::Number(remainder)]) => CondOp::Mod {
            divisor: *divisor,
            remainder: *remainder,
        },
        _ => CondOp::Never,
    }
}

/// `$elemMatch` takes either an expression applied to each element
/// directly or a full sub-query over element fields.
fn compile_elem_match(operand: &Value) -> CondOp {
    match operand.as_map() {
        Some(sub) if is_expression_map(sub) => {
            CondOp::ElemMatch(Box::new(Node::Cond(Condition {
                segments: Vec::new(),
                ops: compile_expression(sub),
            })))
        }
        Some(_) => CondOp::ElemMatch(Box::new(compile(operand))),
        None => CondOp::Never,
    }
}

/// `$all` has two forms. When every list element is a map carrying
/// `$elemMatch`, the operator is the conjunction of those element
/// matches at the same path (each must find a matching member, not
/// necessarily the same one). Otherwise the list is matched by deep
/// equality against the leaf array.
fn compile_all(operand: &Value, ops: &mut Vec<CondOp>) {
    let Some(elems) = operand.as_array() else {
        ops.push(CondOp::Never);
        return;
    };
    if elems.is_empty() {
        ops.push(CondOp::Never);
        return;
    }
    let elem_match_form = elems
        .iter()
        .all(|elem| elem.as_map().is_some_and(|m| m.contains_key("$elemMatch")));
    if elem_match_form {
        for elem in elems {
            match elem.as_map() {
                Some(sub) if is_expression_map(sub) => ops.extend(compile_expression(sub)),
                _ => ops.push(CondOp::Eq(EqOperand::new(elem.clone()))),
            }
        }
    } else {
        ops.push(CondOp::All(elems.to_vec()));
    }
}
