/*!
# Document Value Model

Defines the [`Value`] sum type that both documents and queries are made
of: null, booleans, double-precision numbers, strings, regular
expressions, ordered arrays, and insertion-ordered maps. Additionally
provides the structural deep-equality and the cross-type comparison
order used by the range operators.

Values convert losslessly from [`serde_json::Value`] (object key order
is preserved) and can be parsed straight from JSON text:

```
use jsonmatch::value::Value;

let doc: Value = r#"{"name": "ada", "tags": ["math", "engines"]}"#
    .try_into()
    .expect("valid JSON");
assert!(matches!(doc, Value::Map(_)));
```
*/
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cmp::Ordering;

/// Insertion-ordered map underlying [`Value::Map`]. Iteration yields
/// entries in insertion order, which the ordered map comparison relies
/// on.
pub type Map = IndexMap<String, Value>;

/// Nesting ceiling for every recursive walk over values (equality,
/// ordering, and query traversal). Past this depth the walk reports a
/// non-match instead of exhausting the host stack.
pub(crate) const MAX_DEPTH: usize = 128;

/// A dynamically-shaped document value.
#[derive(Debug, Clone)]
pub enum Value {
    /// JSON `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Double-precision number; integers are exact up to 2^53
    Number(f64),
    /// UTF-8 string
    String(String),
    /// Regular expression as `(pattern, flags)`. Patterns are compiled
    /// lazily by the query compiler, never here.
    Regex(String, String),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Insertion-ordered string-keyed map
    Map(Map),
}

impl Value {
    /// Construct a regex value from a pattern and a flag string (e.g.
    /// `"im"`).
    pub fn regex<P: Into<String>, F: Into<String>>(pattern: P, flags: F) -> Self {
        Self::Regex(pattern.into(), flags.into())
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the elements if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(elems) => Some(elems),
            _ => None,
        }
    }

    /// Borrow the entries if this is a map.
    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the string contents if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Compute the nesting depth of the value.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Array(elems) => 1 + elems.iter().map(Value::depth).max().unwrap_or(0),
            Self::Map(map) => 1 + map.values().map(Value::depth).max().unwrap_or(0),
            _ => 1,
        }
    }

    /// Convert to compact JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Convert to pretty-printed JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            // NOTE: arbitrary-precision numbers outside the f64 range
            // degrade to NaN and never match anything.
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(elems) => {
                Self::Array(elems.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, val)| (key, Value::from(val)))
                    .collect(),
            ),
        }
    }
}

// `TryFrom` over `From` since the input text may be malformed.
impl TryFrom<&str> for Value {
    type Error = serde_json::Error;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        let parsed: serde_json::Value = serde_json::from_str(text)?;
        Ok(parsed.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(elems: Vec<T>) -> Self {
        Self::Array(elems.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            // Integral numbers print without a trailing ".0".
            #[allow(clippy::cast_possible_truncation)]
            Self::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 9.007_199_254_740_992e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Self::String(s) => serializer.serialize_str(s),
            Self::Regex(pattern, flags) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("$regex", pattern)?;
                map.serialize_entry("$options", flags)?;
                map.end()
            }
            Self::Array(elems) => {
                let mut seq = serializer.serialize_seq(Some(elems.len()))?;
                for elem in elems {
                    seq.serialize_element(elem)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, val) in entries {
                    map.serialize_entry(key, val)?;
                }
                map.end()
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep_eq(self, other)
    }
}

/// Structural deep equality over values.
///
/// Map equality ignores insertion order but requires equal key sets and
/// equal values; array equality requires equal length and element-wise
/// equality in order; regexes are equal when both pattern and flags are
/// equal. Numbers compare by IEEE equality, so `NaN` never equals
/// itself.
#[must_use]
pub fn deep_eq(a: &Value, b: &Value) -> bool {
    eq_at(a, b, MAX_DEPTH)
}

fn eq_at(a: &Value, b: &Value, depth: usize) -> bool {
    if depth == 0 {
        return false;
    }
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Regex(xp, xf), Value::Regex(yp, yf)) => xp == yp && xf == yf,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| eq_at(x, y, depth - 1))
        }
        (Value::Map(xs), Value::Map(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| eq_at(x, y, depth - 1)))
        }
        _ => false,
    }
}

/// The comparison order behind `$gt`/`$gte`/`$lt`/`$lte`.
///
/// Within-type comparisons are defined for numbers (numeric), strings
/// (lexicographic by code units), null (equal only to null), arrays
/// (element-wise lexicographic, the shorter side is less), and maps
/// (lexicographic over insertion-ordered key/value pairs, the side that
/// exhausts its keys first is less). Equal booleans and equal regexes
/// compare as equal. Every other pairing is incomparable and returns
/// `None`, which the range operators report as a non-match.
#[must_use]
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    compare_at(a, b, MAX_DEPTH)
}

fn compare_at(a: &Value, b: &Value, depth: usize) -> Option<Ordering> {
    if depth == 0 {
        return None;
    }
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => (x == y).then_some(Ordering::Equal),
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Regex(xp, xf), Value::Regex(yp, yf)) => {
            (xp == yp && xf == yf).then_some(Ordering::Equal)
        }
        (Value::Array(xs), Value::Array(ys)) => {
            for i in 0..xs.len().max(ys.len()) {
                match (xs.get(i), ys.get(i)) {
                    (None, Some(_)) => return Some(Ordering::Less),
                    (Some(_), None) => return Some(Ordering::Greater),
                    (Some(x), Some(y)) => match compare_at(x, y, depth - 1)? {
                        Ordering::Equal => {}
                        unequal => return Some(unequal),
                    },
                    (None, None) => unreachable!("loop bounded by max length"),
                }
            }
            Some(Ordering::Equal)
        }
        (Value::Map(xs), Value::Map(ys)) => {
            let mut left = xs.iter();
            let mut right = ys.iter();
            loop {
                match (left.next(), right.next()) {
                    (None, None) => return Some(Ordering::Equal),
                    (None, Some(_)) => return Some(Ordering::Less),
                    (Some(_), None) => return Some(Ordering::Greater),
                    (Some((xk, xv)), Some((yk, yv))) => {
                        match xk.as_str().cmp(yk.as_str()) {
                            Ordering::Equal => {}
                            unequal => return Some(unequal),
                        }
                        match compare_at(xv, yv, depth - 1)? {
                            Ordering::Equal => {}
                            unequal => return Some(unequal),
                        }
                    }
                }
            }
        }
        _ => None,
    }
}
