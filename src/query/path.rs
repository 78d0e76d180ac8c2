/*!
# Dotted Paths

Splits dotted path strings like `"orders.0.total"` into segments. A
segment made entirely of ASCII digits is an *index candidate*: it may
address an array position or a map key of that textual form, and the
traversal decides which per node it visits.
*/

/// One step of a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The literal segment text, used for map lookups.
    pub name: String,
    /// Parsed array index when the text is all digits.
    pub index: Option<usize>,
}

impl Segment {
    fn new(name: &str) -> Self {
        let index = if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            // Overlong digit runs (beyond usize) can only be map keys.
            name.parse().ok()
        } else {
            None
        };
        Self {
            name: name.to_string(),
            index,
        }
    }
}

/// Split a dotted path into segments. Empty segments are kept literally,
/// so `"a..b"` addresses the key `""` between `"a"` and `"b"`.
#[must_use]
pub fn split(path: &str) -> Vec<Segment> {
    path.split('.').map(Segment::new).collect()
}
