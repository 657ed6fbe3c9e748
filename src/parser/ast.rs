// Abstract syntax for axis path expressions

use std::fmt;

/// A single step into a JSON value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member access (`.name` or `["name"]`)
    Field(String),
    /// Positional access into an array (`[3]`)
    Index(usize),
}

/// A parsed path such as `root[].items.price` or `root.data.rows[].total`.
///
/// Everything before the array marker locates the array to iterate; everything
/// after it is read from each element. A path without a marker addresses the
/// array directly and uses each element as the value.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    /// Original text, kept for diagnostics
    pub source: String,
    /// Steps from the root value to the record array
    pub array_path: Vec<Segment>,
    /// Steps from one record to the addressed value
    pub item_path: Vec<Segment>,
    /// Whether the expression carried an explicit `[]` marker
    pub has_marker: bool,
}

impl PathExpr {
    /// Name used to cross-reference records between axes: the last field step.
    pub fn field_name(&self) -> Option<&str> {
        self.item_path
            .iter()
            .rev()
            .chain(self.array_path.iter().rev())
            .find_map(|s| match s {
                Segment::Field(name) => Some(name.as_str()),
                Segment::Index(_) => None,
            })
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
