//! Metadata value types.
//!
//! Document metadata is a tagged union rather than a dynamically typed value:
//! a primitive, or an ordered list of primitives. No nesting. Equality for
//! filtering purposes is always by the canonical string form.

/// A single metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaPrimitive {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl MetaPrimitive {
    /// The canonical string form used to key the field index and to compare
    /// filter values against it.
    pub fn to_canonical_string(&self) -> String {
        match self {
            MetaPrimitive::Str(s) => s.clone(),
            MetaPrimitive::Int(i) => i.to_string(),
            MetaPrimitive::Float(v) => v.to_string(),
            MetaPrimitive::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for MetaPrimitive {
    fn from(s: &str) -> Self {
        MetaPrimitive::Str(s.to_string())
    }
}
impl From<String> for MetaPrimitive {
    fn from(s: String) -> Self {
        MetaPrimitive::Str(s)
    }
}
impl From<i64> for MetaPrimitive {
    fn from(v: i64) -> Self {
        MetaPrimitive::Int(v)
    }
}
impl From<f64> for MetaPrimitive {
    fn from(v: f64) -> Self {
        MetaPrimitive::Float(v)
    }
}
impl From<bool> for MetaPrimitive {
    fn from(v: bool) -> Self {
        MetaPrimitive::Bool(v)
    }
}

/// A metadata entry: either a single value or an ordered list of values.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Primitive(MetaPrimitive),
    List(Vec<MetaPrimitive>),
}

impl MetaValue {
    /// Canonical strings contributed by this value to the field index: one
    /// for a primitive, one per element for a list.
    pub fn canonical_strings(&self) -> Vec<String> {
        match self {
            MetaValue::Primitive(p) => vec![p.to_canonical_string()],
            MetaValue::List(items) => items.iter().map(|p| p.to_canonical_string()).collect(),
        }
    }
}

impl<T: Into<MetaPrimitive>> From<T> for MetaValue {
    fn from(v: T) -> Self {
        MetaValue::Primitive(v.into())
    }
}

impl From<Vec<MetaPrimitive>> for MetaValue {
    fn from(items: Vec<MetaPrimitive>) -> Self {
        MetaValue::List(items)
    }
}
