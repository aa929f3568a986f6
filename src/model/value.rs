//! Tagged attribute value — the universal value type on nodes and edges.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::AttrMap;

/// A typed attribute value.
///
/// Covers every shape the network formats carry:
/// - Scalars: Bool, Int, Float, Text
/// - Containers: List, Map
///
/// The serde representation is adjacently tagged so a document round-trip
/// preserves tag identity — an `Int(3)` never comes back as a `Float(3.0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<AttrValue>),
    Map(AttrMap),
}

// ============================================================================
// Type checking
// ============================================================================

impl AttrValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "BOOLEAN",
            AttrValue::Int(_) => "INTEGER",
            AttrValue::Float(_) => "FLOAT",
            AttrValue::Text(_) => "TEXT",
            AttrValue::List(_) => "LIST",
            AttrValue::Map(_) => "MAP",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, AttrValue::Int(_) | AttrValue::Float(_))
    }

    /// Attempt to extract as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempt to extract as i64. Floats with no fractional part coerce.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            AttrValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Attempt to extract as f64. Ints coerce losslessly.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(f) => Some(*f),
            AttrValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempt to extract as &str.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for AttrValue { fn from(v: bool) -> Self { AttrValue::Bool(v) } }
impl From<i32> for AttrValue { fn from(v: i32) -> Self { AttrValue::Int(v as i64) } }
impl From<i64> for AttrValue { fn from(v: i64) -> Self { AttrValue::Int(v) } }
impl From<f64> for AttrValue { fn from(v: f64) -> Self { AttrValue::Float(v) } }
impl From<String> for AttrValue { fn from(v: String) -> Self { AttrValue::Text(v) } }
impl From<&str> for AttrValue { fn from(v: &str) -> Self { AttrValue::Text(v.to_owned()) } }
impl From<AttrMap> for AttrValue { fn from(v: AttrMap) -> Self { AttrValue::Map(v) } }
impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(v: Vec<T>) -> Self { AttrValue::List(v.into_iter().map(Into::into).collect()) }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Text(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            AttrValue::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            AttrValue::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from() {
        assert_eq!(AttrValue::from("siding"), AttrValue::Text("siding".into()));
        assert_eq!(AttrValue::from(42), AttrValue::Int(42));
        assert_eq!(AttrValue::from(3.5), AttrValue::Float(3.5));
        assert_eq!(AttrValue::from(true), AttrValue::Bool(true));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(AttrValue::Int(2).as_float(), Some(2.0));
        assert_eq!(AttrValue::Float(2.0).as_int(), Some(2));
        assert_eq!(AttrValue::Float(2.5).as_int(), None);
        assert_eq!(AttrValue::Text("2".into()).as_float(), None);
    }

    #[test]
    fn test_tag_identity_round_trip() {
        // Int and Float with the same numeric value must keep their tags.
        let int_doc = serde_json::to_value(AttrValue::Int(3)).unwrap();
        let float_doc = serde_json::to_value(AttrValue::Float(3.0)).unwrap();
        assert_eq!(int_doc["type"], "Int");
        assert_eq!(float_doc["type"], "Float");

        let back: AttrValue = serde_json::from_value(int_doc).unwrap();
        assert_eq!(back, AttrValue::Int(3));
        let back: AttrValue = serde_json::from_value(float_doc).unwrap();
        assert_eq!(back, AttrValue::Float(3.0));
    }

    #[test]
    fn test_nested_round_trip() {
        let mut inner = AttrMap::new();
        inner.insert("lanes".into(), AttrValue::Int(2));
        let value = AttrValue::List(vec![AttrValue::Map(inner), AttrValue::Bool(false)]);

        let doc = serde_json::to_value(&value).unwrap();
        let back: AttrValue = serde_json::from_value(doc).unwrap();
        assert_eq!(back, value);
    }
}
