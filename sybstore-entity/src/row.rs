use std::collections::BTreeMap;

/// A raw column value as a call-level driver reports it.
///
/// Drivers for this dialect only ever hand back nulls, integers, floats, or
/// text; everything richer is reconstructed by the codec from the type-tag
/// side channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Int(n)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Float(n)
    }
}

/// One result row: column name → raw driver value. One column may be the
/// reserved type-tag column.
pub type Row = BTreeMap<String, RawValue>;
