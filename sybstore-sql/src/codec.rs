use crate::error::CodecError;
use chrono::NaiveDateTime;
use sybstore_entity::{RawValue, Value, SYBASE_DATE_FORMAT};

/// Reserved column holding the JSON-serialized type-tag map for one row.
/// Tables provisioned for this store must carry it.
pub const TYPE_COLUMN: &str = "seneca";

/// Side-channel tag for a field whose native column type cannot
/// self-describe the original value. Untagged fields read back as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Object,
    Array,
    Date,
    Boolean,
    Number,
}

impl TypeTag {
    /// Single-letter wire code stored in the reserved column.
    pub fn code(self) -> &'static str {
        match self {
            TypeTag::Object => "o",
            TypeTag::Array => "a",
            TypeTag::Date => "d",
            TypeTag::Boolean => "b",
            TypeTag::Number => "n",
        }
    }

    pub fn from_code(code: &str) -> Option<TypeTag> {
        match code {
            "o" => Some(TypeTag::Object),
            "a" => Some(TypeTag::Array),
            "d" => Some(TypeTag::Date),
            "b" => Some(TypeTag::Boolean),
            "n" => Some(TypeTag::Number),
            _ => None,
        }
    }
}

/// One encoded field: the exact SQL literal text plus the tag, when the
/// column type alone cannot restore the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub literal: String,
    pub tag: Option<TypeTag>,
}

impl Encoded {
    fn plain(literal: String) -> Self {
        Self { literal, tag: None }
    }

    fn tagged(literal: String, tag: TypeTag) -> Self {
        Self {
            literal,
            tag: Some(tag),
        }
    }
}

/// Encode one value to its SQL literal form.
///
/// Numbers stay unquoted decimal text; booleans become `1`/`0` (the dialect
/// has no native boolean); dates take the dialect layout; lists and maps are
/// quoted JSON; nulls are the bare keyword; everything else is quoted text.
pub fn encode(value: &Value) -> Encoded {
    match value {
        Value::Null => Encoded::plain("null".to_string()),
        Value::Number(n) => Encoded::plain(format_number(*n)),
        Value::Bool(b) => {
            Encoded::tagged(if *b { "1" } else { "0" }.to_string(), TypeTag::Boolean)
        }
        Value::Date(d) => Encoded::tagged(
            quote(&d.format(SYBASE_DATE_FORMAT).to_string()),
            TypeTag::Date,
        ),
        Value::List(_) => Encoded::tagged(quote(&json_text(value)), TypeTag::Array),
        Value::Map(_) => Encoded::tagged(quote(&json_text(value)), TypeTag::Object),
        Value::Text(s) => Encoded::plain(quote(s)),
    }
}

/// Render a value for a WHERE condition: numbers and booleans unquoted
/// (booleans as 1/0), everything else with the same quoting as [`encode`].
pub fn where_literal(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        other => encode(other).literal,
    }
}

/// Decode a raw driver value back into a typed [`Value`] using its tag.
pub fn decode(raw: &RawValue, tag: Option<TypeTag>) -> Result<Value, CodecError> {
    match tag {
        Some(TypeTag::Object) | Some(TypeTag::Array) => match raw {
            RawValue::Null => Ok(Value::Null),
            RawValue::Text(s) => serde_json::from_str(s)
                .map(Value::from_json)
                .map_err(CodecError::Json),
            _ => Err(CodecError::UnexpectedRaw { tag: "json" }),
        },
        Some(TypeTag::Boolean) => Ok(Value::Bool(matches!(
            raw,
            RawValue::Text(s) if s == "1"
        ) || matches!(raw, RawValue::Int(1)))),
        Some(TypeTag::Date) => match raw {
            RawValue::Null => Ok(Value::Null),
            RawValue::Text(s) => {
                // Tagged dates come back in the dialect layout; anything else
                // passes through as text.
                Ok(NaiveDateTime::parse_from_str(s, SYBASE_DATE_FORMAT)
                    .map(Value::Date)
                    .unwrap_or_else(|_| Value::Text(s.clone())))
            }
            _ => Err(CodecError::UnexpectedRaw { tag: "date" }),
        },
        Some(TypeTag::Number) | None => Ok(passthrough(raw)),
    }
}

fn passthrough(raw: &RawValue) -> Value {
    match raw {
        RawValue::Null => Value::Null,
        RawValue::Int(n) => Value::Number(*n as f64),
        RawValue::Float(n) => Value::Number(*n),
        RawValue::Text(s) => Value::Text(s.clone()),
    }
}

/// Quote text for inclusion in a statement, doubling embedded single quotes.
/// This is the sole injection defense; literals are inlined, never bound.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn format_number(n: f64) -> String {
    if !n.is_finite() {
        // Non-finite numbers have no SQL literal form.
        return "null".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 9e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn json_text(value: &Value) -> String {
    serde_json::to_string(&value.to_json()).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 7, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_encode_number_unquoted_untagged() {
        let e = encode(&Value::Number(42.0));
        assert_eq!(e.literal, "42");
        assert_eq!(e.tag, None);
        assert_eq!(encode(&Value::Number(1.5)).literal, "1.5");
    }

    #[test]
    fn test_encode_bool_as_bit() {
        let e = encode(&Value::Bool(true));
        assert_eq!(e.literal, "1");
        assert_eq!(e.tag, Some(TypeTag::Boolean));
        assert_eq!(encode(&Value::Bool(false)).literal, "0");
    }

    #[test]
    fn test_encode_date_dialect_layout() {
        let e = encode(&Value::Date(date()));
        assert_eq!(e.literal, "'2014-07-01 09:30:00'");
        assert_eq!(e.tag, Some(TypeTag::Date));
    }

    #[test]
    fn test_encode_list_and_map_as_json() {
        let e = encode(&Value::List(vec![Value::Text("x".into()), Value::Number(1.0)]));
        assert_eq!(e.literal, "'[\"x\",1.0]'");
        assert_eq!(e.tag, Some(TypeTag::Array));

        let m = encode(&Value::Map(BTreeMap::from([(
            "k".to_string(),
            Value::Bool(true),
        )])));
        assert_eq!(m.literal, "'{\"k\":true}'");
        assert_eq!(m.tag, Some(TypeTag::Object));
    }

    #[test]
    fn test_encode_null_and_text() {
        assert_eq!(encode(&Value::Null).literal, "null");
        assert_eq!(encode(&Value::Null).tag, None);
        let e = encode(&Value::Text("hello".into()));
        assert_eq!(e.literal, "'hello'");
        assert_eq!(e.tag, None);
    }

    #[test]
    fn test_encode_is_idempotent() {
        let v = Value::Text("O'Brien".into());
        assert_eq!(encode(&v), encode(&v));
    }

    #[test]
    fn test_quote_doubles_embedded_quotes() {
        assert_eq!(quote("O'Brien"), "'O''Brien'");
        assert_eq!(quote("'; DROP TABLE user; --"), "'''; DROP TABLE user; --'");
    }

    #[test]
    fn test_where_literal_number_and_bool_unquoted() {
        assert_eq!(where_literal(&Value::Number(7.0)), "7");
        assert_eq!(where_literal(&Value::Bool(true)), "1");
        assert_eq!(where_literal(&Value::Text("x".into())), "'x'");
    }

    #[test]
    fn test_decode_tagged_json() {
        let v = decode(&RawValue::Text("[\"x\",1.0]".into()), Some(TypeTag::Array)).unwrap();
        assert_eq!(v, Value::List(vec![Value::Text("x".into()), Value::Number(1.0)]));
    }

    #[test]
    fn test_decode_bad_json_is_error() {
        let err = decode(&RawValue::Text("{not json".into()), Some(TypeTag::Object));
        assert!(matches!(err, Err(CodecError::Json(_))));
    }

    #[test]
    fn test_decode_boolean_one_is_true() {
        assert_eq!(
            decode(&RawValue::Text("1".into()), Some(TypeTag::Boolean)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            decode(&RawValue::Int(1), Some(TypeTag::Boolean)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            decode(&RawValue::Text("0".into()), Some(TypeTag::Boolean)).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_decode_date_restores_value() {
        assert_eq!(
            decode(&RawValue::Text("2014-07-01 09:30:00".into()), Some(TypeTag::Date)).unwrap(),
            Value::Date(date())
        );
        // Unparseable date text survives as text rather than failing the read.
        assert_eq!(
            decode(&RawValue::Text("garbage".into()), Some(TypeTag::Date)).unwrap(),
            Value::Text("garbage".into())
        );
    }

    #[test]
    fn test_decode_untagged_passes_through() {
        assert_eq!(decode(&RawValue::Int(3), None).unwrap(), Value::Number(3.0));
        assert_eq!(
            decode(&RawValue::Text("x".into()), None).unwrap(),
            Value::Text("x".into())
        );
        assert_eq!(decode(&RawValue::Null, None).unwrap(), Value::Null);
    }

    #[test]
    fn test_injection_round_trip() {
        let original = "Robert'); DROP TABLE students;--";
        let e = encode(&Value::Text(original.into()));
        // The literal is one self-contained quoted token.
        assert!(e.literal.starts_with('\'') && e.literal.ends_with('\''));
        assert!(!e.literal[1..e.literal.len() - 1]
            .replace("''", "")
            .contains('\''));
        // Simulate the driver echoing back the stored text.
        let stored = e.literal[1..e.literal.len() - 1].replace("''", "'");
        assert_eq!(
            decode(&RawValue::Text(stored), None).unwrap(),
            Value::Text(original.into())
        );
    }
}
