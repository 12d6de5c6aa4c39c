use crate::codec::{self, TypeTag, TYPE_COLUMN};
use crate::error::MarshalError;
use std::collections::BTreeMap;
use sybstore_entity::{Entity, EntityName, RawValue, Row};

/// An entity flattened to ordered `(column, literal)` pairs, ready for
/// statement synthesis. When any field needed a tag, the reserved
/// [`TYPE_COLUMN`] carrying the quoted JSON tag map is appended last.
#[derive(Debug, Clone, PartialEq)]
pub struct MarshalledRow {
    pub columns: Vec<(String, String)>,
}

impl MarshalledRow {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn literals(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(_, literal)| literal.as_str())
    }
}

/// Flatten an entity into column/literal pairs.
///
/// The id (when present) leads, fields follow in their map order, and the
/// column list and value list come from this one pass so they stay in
/// lock-step.
pub fn to_row(entity: &Entity) -> MarshalledRow {
    let mut columns = Vec::with_capacity(entity.fields().len() + 2);
    let mut tags: BTreeMap<&str, &'static str> = BTreeMap::new();

    if let Some(id) = entity.id() {
        columns.push(("id".to_string(), codec::quote(id)));
    }
    for (name, value) in entity.fields() {
        let encoded = codec::encode(value);
        if let Some(tag) = encoded.tag {
            tags.insert(name, tag.code());
        }
        columns.push((name.clone(), encoded.literal));
    }
    if !tags.is_empty() {
        let tag_json = serde_json::to_string(&tags).unwrap_or_else(|_| "{}".to_string());
        columns.push((TYPE_COLUMN.to_string(), codec::quote(&tag_json)));
    }

    MarshalledRow { columns }
}

/// Rebuild an entity of the requested kind from a result row.
///
/// `None` means "not found" and is not an error. A malformed or missing tag
/// column degrades to an empty tag map so one bad side-channel value cannot
/// fail the whole read.
pub fn from_row(name: &EntityName, row: Option<&Row>) -> Result<Option<Entity>, MarshalError> {
    let Some(row) = row else {
        return Ok(None);
    };

    let tags = read_tags(name, row);
    let mut entity = Entity::new(name.clone());

    for (column, raw) in row {
        if column == TYPE_COLUMN {
            continue;
        }
        if column == "id" {
            if let Some(id) = raw.as_text() {
                entity = entity.with_id(id);
            }
            continue;
        }
        let tag = tags.get(column.as_str()).copied();
        let value = codec::decode(raw, tag).map_err(|source| MarshalError::Column {
            column: column.clone(),
            source,
        })?;
        entity = entity.with_field(column.clone(), value);
    }

    Ok(Some(entity))
}

fn read_tags<'a>(name: &EntityName, row: &'a Row) -> BTreeMap<&'a str, TypeTag> {
    let Some(RawValue::Text(tag_json)) = row.get(TYPE_COLUMN) else {
        return BTreeMap::new();
    };
    match serde_json::from_str::<BTreeMap<&str, &str>>(tag_json) {
        Ok(codes) => codes
            .into_iter()
            .filter_map(|(field, code)| TypeTag::from_code(code).map(|tag| (field, tag)))
            .collect(),
        Err(err) => {
            tracing::warn!(entity = %name, error = %err, "malformed type-tag column, reading row untagged");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sybstore_entity::Value;

    fn date() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 7, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn sample() -> Entity {
        Entity::new(EntityName::parse("app/user"))
            .with_id("u1")
            .with_field("active", true)
            .with_field("age", 40)
            .with_field("created_at", date())
            .with_field("name", "O'Brien")
            .with_field("tags", vec![Value::Text("x".into()), Value::Text("y".into())])
    }

    /// Turn a marshalled literal back into what the driver would report for
    /// the stored column.
    fn raw_from_literal(literal: &str) -> RawValue {
        if literal == "null" {
            return RawValue::Null;
        }
        if let Some(inner) = literal
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
        {
            return RawValue::Text(inner.replace("''", "'"));
        }
        if let Ok(n) = literal.parse::<i64>() {
            return RawValue::Int(n);
        }
        if let Ok(n) = literal.parse::<f64>() {
            return RawValue::Float(n);
        }
        RawValue::Text(literal.to_string())
    }

    fn echo(row: &MarshalledRow) -> Row {
        row.columns
            .iter()
            .map(|(name, literal)| (name.clone(), raw_from_literal(literal)))
            .collect()
    }

    #[test]
    fn test_to_row_appends_tag_column() {
        let row = to_row(&sample());
        let names: Vec<_> = row.column_names().collect();
        assert_eq!(
            names,
            vec!["id", "active", "age", "created_at", "name", "tags", TYPE_COLUMN]
        );
        let tag_literal = &row.columns.last().unwrap().1;
        assert_eq!(
            tag_literal,
            "'{\"active\":\"b\",\"created_at\":\"d\",\"tags\":\"a\"}'"
        );
    }

    #[test]
    fn test_untagged_entity_has_no_tag_column() {
        let ent = Entity::new(EntityName::new("plain"))
            .with_id("p1")
            .with_field("n", 1)
            .with_field("s", "x");
        let row = to_row(&ent);
        assert!(row.column_names().all(|c| c != TYPE_COLUMN));
    }

    #[test]
    fn test_round_trip_preserves_types() {
        let original = sample();
        let echoed = echo(&to_row(&original));
        let rebuilt = from_row(original.name(), Some(&echoed)).unwrap().unwrap();

        assert_eq!(rebuilt.id(), Some("u1"));
        assert_eq!(rebuilt.field("active"), Some(&Value::Bool(true)));
        assert_eq!(rebuilt.field("age"), Some(&Value::Number(40.0)));
        assert_eq!(rebuilt.field("created_at"), Some(&Value::Date(date())));
        assert_eq!(rebuilt.field("name"), Some(&Value::Text("O'Brien".into())));
        assert_eq!(
            rebuilt.field("tags"),
            Some(&Value::List(vec![
                Value::Text("x".into()),
                Value::Text("y".into())
            ]))
        );
    }

    #[test]
    fn test_missing_row_is_none() {
        let got = from_row(&EntityName::new("user"), None).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn test_malformed_tag_column_degrades() {
        let row = Row::from([
            ("id".to_string(), RawValue::Text("u1".into())),
            ("name".to_string(), RawValue::Text("a".into())),
            (TYPE_COLUMN.to_string(), RawValue::Text("{broken".into())),
        ]);
        let ent = from_row(&EntityName::new("user"), Some(&row))
            .unwrap()
            .unwrap();
        assert_eq!(ent.field("name"), Some(&Value::Text("a".into())));
        assert!(ent.field(TYPE_COLUMN).is_none());
    }
}
