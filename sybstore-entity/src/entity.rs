use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The name of an entity kind: an optional namespace plus a base name.
///
/// `"app/user"` maps to the table `app_user`; a bare `"user"` maps to
/// `user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityName {
    namespace: Option<String>,
    base: String,
}

impl EntityName {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            namespace: None,
            base: base.into(),
        }
    }

    pub fn namespaced(namespace: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            base: base.into(),
        }
    }

    /// Parse `"namespace/base"` or a bare `"base"`.
    pub fn parse(name: &str) -> Self {
        match name.split_once('/') {
            Some((ns, base)) if !ns.is_empty() => Self::namespaced(ns, base),
            _ => Self::new(name),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The table backing this entity kind.
    pub fn table_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}_{}", self.base),
            _ => self.base.clone(),
        }
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => write!(f, "{ns}/{}", self.base),
            _ => write!(f, "{}", self.base),
        }
    }
}

/// A schema-less record snapshot.
///
/// Identity is the `(name, id)` pair. Fields are an ordered name → [`Value`]
/// map; the column list and value list of a statement are produced from one
/// iteration over it, so they stay in lock-step.
///
/// Builder-style constructors consume `self` and return a new snapshot:
///
/// ```
/// use sybstore_entity::{Entity, EntityName};
///
/// let user = Entity::new(EntityName::parse("app/user"))
///     .with_field("name", "alice")
///     .with_field("active", true);
/// assert!(user.id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    name: EntityName,
    id: Option<String>,
    suggested_id: Option<String>,
    fields: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(name: EntityName) -> Self {
        Self {
            name,
            id: None,
            suggested_id: None,
            fields: BTreeMap::new(),
        }
    }

    /// Set the id. Save treats an entity with an id as an update.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Suggest an id for the insert path without marking the entity as
    /// already persisted. Save honors the suggestion instead of generating
    /// one.
    pub fn with_suggested_id(mut self, id: impl Into<String>) -> Self {
        self.suggested_id = Some(id.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn suggested_id(&self) -> Option<&str> {
        self.suggested_id.as_deref()
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn table_name(&self) -> String {
        self.name.table_name()
    }
}
