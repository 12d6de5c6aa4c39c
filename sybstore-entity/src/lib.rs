//! # sybstore-entity — schema-less entity model
//!
//! The data model shared by the SQL layer and the store runtime:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Value`] | Sum type over the field domain (null, bool, number, text, date, list, map) |
//! | [`Entity`] | Immutable record snapshot: name + optional id + ordered field map |
//! | [`EntityName`] | Namespace/base pair, rendered to a table name |
//! | [`Query`] | Equality filters, optional sort, optional limit, bulk-delete flag |
//! | [`Row`] / [`RawValue`] | What a call-level driver hands back for one result row |
//!
//! Entities are snapshots: builder-style constructors consume and return
//! `self`, mutation means producing a new value.

pub mod entity;
pub mod query;
pub mod row;
pub mod value;

pub use entity::{Entity, EntityName};
pub use query::{Direction, Query, Sort};
pub use row::{RawValue, Row};
pub use value::{Value, SYBASE_DATE_FORMAT};

pub mod prelude {
    //! Re-exports of the most commonly used model types.
    pub use crate::{Direction, Entity, EntityName, Query, RawValue, Row, Sort, Value};
}
