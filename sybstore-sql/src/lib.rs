//! # sybstore-sql — Sybase-dialect marshalling and statement synthesis
//!
//! The pure half of the store: no connection, no runtime, just text in and
//! text out, so every path here is unit-testable without a database.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`codec`] | One field value ↔ SQL literal, plus the [`TypeTag`] side channel |
//! | [`marshal`] | Entity ↔ row: ordered column/literal pairs and the reserved tag column |
//! | [`statement`] | Structured SELECT/INSERT/UPDATE/DELETE, rendered to text at the edge |
//!
//! # Dialect conventions
//!
//! Sybase has no native boolean (`1`/`0` with a `b` tag) and rejects
//! ISO-8601 dates (`'YYYY-MM-DD HH:mm:ss'` with a `d` tag). Lists and maps
//! travel as quoted JSON. The reserved `seneca` column records, per row,
//! which fields need their original type restored on read; untagged columns
//! read back as-is.
//!
//! Literals are inlined, never bound: the codec's single-quote escaping is
//! the injection defense and is covered by adversarial tests.

pub mod codec;
pub mod error;
pub mod marshal;
pub mod statement;

pub use codec::{Encoded, TypeTag, TYPE_COLUMN};
pub use error::{CodecError, MarshalError, StatementError};
pub use marshal::MarshalledRow;
pub use statement::Statement;

pub mod prelude {
    //! Re-exports of the most commonly used SQL-layer types.
    pub use crate::{MarshalledRow, Statement, TypeTag, TYPE_COLUMN};
}
