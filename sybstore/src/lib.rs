//! # sybstore — schema-less entity store over one managed Sybase-dialect connection
//!
//! Entities with arbitrary typed fields (numbers, booleans, dates, lists,
//! nested maps) are persisted to ordinary SQL tables. Type fidelity across
//! the text medium is preserved by a side-channel type-tag column; see
//! [`sybstore_sql`] for the marshalling and statement layers.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Store`] | CRUD facade: `save` (upsert), `load`, `list`, `remove`, `close` |
//! | [`ConnectionManager`] | The single connection handle plus transient/fatal classification and backoff reconnect |
//! | [`Driver`] / [`Connection`] | The call-level connectivity seam a real driver plugs into |
//! | [`SqlState`] | Driver-reported SQLSTATE with the recoverable set |
//! | [`ConnectSpec`] / [`StoreConfig`] | Connection string or config object, plus backoff bounds |
//! | [`testing`] | Scripted in-memory driver for tests |
//!
//! # Resilience model
//!
//! One connection, no pool. A driver failure with SQLSTATE `08001`, `08S01`
//! or `01002` is transient: the failing call still gets its error, but a
//! single background loop reopens the connection with exponential backoff
//! (16 ms doubling up to 65 336 ms, reset on success). Every other failure
//! is fatal and surfaced with its operation and table context.
//!
//! # Quick start
//!
//! ```ignore
//! use sybstore::{Store, StoreConfig};
//! use sybstore_entity::{Entity, EntityName, Query};
//!
//! let store = Store::connect(driver, "DRIVER={FreeTDS};DATABASE=app;").await?;
//!
//! let saved = store
//!     .save(&Entity::new(EntityName::parse("app/user")).with_field("name", "alice"))
//!     .await?;
//!
//! let found = store
//!     .load(saved.name(), Query::new().filter("id", saved.id().unwrap()))
//!     .await?;
//! ```

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod store;
pub mod testing;

pub use config::{ConnectSpec, StoreConfig, MAX_WAIT_MS, MIN_WAIT_MS};
pub use connection::ConnectionManager;
pub use driver::{Connection, Driver, DriverError, Outcome, SqlState};
pub use error::StoreError;
pub use store::Store;

pub mod prelude {
    //! Re-exports of the most commonly used store types.
    pub use crate::{ConnectSpec, Driver, Store, StoreConfig, StoreError};
    pub use sybstore_entity::prelude::*;
    pub use sybstore_sql::prelude::*;
}
