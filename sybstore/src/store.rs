use crate::config::ConnectSpec;
use crate::connection::ConnectionManager;
use crate::driver::Driver;
use crate::error::StoreError;
use sybstore_entity::{Entity, EntityName, Query};
use sybstore_sql::{marshal, Statement};

/// The store facade: CRUD over one managed connection.
///
/// `save` is an upsert — insert when the entity has no id (generating one),
/// update otherwise. `load` is "first match or `None`". All operations run
/// one statement at a time over the single connection.
///
/// ```ignore
/// let store = Store::connect(driver, "DRIVER={FreeTDS};DATABASE=app;").await?;
/// let saved = store
///     .save(&Entity::new(EntityName::parse("app/user")).with_field("name", "alice"))
///     .await?;
/// assert!(saved.id().is_some());
/// ```
pub struct Store<D: Driver> {
    manager: ConnectionManager<D>,
}

impl<D: Driver> std::fmt::Debug for Store<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl<D: Driver> Store<D> {
    /// Open the store over one driver connection.
    pub async fn connect(driver: D, spec: impl Into<ConnectSpec>) -> Result<Self, StoreError> {
        let manager = ConnectionManager::new(driver, spec.into());
        manager.connect().await?;
        Ok(Self { manager })
    }

    /// Upsert one entity and echo it back with its (possibly assigned) id.
    pub async fn save(&self, entity: &Entity) -> Result<Entity, StoreError> {
        let table = entity.table_name();
        if entity.id().is_some() {
            let stmt = Statement::update(entity)?;
            self.manager
                .execute("save/update", &table, &stmt.render())
                .await?;
            tracing::debug!(table, id = entity.id(), "save/update");
            Ok(entity.clone())
        } else {
            let id = entity
                .suggested_id()
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let entity = entity.clone().with_id(id);
            let stmt = Statement::insert(&entity)?;
            self.manager
                .execute("save/insert", &table, &stmt.render())
                .await?;
            tracing::debug!(table, id = entity.id(), "save/insert");
            Ok(entity)
        }
    }

    /// First entity matching the query, or `None`. The result limit is
    /// forced to 1 regardless of what the query carries.
    pub async fn load(
        &self,
        name: &EntityName,
        query: Query,
    ) -> Result<Option<Entity>, StoreError> {
        let table = name.table_name();
        let stmt = Statement::select(name, &query.limit(1))?;
        let rows = self
            .manager
            .execute("load", &table, &stmt.render())
            .await?
            .into_rows();
        let entity = marshal::from_row(name, rows.first()).map_err(|source| {
            StoreError::Marshal {
                op: "load",
                table: table.clone(),
                source,
            }
        })?;
        tracing::debug!(table, found = entity.is_some(), "load");
        Ok(entity)
    }

    /// All entities matching the query, in result-set order.
    pub async fn list(&self, name: &EntityName, query: &Query) -> Result<Vec<Entity>, StoreError> {
        let table = name.table_name();
        let stmt = Statement::select(name, query)?;
        let rows = self
            .manager
            .execute("list", &table, &stmt.render())
            .await?
            .into_rows();
        let mut entities = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(entity) =
                marshal::from_row(name, Some(row)).map_err(|source| StoreError::Marshal {
                    op: "list",
                    table: table.clone(),
                    source,
                })?
            {
                entities.push(entity);
            }
        }
        tracing::debug!(table, count = entities.len(), "list");
        Ok(entities)
    }

    /// Delete matching rows, returning the affected-row count. An empty
    /// filter set requires explicit bulk intent ([`Query::match_all`]) —
    /// that combination deliberately removes every row in the table.
    pub async fn remove(&self, name: &EntityName, query: &Query) -> Result<u64, StoreError> {
        let table = name.table_name();
        let stmt = Statement::delete(name, query)?;
        let outcome = self
            .manager
            .execute("remove", &table, &stmt.render())
            .await?;
        tracing::debug!(table, affected = outcome.affected(), "remove");
        Ok(outcome.affected())
    }

    /// Close the connection. A close failure is reported, but the handle is
    /// released either way.
    pub async fn close(&self) -> Result<(), StoreError> {
        self.manager.close().await
    }

    pub async fn is_connected(&self) -> bool {
        self.manager.is_connected().await
    }
}
