use crate::codec;
use crate::error::StatementError;
use crate::marshal;
use sybstore_entity::{Direction, Entity, EntityName, Query};

/// A statement as structured parts, rendered to text at the last step so
/// synthesis stays unit-testable without a live database.
///
/// Values are always inlined as escaped literals; this dialect's call-level
/// drivers take statement text, not bound parameters. The codec's quoting is
/// the injection defense.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select {
        table: String,
        conditions: Vec<(String, String)>,
        order: Option<(String, Direction)>,
        limit: Option<u64>,
    },
    Insert {
        table: String,
        columns: Vec<(String, String)>,
    },
    Update {
        table: String,
        assignments: Vec<(String, String)>,
        id_literal: String,
    },
    Delete {
        table: String,
        conditions: Vec<(String, String)>,
    },
}

impl Statement {
    /// `SELECT * FROM <table> [WHERE ...] [ORDER BY ...] [LIMIT n]`.
    pub fn select(name: &EntityName, query: &Query) -> Result<Statement, StatementError> {
        let table = checked_table(name)?;
        let conditions = where_conditions(query)?;
        let order = match query.sort_spec() {
            Some(sort) => {
                check_identifier(&sort.field, "column")?;
                Some((sort.field.clone(), sort.direction))
            }
            None => None,
        };
        Ok(Statement::Select {
            table,
            conditions,
            order,
            limit: query.result_limit(),
        })
    }

    /// `INSERT INTO <table> (cols) VALUES (lits)`, columns and literals in
    /// lock-step from one marshalling pass.
    pub fn insert(entity: &Entity) -> Result<Statement, StatementError> {
        let table = checked_table(entity.name())?;
        let row = marshal::to_row(entity);
        for (column, _) in &row.columns {
            check_identifier(column, "column")?;
        }
        Ok(Statement::Insert {
            table,
            columns: row.columns,
        })
    }

    /// `UPDATE <table> SET ... WHERE id=<id>`, with `id` excluded from the
    /// SET list.
    pub fn update(entity: &Entity) -> Result<Statement, StatementError> {
        let table = checked_table(entity.name())?;
        let Some(id) = entity.id() else {
            return Err(StatementError::MissingId { table });
        };
        let row = marshal::to_row(entity);
        let mut assignments = Vec::with_capacity(row.columns.len());
        for (column, literal) in row.columns {
            if column == "id" {
                continue;
            }
            check_identifier(&column, "column")?;
            assignments.push((column, literal));
        }
        Ok(Statement::Update {
            table,
            assignments,
            id_literal: codec::quote(id),
        })
    }

    /// `DELETE FROM <table> [WHERE ...]`. Empty filters render an unbounded
    /// delete only when the query carries explicit bulk intent.
    pub fn delete(name: &EntityName, query: &Query) -> Result<Statement, StatementError> {
        let table = checked_table(name)?;
        let conditions = where_conditions(query)?;
        if conditions.is_empty() && !query.is_match_all() {
            return Err(StatementError::UnboundedDelete { table });
        }
        Ok(Statement::Delete { table, conditions })
    }

    /// Render to the final statement text.
    pub fn render(&self) -> String {
        match self {
            Statement::Select {
                table,
                conditions,
                order,
                limit,
            } => {
                let mut sql = format!("SELECT * FROM {table}");
                append_where(&mut sql, conditions);
                if let Some((field, direction)) = order {
                    sql.push_str(&format!(" ORDER BY {field} {}", direction.keyword()));
                }
                if let Some(n) = limit {
                    sql.push_str(&format!(" LIMIT {n}"));
                }
                sql
            }
            Statement::Insert { table, columns } => {
                let names: Vec<&str> = columns.iter().map(|(c, _)| c.as_str()).collect();
                let literals: Vec<&str> = columns.iter().map(|(_, l)| l.as_str()).collect();
                format!(
                    "INSERT INTO {table} ({}) VALUES ({})",
                    names.join(", "),
                    literals.join(", ")
                )
            }
            Statement::Update {
                table,
                assignments,
                id_literal,
            } => {
                let set: Vec<String> = assignments
                    .iter()
                    .map(|(c, l)| format!("{c}={l}"))
                    .collect();
                format!("UPDATE {table} SET {} WHERE id={id_literal}", set.join(", "))
            }
            Statement::Delete { table, conditions } => {
                let mut sql = format!("DELETE FROM {table}");
                append_where(&mut sql, conditions);
                sql
            }
        }
    }
}

fn where_conditions(query: &Query) -> Result<Vec<(String, String)>, StatementError> {
    let mut conditions = Vec::with_capacity(query.filters().len());
    for (field, value) in query.filters() {
        check_identifier(field, "column")?;
        conditions.push((field.clone(), codec::where_literal(value)));
    }
    Ok(conditions)
}

fn append_where(sql: &mut String, conditions: &[(String, String)]) {
    if conditions.is_empty() {
        return;
    }
    sql.push_str(" WHERE ");
    let clauses: Vec<String> = conditions
        .iter()
        .map(|(field, literal)| format!("{field} = {literal}"))
        .collect();
    sql.push_str(&clauses.join(" AND "));
}

fn checked_table(name: &EntityName) -> Result<String, StatementError> {
    let table = name.table_name();
    check_identifier(&table, "table")?;
    Ok(table)
}

fn check_identifier(ident: &str, kind: &'static str) -> Result<(), StatementError> {
    if is_valid_identifier(ident) {
        Ok(())
    } else {
        Err(StatementError::InvalidIdentifier {
            kind,
            ident: ident.to_string(),
        })
    }
}

fn is_valid_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
