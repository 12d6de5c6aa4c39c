//! A scripted in-memory driver for exercising the store without a database.
//!
//! [`ScriptedDriver`] records every statement it is asked to run and replays
//! queued outcomes (including driver errors with chosen SQLSTATEs). Connect
//! attempts can be scripted the same way, which is how the reconnect/backoff
//! behavior is tested deterministically.

use crate::driver::{Connection, Driver, DriverError, Outcome};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use sybstore_entity::{RawValue, Row};
use sybstore_sql::MarshalledRow;

#[derive(Default)]
struct Script {
    connect_results: Mutex<VecDeque<Result<(), DriverError>>>,
    connect_times: Mutex<Vec<tokio::time::Instant>>,
    responses: Mutex<VecDeque<Result<Outcome, DriverError>>>,
    executed: Mutex<Vec<String>>,
}

/// A driver whose connects and queries replay a programmed script.
///
/// Unscripted connects succeed; unscripted queries return
/// `Outcome::Affected(0)`.
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    script: Arc<Script>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome for the next unanswered query.
    pub fn push_response(&self, response: Result<Outcome, DriverError>) {
        self.script.responses.lock().unwrap().push_back(response);
    }

    /// Queue rows for the next query.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.push_response(Ok(Outcome::Rows(rows)));
    }

    /// Queue a failure for the next connect attempt.
    pub fn fail_next_connect(&self, err: DriverError) {
        self.script
            .connect_results
            .lock()
            .unwrap()
            .push_back(Err(err));
    }

    /// Every statement executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.script.executed.lock().unwrap().clone()
    }

    /// Instants at which connect attempts arrived (tokio clock, so paused
    /// time in tests is observable).
    pub fn connect_times(&self) -> Vec<tokio::time::Instant> {
        self.script.connect_times.lock().unwrap().clone()
    }

    pub fn connect_attempts(&self) -> usize {
        self.script.connect_times.lock().unwrap().len()
    }
}

impl Driver for ScriptedDriver {
    type Conn = ScriptedConn;

    async fn connect(&self, _connection_string: &str) -> Result<Self::Conn, DriverError> {
        self.script
            .connect_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        let scripted = self.script.connect_results.lock().unwrap().pop_front();
        match scripted {
            Some(Err(err)) => Err(err),
            _ => Ok(ScriptedConn {
                script: Arc::clone(&self.script),
            }),
        }
    }
}

pub struct ScriptedConn {
    script: Arc<Script>,
}

impl Connection for ScriptedConn {
    async fn query(&mut self, sql: &str) -> Result<Outcome, DriverError> {
        self.script.executed.lock().unwrap().push(sql.to_string());
        let scripted = self.script.responses.lock().unwrap().pop_front();
        scripted.unwrap_or(Ok(Outcome::Affected(0)))
    }

    async fn close(self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Simulate the database echoing a marshalled row back through the driver:
/// each literal becomes the raw value a read would report for the stored
/// column.
pub fn echo_row(row: &MarshalledRow) -> Row {
    row.columns
        .iter()
        .map(|(name, literal)| (name.clone(), raw_from_literal(literal)))
        .collect()
}

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
