use std::fmt;
use std::future::Future;
use sybstore_entity::Row;

/// A five-character SQLSTATE code as reported by a call-level driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlState([u8; 5]);

impl SqlState {
    /// Client unable to establish connection.
    pub const CANNOT_CONNECT: SqlState = SqlState(*b"08001");
    /// Communication link failure.
    pub const LINK_FAILURE: SqlState = SqlState(*b"08S01");
    /// Disconnect error.
    pub const DISCONNECT: SqlState = SqlState(*b"01002");

    pub fn new(code: &str) -> Option<SqlState> {
        let bytes = code.as_bytes();
        if bytes.len() != 5 || !bytes.iter().all(u8::is_ascii) {
            return None;
        }
        let mut state = [0u8; 5];
        state.copy_from_slice(bytes);
        Some(SqlState(state))
    }

    pub fn as_str(&self) -> &str {
        // Constructed from ASCII only.
        std::str::from_utf8(&self.0).unwrap_or("?????")
    }

    /// Whether this state is in the recoverable set: the connection is gone
    /// but a reconnect can bring it back.
    pub fn is_transient(&self) -> bool {
        *self == Self::CANNOT_CONNECT || *self == Self::LINK_FAILURE || *self == Self::DISCONNECT
    }
}

impl fmt::Display for SqlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error reported by the driver, with its SQLSTATE when the driver
/// supplied one.
#[derive(Debug, Clone)]
pub struct DriverError {
    pub state: Option<SqlState>,
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            state: None,
            message: message.into(),
        }
    }

    pub fn with_state(state: SqlState, message: impl Into<String>) -> Self {
        Self {
            state: Some(state),
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.state.is_some_and(|s| s.is_transient())
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            Some(state) => write!(f, "[{state}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DriverError {}

/// What one statement produced: rows for reads, an affected-row count for
/// writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rows(Vec<Row>),
    Affected(u64),
}

impl Outcome {
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Outcome::Rows(rows) => rows,
            Outcome::Affected(_) => Vec::new(),
        }
    }

    pub fn affected(&self) -> u64 {
        match self {
            Outcome::Rows(rows) => rows.len() as u64,
            Outcome::Affected(n) => *n,
        }
    }
}

/// One open connection. Not safe for concurrent statements; the manager
/// serializes access.
pub trait Connection: Send + 'static {
    fn query(&mut self, sql: &str) -> impl Future<Output = Result<Outcome, DriverError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), DriverError>> + Send;
}

/// A call-level connectivity driver: hands out one connection per
/// `connect` from a driver connection string.
pub trait Driver: Send + Sync + 'static {
    type Conn: Connection;

    fn connect(
        &self,
        connection_string: &str,
    ) -> impl Future<Output = Result<Self::Conn, DriverError>> + Send;
}
