use crate::driver::{DriverError, SqlState};
use sybstore_sql::{MarshalError, StatementError};

/// Errors surfaced by the store.
///
/// "Not found" is never an error: `load` returns `Ok(None)`. Transient
/// driver failures are surfaced to the failing caller *and* self-heal the
/// connection in the background; fatal ones are surfaced with full context
/// and no retry.
#[derive(Debug)]
pub enum StoreError {
    /// Invalid or missing connection spec at open time. No retry.
    Config(String),
    /// No live connection (closed, or a reconnect is in progress).
    NotConnected { op: &'static str, table: String },
    /// Recoverable driver failure; a backoff reconnect has been kicked off.
    Transient {
        op: &'static str,
        table: String,
        state: SqlState,
        message: String,
    },
    /// Unrecoverable driver failure.
    Fatal {
        op: &'static str,
        table: String,
        state: Option<SqlState>,
        message: String,
    },
    /// A result row could not be decoded.
    Marshal {
        op: &'static str,
        table: String,
        source: MarshalError,
    },
    /// Statement synthesis refused the request.
    Statement(StatementError),
    /// The driver reported a failure while closing; the handle is dropped
    /// regardless.
    Close(DriverError),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient { .. })
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Config(msg) => write!(f, "Invalid connection spec: {msg}"),
            StoreError::NotConnected { op, table } => {
                write!(f, "{op} on '{table}': no live connection")
            }
            StoreError::Transient {
                op,
                table,
                state,
                message,
            } => write!(
                f,
                "{op} on '{table}' failed with transient [{state}]: {message}"
            ),
            StoreError::Fatal {
                op,
                table,
                state,
                message,
            } => match state {
                Some(state) => write!(f, "{op} on '{table}' failed with [{state}]: {message}"),
                None => write!(f, "{op} on '{table}' failed: {message}"),
            },
            StoreError::Marshal { op, table, source } => {
                write!(f, "{op} on '{table}' returned an undecodable row: {source}")
            }
            StoreError::Statement(err) => write!(f, "Statement error: {err}"),
            StoreError::Close(err) => write!(f, "Close failed: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Marshal { source, .. } => Some(source),
            StoreError::Statement(err) => Some(err),
            StoreError::Close(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StatementError> for StoreError {
    fn from(err: StatementError) -> Self {
        StoreError::Statement(err)
    }
}
