use crate::config::ConnectSpec;
use crate::driver::{Connection, Driver, Outcome};
use crate::error::StoreError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Owns the single live connection and the resilience policy around it.
///
/// Every statement serializes through one handle; the underlying driver is
/// not safe for concurrent statement execution. On a transient failure
/// (recoverable SQLSTATE) the dead handle is dropped, the caller gets the
/// error, and one background reconnect loop doubles its wait from
/// `min_wait` up to `max_wait` until the connection is back. Any other
/// driver failure is fatal and surfaced immediately.
pub struct ConnectionManager<D: Driver> {
    driver: Arc<D>,
    spec: ConnectSpec,
    conn: Arc<Mutex<Option<D::Conn>>>,
    reconnecting: Arc<AtomicBool>,
}

impl<D: Driver> ConnectionManager<D> {
    pub fn new(driver: D, spec: ConnectSpec) -> Self {
        Self {
            driver: Arc::new(driver),
            spec,
            conn: Arc::new(Mutex::new(None)),
            reconnecting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Open the one connection handle. Fails without retry on an empty
    /// connection string.
    pub async fn connect(&self) -> Result<(), StoreError> {
        if self.spec.connection_string().trim().is_empty() {
            return Err(StoreError::Config("empty connection string".to_string()));
        }
        match self.driver.connect(self.spec.connection_string()).await {
            Ok(conn) => {
                *self.conn.lock().await = Some(conn);
                tracing::info!("connection open");
                Ok(())
            }
            Err(err) => {
                let classified = self.classify("init", "", err);
                if classified.is_transient() {
                    self.spawn_reconnect();
                }
                Err(classified)
            }
        }
    }

    /// Run one statement against the live handle.
    ///
    /// `op` and `table` travel with any failure for diagnosability. While a
    /// reconnect is in flight the handle is absent and calls fail fast with
    /// `NotConnected` rather than queueing behind backoff sleeps.
    pub async fn execute(
        &self,
        op: &'static str,
        table: &str,
        sql: &str,
    ) -> Result<Outcome, StoreError> {
        let mut guard = self.conn.lock().await;
        let Some(conn) = guard.as_mut() else {
            return Err(StoreError::NotConnected {
                op,
                table: table.to_string(),
            });
        };
        tracing::debug!(op, table, sql, "executing statement");
        match conn.query(sql).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let classified = self.classify(op, table, err);
                if classified.is_transient() {
                    // The handle is dead; drop it so later calls fail fast
                    // until the reconnect loop restores it.
                    *guard = None;
                    drop(guard);
                    self.spawn_reconnect();
                } else {
                    tracing::error!(op, table, error = %classified, "fatal driver error");
                }
                Err(classified)
            }
        }
    }

    /// Close the connection. A driver failure on close is reported, but the
    /// handle is gone either way.
    pub async fn close(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().await.take();
        match conn {
            Some(conn) => match conn.close().await {
                Ok(()) => {
                    tracing::info!("connection closed");
                    Ok(())
                }
                Err(err) => {
                    tracing::error!(error = %err, "connection close failed");
                    Err(StoreError::Close(err))
                }
            },
            None => Ok(()),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    fn classify(
        &self,
        op: &'static str,
        table: &str,
        err: crate::driver::DriverError,
    ) -> StoreError {
        match err.state {
            Some(state) if state.is_transient() => StoreError::Transient {
                op,
                table: table.to_string(),
                state,
                message: err.message,
            },
            state => StoreError::Fatal {
                op,
                table: table.to_string(),
                state,
                message: err.message,
            },
        }
    }

    /// Kick off the reconnect loop unless one is already running.
    ///
    /// The loop sleeps the current interval, attempts a fresh connection,
    /// and doubles the interval on failure, clamped to `max_wait`. Success
    /// installs the new handle; the next loop starts over from `min_wait`.
    fn spawn_reconnect(&self) {
        if self.reconnecting.swap(true, Ordering::SeqCst) {
            return;
        }
        let driver = Arc::clone(&self.driver);
        let conn = Arc::clone(&self.conn);
        let reconnecting = Arc::clone(&self.reconnecting);
        let connection_string = self.spec.connection_string().to_string();
        let min_wait = self.spec.min_wait();
        let max_wait = self.spec.max_wait();

        tokio::spawn(async move {
            let mut wait = min_wait;
            loop {
                tokio::time::sleep(wait).await;
                match driver.connect(&connection_string).await {
                    Ok(fresh) => {
                        *conn.lock().await = Some(fresh);
                        reconnecting.store(false, Ordering::SeqCst);
                        tracing::info!("reconnect ok");
                        break;
                    }
                    Err(err) => {
                        tracing::warn!(
                            wait_ms = wait.as_millis() as u64,
                            error = %err,
                            "reconnect failed"
                        );
                        wait = (wait * 2).min(max_wait);
                    }
                }
            }
        });
    }
}

impl<D: Driver> Clone for ConnectionManager<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            spec: self.spec.clone(),
            conn: Arc::clone(&self.conn),
            reconnecting: Arc::clone(&self.reconnecting),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    #[test]
    fn test_backoff_doubling_is_clamped() {
        let min = Duration::from_millis(16);
        let max = Duration::from_millis(65_336);
        let mut wait = min;
        let mut seen = Vec::new();
        for _ in 0..16 {
            seen.push(wait);
            wait = (wait * 2).min(max);
        }
        assert_eq!(seen[0], Duration::from_millis(16));
        assert_eq!(seen[1], Duration::from_millis(32));
        assert_eq!(*seen.last().unwrap(), max);
    }
}
