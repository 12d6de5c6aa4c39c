use std::time::Duration;
use sybstore::testing::ScriptedDriver;
use sybstore::{ConnectSpec, ConnectionManager, DriverError, SqlState, StoreConfig};

// ── Helpers ────────────────────────────────────────────────────────────────

fn link_failure() -> DriverError {
    DriverError::with_state(SqlState::LINK_FAILURE, "link down")
}

fn manager(driver: &ScriptedDriver) -> ConnectionManager<ScriptedDriver> {
    ConnectionManager::new(
        driver.clone(),
        ConnectSpec::from(StoreConfig {
            connection: "DSN=test".to_string(),
            min_wait: 16,
            max_wait: 65_336,
        }),
    )
}

async fn wait_for_attempts(driver: &ScriptedDriver, n: usize) {
    while driver.connect_attempts() < n {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

async fn wait_until_connected(mgr: &ConnectionManager<ScriptedDriver>) {
    while !mgr.is_connected().await {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn backoff_doubles_until_reconnect_succeeds() {
    let driver = ScriptedDriver::new();
    let mgr = manager(&driver);
    mgr.connect().await.unwrap();

    // The live connection dies; the first reopen attempt fails too.
    driver.push_response(Err(link_failure()));
    driver.fail_next_connect(link_failure());

    let failed_at = tokio::time::Instant::now();
    let err = mgr.execute("load", "app_user", "SELECT * FROM app_user").await;
    assert!(err.unwrap_err().is_transient());
    assert!(!mgr.is_connected().await);

    // Initial connect + 2 reopen attempts (fail, then success).
    wait_for_attempts(&driver, 3).await;
    wait_until_connected(&mgr).await;

    // Waits of min_wait, then 2×min_wait.
    let times = driver.connect_times();
    assert_eq!(times[1] - failed_at, Duration::from_millis(16));
    assert_eq!(times[2] - times[1], Duration::from_millis(32));
}

#[tokio::test(start_paused = true)]
async fn successful_reconnect_resets_the_interval() {
    let driver = ScriptedDriver::new();
    let mgr = manager(&driver);
    mgr.connect().await.unwrap();

    // First outage: one failed reopen, then success (waits 16, 32).
    driver.push_response(Err(link_failure()));
    driver.fail_next_connect(link_failure());
    let _ = mgr.execute("load", "app_user", "SELECT 1").await;
    wait_for_attempts(&driver, 3).await;
    wait_until_connected(&mgr).await;

    // Second outage: the loop starts over from min_wait.
    driver.push_response(Err(link_failure()));
    let failed_again_at = tokio::time::Instant::now();
    let _ = mgr.execute("load", "app_user", "SELECT 1").await;
    wait_for_attempts(&driver, 4).await;

    let times = driver.connect_times();
    assert_eq!(times[2] - times[1], Duration::from_millis(32));
    assert_eq!(times[3] - failed_again_at, Duration::from_millis(16));
}

#[tokio::test(start_paused = true)]
async fn backoff_is_capped_at_max_wait() {
    let driver = ScriptedDriver::new();
    let mgr = ConnectionManager::new(
        driver.clone(),
        ConnectSpec::from(StoreConfig {
            connection: "DSN=test".to_string(),
            min_wait: 16,
            max_wait: 40,
        }),
    );
    mgr.connect().await.unwrap();

    driver.push_response(Err(link_failure()));
    for _ in 0..4 {
        driver.fail_next_connect(link_failure());
    }
    let failed_at = tokio::time::Instant::now();
    let _ = mgr.execute("load", "app_user", "SELECT 1").await;

    // Initial connect + 5 reopen attempts; waits 16, 32, 40, 40, 40.
    wait_for_attempts(&driver, 6).await;

    let times = driver.connect_times();
    assert_eq!(times[1] - failed_at, Duration::from_millis(16));
    assert_eq!(times[2] - times[1], Duration::from_millis(32));
    assert_eq!(times[3] - times[2], Duration::from_millis(40));
    assert_eq!(times[4] - times[3], Duration::from_millis(40));
    assert_eq!(times[5] - times[4], Duration::from_millis(40));
}

#[tokio::test(start_paused = true)]
async fn only_one_reconnect_loop_runs_at_a_time() {
    let driver = ScriptedDriver::new();
    let mgr = manager(&driver);
    mgr.connect().await.unwrap();

    driver.push_response(Err(link_failure()));
    let _ = mgr.execute("load", "app_user", "SELECT 1").await;

    // While the loop is in flight the handle is gone; further calls fail
    // fast and must not start a second loop.
    let again = mgr.execute("load", "app_user", "SELECT 1").await;
    assert!(matches!(
        again.unwrap_err(),
        sybstore::StoreError::NotConnected { .. }
    ));

    wait_for_attempts(&driver, 2).await;
    wait_until_connected(&mgr).await;
    // One initial connect, one reopen.
    assert_eq!(driver.connect_attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn transient_connect_failure_at_open_also_heals() {
    let driver = ScriptedDriver::new();
    driver.fail_next_connect(DriverError::with_state(
        SqlState::CANNOT_CONNECT,
        "server not reachable",
    ));

    let mgr = manager(&driver);
    let err = mgr.connect().await.unwrap_err();
    assert!(err.is_transient());

    wait_for_attempts(&driver, 2).await;
    wait_until_connected(&mgr).await;
}
