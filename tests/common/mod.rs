//! Shared helpers for integration tests.

#![allow(dead_code)]

use actian_odbc::prelude::*;
use actian_odbc::CoordinatorMetrics;
use std::sync::Once;
use std::time::Duration;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary; honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fresh in-process database with the given reader behaviour.
pub fn test_db(isolation: IsolationMode) -> Database {
    init_tracing();
    Database::builder()
        .isolation(isolation)
        .lock_timeout(Duration::from_secs(10))
        .open()
}

/// Run a statement that must succeed.
pub fn exec(q: &mut impl Queryable, sql: &str) {
    if let Err(e) = q.execute(sql, &[]) {
        panic!("{} failed: {}", sql, e);
    }
}

/// Drop a table, ignoring the error if it does not exist.
pub fn drop_if_exists(q: &mut impl Queryable, table: &str) {
    let _ = q.execute(&format!("drop table {}", table), &[]);
}

/// `select count(*)` on a table.
pub fn count(q: &mut impl Queryable, table: &str) -> i64 {
    q.query_scalar(&format!("select count(*) from {}", table), &[])
        .unwrap_or_else(|e| panic!("count({}) failed: {}", table, e))
}

/// Every connection and statement opened since `before` has been released.
pub fn assert_no_leaks(db: &Database, before: CoordinatorMetrics) {
    let after = db.metrics();
    assert_eq!(
        after.open_statements, before.open_statements,
        "statements left open"
    );
    assert_eq!(
        after.open_connections, before.open_connections,
        "connections left open"
    );
}
