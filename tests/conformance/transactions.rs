//! Transaction visibility across connections

use crate::common::*;
use actian_odbc::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn create_txn_tst(conn: &mut Connection) {
    drop_if_exists(conn, "txn_tst");
    exec(conn, "create table txn_tst (name varchar(20))");
}

// ============================================================================
// Commit / rollback scenarios
// ============================================================================

#[test]
fn commit_then_rollback_blocking_reader() {
    let db = test_db(IsolationMode::Blocking);
    let before = db.metrics();
    let mut conn = db.connect().unwrap();
    create_txn_tst(&mut conn);

    let was = count(&mut conn, "txn_tst");

    let mut tx = conn.begin().unwrap();
    exec(&mut tx, "insert into txn_tst (name) values ('tx1')");
    let is = count(&mut tx, "txn_tst");
    assert_eq!(is, was + 1, "is({}) should be 1 more than was({})", is, was);

    // Waits on the transaction's write lock
    let reader = db.spawn_worker(|c| c.query_scalar::<i64>("select count(*) from txn_tst", &[]));
    thread::sleep(Duration::from_millis(100));
    assert!(!reader.is_finished(), "reader must wait for the writer");

    exec(&mut tx, "insert into txn_tst (name) values ('tx2')");
    tx.commit().unwrap();

    assert_eq!(reader.wait().unwrap(), was + 2);
    assert_eq!(count(&mut conn, "txn_tst"), was + 2);

    let was = count(&mut conn, "txn_tst");
    let mut tx = conn.begin().unwrap();
    exec(&mut tx, "insert into txn_tst (name) values ('tx3')");
    assert_eq!(count(&mut tx, "txn_tst"), was + 1);
    tx.rollback().unwrap();

    assert_eq!(count(&mut conn, "txn_tst"), was);
    let other = db
        .spawn_worker(|c| c.query_scalar::<i64>("select count(*) from txn_tst", &[]))
        .wait()
        .unwrap();
    assert_eq!(other, was);

    exec(&mut conn, "drop table txn_tst");
    drop(tx);
    drop(conn);
    assert_no_leaks(&db, before);
}

#[test]
fn snapshot_reader_sees_pre_transaction_count() {
    let db = test_db(IsolationMode::Snapshot);
    let before = db.metrics();
    let mut conn = db.connect().unwrap();
    create_txn_tst(&mut conn);
    exec(&mut conn, "insert into txn_tst (name) values ('seed')");

    let was = count(&mut conn, "txn_tst");
    let mut tx = conn.begin().unwrap();
    exec(&mut tx, "insert into txn_tst (name) values ('tx1')");

    let during = db
        .spawn_worker(|c| c.query_scalar::<i64>("select count(*) from txn_tst", &[]))
        .wait()
        .unwrap();
    assert_eq!(during, was);

    exec(&mut tx, "insert into txn_tst (name) values ('tx2')");
    assert_eq!(count(&mut tx, "txn_tst"), was + 2);
    tx.commit().unwrap();

    let after = db
        .spawn_worker(|c| c.query_scalar::<i64>("select count(*) from txn_tst", &[]))
        .wait()
        .unwrap();
    assert_eq!(after, was + 2);
    assert_eq!(count(&mut conn, "txn_tst"), was + 2);
    drop(tx);
    drop(conn);
    assert_no_leaks(&db, before);
}

#[test]
fn rollback_restores_count_everywhere() {
    for isolation in [IsolationMode::Blocking, IsolationMode::Snapshot] {
        let db = test_db(isolation);
        let mut conn = db.connect().unwrap();
        let mut observer = db.connect().unwrap();
        create_txn_tst(&mut conn);
        exec(&mut conn, "insert into txn_tst (name) values ('a')");
        exec(&mut conn, "insert into txn_tst (name) values ('b')");

        let was = count(&mut observer, "txn_tst");
        let mut tx = conn.begin().unwrap();
        for i in 0..3 {
            exec(&mut tx, &format!("insert into txn_tst (name) values ('r{}')", i));
        }
        assert_eq!(count(&mut tx, "txn_tst"), was + 3);
        tx.rollback().unwrap();

        assert_eq!(count(&mut conn, "txn_tst"), was);
        assert_eq!(count(&mut observer, "txn_tst"), was);
    }
}

// ============================================================================
// Concurrent observers
// ============================================================================

/// Readers never observe a partial transaction: only the count before it
/// or the count after its commit.
fn readers_see_all_or_nothing(isolation: IsolationMode) {
    const READERS: usize = 4;
    const INSERTS: i64 = 5;

    let db = test_db(isolation);
    let before = db.metrics();
    let mut conn = db.connect().unwrap();
    create_txn_tst(&mut conn);
    let was = count(&mut conn, "txn_tst");

    let mut tx = conn.begin().unwrap();
    exec(&mut tx, "insert into txn_tst (name) values ('first')");

    let barrier = Arc::new(Barrier::new(READERS + 1));
    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            db.spawn_worker(move |c| {
                barrier.wait();
                let mut seen = Vec::new();
                loop {
                    let n: i64 = c.query_scalar("select count(*) from txn_tst", &[])?;
                    seen.push(n);
                    if n == was + INSERTS {
                        return Ok(seen);
                    }
                    thread::yield_now();
                }
            })
        })
        .collect();

    barrier.wait();
    for i in 1..INSERTS {
        thread::sleep(Duration::from_millis(5));
        exec(&mut tx, &format!("insert into txn_tst (name) values ('row{}')", i));
    }
    tx.commit().unwrap();

    for reader in readers {
        let seen = reader.wait().unwrap();
        assert!(
            seen.iter().all(|&n| n == was || n == was + INSERTS),
            "observed partial state: {:?}",
            seen
        );
    }
    drop(tx);
    drop(conn);
    assert_no_leaks(&db, before);
}

#[test]
fn blocking_readers_see_all_or_nothing() {
    readers_see_all_or_nothing(IsolationMode::Blocking);
}

#[test]
fn snapshot_readers_see_all_or_nothing() {
    readers_see_all_or_nothing(IsolationMode::Snapshot);
}

#[test]
fn transactions_on_different_tables_do_not_wait() {
    let db = test_db(IsolationMode::Blocking);
    let mut a = db.connect().unwrap();
    let mut b = db.connect().unwrap();
    exec(&mut a, "create table left_t (name varchar(20))");
    exec(&mut a, "create table right_t (name varchar(20))");

    let mut ta = a.begin().unwrap();
    let mut tb = b.begin().unwrap();
    exec(&mut ta, "insert into left_t (name) values ('a')");
    exec(&mut tb, "insert into right_t (name) values ('b')");
    ta.commit().unwrap();
    tb.commit().unwrap();

    assert_eq!(count(&mut a, "right_t"), 1);
    assert_eq!(count(&mut b, "left_t"), 1);
}

#[test]
fn lock_timeout_surfaces_as_conflict() {
    let db = Database::builder()
        .lock_timeout(Duration::from_millis(50))
        .open();
    let mut a = db.connect().unwrap();
    let mut b = db.connect().unwrap();
    create_txn_tst(&mut a);

    let mut ta = a.begin().unwrap();
    exec(&mut ta, "insert into txn_tst (name) values ('held')");

    let mut tb = b.begin().unwrap();
    let err = tb
        .execute("insert into txn_tst (name) values ('blocked')", &[])
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(err.is_retryable());
    // Not rolled back automatically
    assert_eq!(tb.status(), TransactionStatus::Active);

    ta.commit().unwrap();
    exec(&mut tb, "insert into txn_tst (name) values ('retried')");
    tb.commit().unwrap();
    assert_eq!(count(&mut a, "txn_tst"), 2);
}
