//! Transaction lifecycle and connection exclusivity

use crate::common::*;
use actian_odbc::prelude::*;

fn setup() -> (Database, Connection) {
    let db = test_db(IsolationMode::Blocking);
    let mut conn = db.connect().unwrap();
    exec(&mut conn, "create table sm_tst (name varchar(20))");
    (db, conn)
}

#[test]
fn begin_while_active_is_state_error() {
    let (_db, mut conn) = setup();
    let mut tx = conn.begin().unwrap();
    assert_eq!(conn.active_transaction(), Some(tx.id()));

    let err = conn.begin().unwrap_err();
    assert!(err.is_state(), "got {:?}", err);
    // The first transaction is untouched
    assert_eq!(tx.status(), TransactionStatus::Active);
    exec(&mut tx, "insert into sm_tst (name) values ('still')");
    tx.commit().unwrap();

    assert_eq!(conn.active_transaction(), None);
    let tx2 = conn.begin().unwrap();
    assert_ne!(tx2.id(), tx.id());
}

#[test]
fn terminal_transactions_reject_everything() {
    let (_db, mut conn) = setup();

    let mut committed = conn.begin().unwrap();
    committed.commit().unwrap();
    assert_eq!(committed.status(), TransactionStatus::Committed);
    assert!(committed.commit().unwrap_err().is_state());
    assert!(committed.rollback().unwrap_err().is_state());
    assert!(committed
        .execute("insert into sm_tst (name) values ('late')", &[])
        .unwrap_err()
        .is_state());
    assert!(committed
        .query_row("select count(*) from sm_tst", &[])
        .unwrap_err()
        .is_state());
    assert_eq!(committed.status(), TransactionStatus::Committed);

    let mut rolled = conn.begin().unwrap();
    rolled.rollback().unwrap();
    assert_eq!(rolled.status(), TransactionStatus::RolledBack);
    assert!(rolled.rollback().unwrap_err().is_state());
    assert!(rolled.commit().unwrap_err().is_state());
    assert_eq!(rolled.status(), TransactionStatus::RolledBack);

    assert_eq!(count(&mut conn, "sm_tst"), 0);
}

#[test]
fn connection_is_held_while_transaction_active() {
    let (_db, mut conn) = setup();
    let mut tx = conn.begin().unwrap();

    let err = conn
        .execute("insert into sm_tst (name) values ('bypass')", &[])
        .unwrap_err();
    assert!(err.is_state());
    assert!(conn
        .query_row("select count(*) from sm_tst", &[])
        .unwrap_err()
        .is_state());
    assert!(conn.close().unwrap_err().is_state());

    tx.rollback().unwrap();
    exec(&mut conn, "insert into sm_tst (name) values ('free')");
    assert_eq!(count(&mut conn, "sm_tst"), 1);
    conn.close().unwrap();
}

#[test]
fn statement_error_keeps_transaction_active() {
    let (_db, mut conn) = setup();
    let mut tx = conn.begin().unwrap();
    exec(&mut tx, "insert into sm_tst (name) values ('kept')");

    assert!(tx.execute("insert into no_such_table (name) values ('x')", &[]).is_err());
    assert!(tx
        .execute("insert into sm_tst (name) values ('this name is far too long')", &[])
        .is_err());
    assert_eq!(tx.status(), TransactionStatus::Active);

    tx.commit().unwrap();
    assert_eq!(count(&mut conn, "sm_tst"), 1);
}

#[test]
fn dropped_transaction_rolls_back() {
    let (db, mut conn) = setup();
    {
        let mut tx = conn.begin().unwrap();
        exec(&mut tx, "insert into sm_tst (name) values ('gone')");
    }
    assert_eq!(conn.active_transaction(), None);
    assert_eq!(count(&mut conn, "sm_tst"), 0);

    let m = db.metrics();
    assert_eq!(m.begun, 1);
    assert_eq!(m.rolled_back, 1);
    assert_eq!(m.active, 0);
}

#[test]
fn metrics_track_outcomes() {
    let (db, mut conn) = setup();

    let mut a = conn.begin().unwrap();
    assert_eq!(db.metrics().active, 1);
    a.commit().unwrap();

    let mut b = conn.begin().unwrap();
    b.rollback().unwrap();

    let mut other = db.connect().unwrap();
    let mut c = other.begin().unwrap();
    let d = conn.begin().unwrap();
    assert_eq!(db.metrics().active, 2);
    c.commit().unwrap();
    drop(d);

    let m = db.metrics();
    assert_eq!(m.begun, 4);
    assert_eq!(m.committed, 2);
    assert_eq!(m.rolled_back, 2);
    assert_eq!(m.active, 0);
}

#[test]
fn transaction_ids_are_unique_across_connections() {
    let db = test_db(IsolationMode::Blocking);
    let mut a = db.connect().unwrap();
    let mut b = db.connect().unwrap();
    assert_ne!(a.id(), b.id());

    let ta = a.begin().unwrap();
    let tb = b.begin().unwrap();
    assert_ne!(ta.id(), tb.id());
    assert_eq!(ta.connection_id(), a.id());
    assert_eq!(tb.connection_id(), b.id());
}

#[test]
fn with_connection_closes_on_error() {
    let db = test_db(IsolationMode::Blocking);
    db.with_connection(|c| c.execute("create table wc_tst (name varchar(20))", &[]))
        .unwrap();

    let err = db
        .with_connection(|c| {
            let mut tx = c.begin()?;
            tx.execute("insert into wc_tst (name) values ('lost')", &[])?;
            tx.execute("insert into wc_tst (nope) values ('x')", &[])?;
            tx.commit()
        })
        .unwrap_err();
    assert!(matches!(err, Error::Execution(_)), "got {:?}", err);

    let n = db
        .with_connection(|c| c.query_scalar::<i64>("select count(*) from wc_tst", &[]))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn closed_connection_rejects_work() {
    let (_db, mut conn) = setup();
    conn.close().unwrap();
    // Closing twice is fine
    conn.close().unwrap();

    assert!(matches!(conn.begin().unwrap_err(), Error::Connection(_)));
    assert!(matches!(
        conn.execute("select count(*) from sm_tst", &[]).unwrap_err(),
        Error::Connection(_)
    ));
}

#[test]
fn panicking_worker_reports_internal_error() {
    let db = test_db(IsolationMode::Blocking);
    let before = db.metrics();

    let worker = db.spawn_worker(|c| -> Result<i64> {
        c.execute("create table panic_tst (name varchar(20))", &[])?;
        panic!("worker gave up")
    });
    let err = worker.wait().unwrap_err();
    assert!(!err.is_fatal());
    assert!(matches!(&err, Error::Internal(msg) if msg.contains("worker gave up")), "got {:?}", err);

    // The worker's connection was closed during unwinding
    assert_no_leaks(&db, before);
}
