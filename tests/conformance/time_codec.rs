//! Time-of-day marshaling through a TIME column

use crate::common::*;
use actian_odbc::prelude::*;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Timelike};

fn create_temp(conn: &mut Connection) {
    drop_if_exists(conn, "temp");
    exec(
        conn,
        "create table temp(id int not null auto_increment primary key, time time)",
    );
}

#[test]
fn now_round_trips_as_normalized_time() {
    let db = test_db(IsolationMode::Blocking);
    let before = db.metrics();
    let mut conn = db.connect().unwrap();
    create_temp(&mut conn);

    let now = Local::now();
    // SQL_TIME_STRUCT only carries hours, minutes and seconds
    let expected = TimeOfDay::normalize(&now);

    conn.execute("insert into temp (time) values(?)", &[Value::from(now)])
        .unwrap();
    let ret: DateTime<Local> = conn
        .query_scalar("select time from temp where id = ?", &[Value::Int(1)])
        .unwrap();

    assert_eq!(ret, expected, "want={}, is={}", expected, ret);
    assert_eq!(
        (ret.hour(), ret.minute(), ret.second()),
        (now.hour(), now.minute(), now.second())
    );

    exec(&mut conn, "drop table temp");
    drop(conn);
    assert_no_leaks(&db, before);
}

#[test]
fn date_and_fraction_do_not_survive() {
    let db = test_db(IsolationMode::Blocking);
    let mut conn = db.connect().unwrap();
    create_temp(&mut conn);

    let a = Local
        .from_local_datetime(
            &NaiveDate::from_ymd_opt(2017, 1, 15)
                .unwrap()
                .and_hms_milli_opt(9, 41, 7, 250)
                .unwrap(),
        )
        .earliest()
        .unwrap();
    let b = Local
        .from_local_datetime(
            &NaiveDate::from_ymd_opt(2024, 8, 2)
                .unwrap()
                .and_hms_micro_opt(9, 41, 7, 999_999)
                .unwrap(),
        )
        .earliest()
        .unwrap();

    conn.execute("insert into temp (time) values(?)", &[Value::from(a)])
        .unwrap();
    conn.execute("insert into temp (time) values(?)", &[Value::from(b)])
        .unwrap();

    let first: DateTime<Local> = conn
        .query_scalar("select time from temp where id = ?", &[Value::Int(1)])
        .unwrap();
    let second: DateTime<Local> = conn
        .query_scalar("select time from temp where id = ?", &[Value::Int(2)])
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.nanosecond(), 0);
}

#[test]
fn boundary_times_round_trip() {
    let db = test_db(IsolationMode::Blocking);
    let mut conn = db.connect().unwrap();
    create_temp(&mut conn);

    let cases = [
        TimeOfDay::MIDNIGHT,
        TimeOfDay::new(0, 0, 59).unwrap(),
        TimeOfDay::new(12, 0, 0).unwrap(),
        TimeOfDay::new(23, 59, 59).unwrap(),
    ];
    for (i, t) in cases.iter().enumerate() {
        conn.execute("insert into temp (time) values(?)", &[Value::Time(*t)])
            .unwrap();
        let back: TimeOfDay = conn
            .query_scalar(
                "select time from temp where id = ?",
                &[Value::Int(i as i64 + 1)],
            )
            .unwrap();
        assert_eq!(back, *t);
    }
}

#[test]
fn null_and_naive_time_scans() {
    let db = test_db(IsolationMode::Blocking);
    let mut conn = db.connect().unwrap();
    create_temp(&mut conn);

    conn.execute("insert into temp (time) values(?)", &[Value::Null])
        .unwrap();
    let missing: Option<TimeOfDay> = conn
        .query_scalar("select time from temp where id = 1", &[])
        .unwrap();
    assert_eq!(missing, None);

    let noon = NaiveTime::from_hms_opt(12, 30, 0).unwrap();
    conn.execute("insert into temp (time) values(?)", &[Value::from(noon)])
        .unwrap();
    let back: NaiveTime = conn
        .query_scalar("select time from temp where id = 2", &[])
        .unwrap();
    assert_eq!(back, noon);
}

#[test]
fn missing_row_is_no_rows() {
    let db = test_db(IsolationMode::Blocking);
    let mut conn = db.connect().unwrap();
    create_temp(&mut conn);

    let err = conn
        .query_scalar::<TimeOfDay>("select time from temp where id = ?", &[Value::Int(42)])
        .unwrap_err();
    assert!(matches!(err, Error::NoRows));
}

#[test]
fn time_column_rejects_other_types() {
    let db = test_db(IsolationMode::Blocking);
    let mut conn = db.connect().unwrap();
    create_temp(&mut conn);

    let err = conn
        .execute("insert into temp (time) values(?)", &[Value::from("10:00:00")])
        .unwrap_err();
    assert!(matches!(err, Error::Execution(_)));
}
