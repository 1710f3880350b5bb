//! Literals rendered by the encoder are read back unchanged through `SQLite`.

#![allow(missing_docs, clippy::float_cmp)]

mod common;

use std::fmt::Debug;

use chrono::{DateTime, TimeZone, Utc};
use sqlbind::{Array, Error, FromRow, Json, ToSql, encode, encode_bulk_rows, record};

fn round_trip<T>(value: &T) -> T
where
    T: ToSql + FromRow + sqlbind::Destination + Debug,
{
    let db = common::database();
    let sql = format!("SELECT {} AS v", encode(value).expect("should encode"));
    let mut out = T::default();
    db.query(&sql, &mut out).unwrap_or_else(|e| panic!("{sql}: {e:?}"));
    out
}

#[test]
fn integers() {
    assert_eq!(round_trip(&i8::MIN), i8::MIN);
    assert_eq!(round_trip(&i16::MAX), i16::MAX);
    assert_eq!(round_trip(&-1_234_567_i32), -1_234_567);
    assert_eq!(round_trip(&i64::MIN), i64::MIN);
    assert_eq!(round_trip(&u8::MAX), u8::MAX);
    assert_eq!(round_trip(&u32::MAX), u32::MAX);
    let max = u64::try_from(i64::MAX).unwrap();
    assert_eq!(round_trip(&max), max);
}

#[test]
fn floats() {
    assert_eq!(round_trip(&0.1_f64), 0.1);
    assert_eq!(round_trip(&-2.5_f64), -2.5);
    assert_eq!(round_trip(&1.5e-7_f64), 1.5e-7);
    assert_eq!(round_trip(&6.02e23_f64), 6.02e23);
}

#[test]
fn strings() {
    assert_eq!(round_trip(&"it's".to_string()), "it's");
    assert_eq!(round_trip(&"''".to_string()), "''");
    assert_eq!(round_trip(&"李雷".to_string()), "李雷");
    assert_eq!(round_trip(&String::new()), "");
}

#[test]
fn nul_bytes_are_dropped() {
    assert_eq!(round_trip(&"a\0b\0".to_string()), "ab");
}

#[test]
fn booleans() {
    let db = common::database();
    db.execute("CREATE TABLE flag (v BOOLEAN)").expect("should create table");
    let values = sqlbind::encode_tuples::<bool, _>(&[[true], [false]]).expect("should encode");
    db.execute(&format!("INSERT INTO flag (v) VALUES {values}")).expect("should insert");

    let mut flags: Vec<bool> = Vec::new();
    db.query("SELECT v FROM flag ORDER BY rowid", &mut flags).expect("should query");
    assert_eq!(flags, [true, false]);
}

#[test]
fn undeclared_booleans_are_integers() {
    let db = common::database();
    let mut flag = false;
    let err = db.query("SELECT true AS v", &mut flag).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::TypeMismatch { .. })));

    let mut n = 0_i64;
    db.query(&format!("SELECT {} AS v", encode(&true).unwrap()), &mut n).expect("should query");
    assert_eq!(n, 1);
}

#[test]
fn timestamps() {
    let t = Utc.with_ymd_and_hms(2019, 6, 19, 5, 52, 8).unwrap()
        + chrono::Duration::microseconds(123_456);
    assert_eq!(round_trip(&t), t);

    let whole = Utc.with_ymd_and_hms(2001, 9, 1, 4, 25, 48).unwrap();
    assert_eq!(round_trip(&whole), whole);
}

#[test]
fn nulls() {
    assert_eq!(round_trip(&Option::<i64>::None), None);
    assert_eq!(round_trip(&Some(42_i64)), Some(42));
    assert_eq!(round_trip(&Option::<String>::None), None);
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Event {
        pub id: i64,
        pub title: String,
        pub active: bool,
        pub happened_at: DateTime<Utc>,
        pub closed_at: Option<DateTime<Utc>>,
        pub labels: Json<Vec<String>>,
        pub counts: Array<i64>,
        pub extra: serde_json::Value,
    }
}

const SCHEMA: &str = "CREATE TABLE event (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    active BOOLEAN NOT NULL,
    happened_at TIMESTAMP NOT NULL,
    closed_at TIMESTAMP,
    labels JSON NOT NULL,
    counts _int8 NOT NULL,
    extra JSON
)";

const FIELDS: [&str; 8] =
    ["Id", "Title", "Active", "HappenedAt", "ClosedAt", "Labels", "Counts", "Extra"];

fn events() -> Vec<Event> {
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap();
    vec![
        Event {
            id: 1,
            title: "o'clock".to_string(),
            active: true,
            happened_at: start,
            closed_at: Some(start + chrono::Duration::milliseconds(250)),
            labels: Json(vec!["a".to_string(), "b'c".to_string()]),
            counts: Array(vec![1, 2, 3]),
            extra: serde_json::json!({"depth": 2}),
        },
        Event {
            id: 2,
            title: "second".to_string(),
            active: false,
            happened_at: start + chrono::Duration::days(1),
            closed_at: None,
            labels: Json(Vec::new()),
            counts: Array(Vec::new()),
            extra: serde_json::Value::Null,
        },
    ]
}

#[test]
fn table_round_trip() {
    let db = common::database();
    db.execute(SCHEMA).expect("should create table");

    let expected = events();
    let values = encode_bulk_rows(&expected, &FIELDS).expect("should encode rows");
    let sql = format!(
        "INSERT INTO event (id, title, active, happened_at, closed_at, labels, counts, extra) VALUES {values}"
    );
    assert_eq!(db.execute(&sql).expect("should insert"), 2);

    let mut rows: Vec<Event> = Vec::new();
    db.query(
        "SELECT id, title, active, happened_at, closed_at, labels, counts, extra FROM event ORDER BY id",
        &mut rows,
    )
    .expect("should query");

    assert_eq!(rows, expected);
}

#[test]
fn single_record_and_count() {
    let db = common::database();
    db.execute(SCHEMA).expect("should create table");
    let values = encode_bulk_rows(&events(), &FIELDS).expect("should encode rows");
    db.execute(&format!("INSERT INTO event VALUES {values}")).expect("should insert");

    let mut count = 0_usize;
    db.query("SELECT COUNT(*) FROM event", &mut count).expect("should count");
    assert_eq!(count, 2);

    let mut event = Event::default();
    db.query("SELECT id, title FROM event WHERE id = 2", &mut event).expect("should query");
    assert_eq!(event.title, "second");
    assert!(event.labels.0.is_empty());
}

#[test]
fn unknown_columns_are_reported() {
    let db = common::database();
    let mut event = Event::default();
    let err = db.query("SELECT 1 AS id, 'x' AS venue", &mut event).unwrap_err();

    let cause = err.downcast_ref::<Error>().expect("codec error");
    assert!(matches!(cause, Error::NoSuchField(path) if path == "Venue"));
}
