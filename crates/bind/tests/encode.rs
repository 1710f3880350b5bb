//! Integration tests for rendering SQL literals.
//!
//! Tests the public API as users would interact with it.

#![allow(missing_docs)]

mod common;

use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate, TimeZone};
use common::{Document, Profile, Student, User};
use sqlbind::{
    Array, Error, Json, Raw, ToSql, Value, encode, encode_array, encode_bulk_rows,
    encode_field_values, encode_json, encode_row_values, field_names, fields_to_columns_str, quote,
};

#[test]
fn struct_tuples() {
    let students = vec![
        Student { id: 1, name: "李雷".to_string() },
        Student { id: 2, name: "韩梅梅".to_string() },
    ];

    let values = encode_bulk_rows(&students, &["Id", "Name"]).unwrap();
    assert_eq!(values, "(1,'李雷'),(2,'韩梅梅')");

    let single = encode_row_values(&students[0], &["Name", "Id"]).unwrap();
    assert_eq!(single, "('李雷',1)");

    let ids = encode_field_values(&students, "Id").unwrap();
    assert_eq!(ids, "(1,2)");
}

#[test]
fn row_values_through_nested_and_embedded() {
    let offset = FixedOffset::east_opt(8 * 3600).unwrap();
    let created = offset.with_ymd_and_hms(2019, 6, 19, 13, 52, 8).unwrap()
        + chrono::Duration::microseconds(123_456);

    let mut user = User {
        id: 1,
        user_name: "o'neil".to_string(),
        profile: Some(Box::new(Profile { nick_name: "on".to_string(), age: 40 })),
        ..User::default()
    };
    user.stamps.created_at = created.to_utc();

    let values =
        encode_row_values(&user, &["Id", "UserName", "Score", "Profile.Age", "CreatedAt", "UpdatedAt"])
            .unwrap();
    assert_eq!(values, "(1,'o''neil',NULL,40,'2019-06-19T05:52:08.123456Z',NULL)");
}

#[test]
fn absent_nested_record_is_not_readable() {
    let user = User::default();
    let err = encode_row_values(&user, &["Profile.Age"]).unwrap_err();
    assert!(matches!(err, Error::NoSuchField(path) if path == "Profile.Age"));
}

#[test]
fn unknown_field_paths() {
    let student = Student::default();
    assert!(matches!(encode_row_values(&student, &["Age"]), Err(Error::NoSuchField(_))));
    assert!(matches!(encode_bulk_rows(Vec::<&Student>::new(), &["Age"]), Err(Error::NoSuchField(_))));
}

#[test]
fn column_lists() {
    let fields = field_names::<User>(&["Session"]);
    assert_eq!(fields, ["Id", "UserName", "Score", "Profile", "CreatedAt", "UpdatedAt"]);

    let names: Vec<&str> = fields.iter().map(String::as_str).filter(|f| *f != "Profile").collect();
    let columns = fields_to_columns_str(&names, "u.", &["UpdatedAt"]);
    assert_eq!(columns, "u.id,u.user_name,u.score,u.created_at");
}

#[test]
fn json_and_array_fields() {
    let doc = Document {
        id: 4,
        tags: Json(vec!["dd'ee".to_string()]),
        scores: Array(vec![1, 2, 3]),
        meta: serde_json::json!({"k": null}),
    };

    let values = encode_row_values(&doc, &["Id", "Tags", "Scores", "Meta"]).unwrap();
    assert_eq!(values, r#"(4,'["dd''ee"]','{1,2,3}','{"k":null}')"#);
}

#[test]
fn scalar_literals() {
    assert_eq!(quote("xi'ao'mei"), "'xi''ao''mei'");
    assert_eq!(quote("a\0\0b\0c"), "'abc'");
    assert_eq!(encode(&Option::<String>::None).unwrap(), "NULL");
    assert_eq!(encode(&Some(Some(7_u8))).unwrap(), "7");
    assert_eq!(encode(&-42_i16).unwrap(), "-42");
    assert_eq!(encode(&true).unwrap(), "true");
    assert_eq!(encode(&2.5_f32).unwrap(), "2.5");
    assert_eq!(encode(&Raw::from("CURRENT_TIMESTAMP")).unwrap(), "CURRENT_TIMESTAMP");
    assert_eq!(encode(&NaiveDate::from_ymd_opt(2020, 2, 29).unwrap()).unwrap(), "'2020-02-29'");
}

#[test]
fn collections_fall_back_to_json() {
    let mut flags = BTreeMap::new();
    flags.insert(2, true);
    flags.insert(3, false);
    assert_eq!(encode(&flags).unwrap(), r#"'{"2":true,"3":false}'"#);
    assert_eq!(encode(&vec!["a", "b'c"]).unwrap(), r#"'["a","b''c"]'"#);
    assert_eq!(encode(&vec![vec![1, 2], vec![3]]).unwrap(), "'[[1,2],[3]]'");
    assert_eq!(encode(&vec![("x", Some(1.5))]).unwrap(), r#"'[["x",1.5]]'"#);
    assert_eq!(encode_json(&serde_json::json!({"q": "it's"})).unwrap(), r#"'{"q":"it''s"}'"#);
}

#[test]
fn array_literals() {
    assert_eq!(encode_array(&[1, 2, 3]).unwrap(), "'{1,2,3}'");
    assert_eq!(encode_array(&["a", "b", "c"]).unwrap(), r#"'{"a","b","c"}'"#);
    assert_eq!(encode_array(&[r#"q"uote"#, r"back\slash"]).unwrap(), r#"'{"q\"uote","back\\slash"}'"#);
    assert_eq!(encode_array(&[Some(1), None]).unwrap(), "'{1,NULL}'");
    assert_eq!(encode_array::<&str>(&[]).unwrap(), "'{}'");
}

struct Decimal {
    units: i64,
    scale: u32,
}

impl ToSql for Decimal {
    fn to_sql(&self) -> sqlbind::Result<Value> {
        let divisor = 10_i64.pow(self.scale);
        let text = format!(
            "{}.{:0width$}",
            self.units / divisor,
            self.units % divisor,
            width = self.scale as usize
        );
        Ok(Value::custom(Some(Value::Str(text))))
    }
}

struct Broken;

impl ToSql for Broken {
    fn to_sql(&self) -> sqlbind::Result<Value> {
        Err(Error::Encode("precision lost".to_string()))
    }
}

#[test]
fn custom_convertible_values() {
    let price = Decimal { units: 1234, scale: 2 };
    assert_eq!(encode(&price).unwrap(), "12.34");
    assert_eq!(encode(&Option::<Decimal>::None).unwrap(), "NULL");
    assert_eq!(encode_array(&[Decimal { units: 5, scale: 1 }]).unwrap(), "'{0.5}'");

    let err = encode(&Broken).unwrap_err();
    assert_eq!(err.to_string(), "cannot encode value: precision lost");
}

#[test]
fn encoding_is_deterministic() {
    let student = Student { id: 9, name: "x'y".to_string() };
    let first = encode_row_values(&student, &["Id", "Name"]).unwrap();
    let second = encode_row_values(&student, &["Id", "Name"]).unwrap();
    assert_eq!(first, second);
}
