//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use sqlbind::{Array, ColumnDescriptor, Datum, Json, MemoryCursor, record};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

// Common test records used across multiple test files

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Student {
        pub id: i64,
        pub name: String,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Profile {
        pub nick_name: String,
        pub age: u8,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Timestamps {
        pub created_at: DateTime<Utc>,
        pub updated_at: Option<DateTime<Utc>>,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct User {
        pub id: i64,
        pub user_name: String,
        pub score: Option<f64>,
        #[sql(nested)]
        pub profile: Option<Box<Profile>>,
        #[sql(embed)]
        pub stamps: Timestamps,
        #[sql(skip)]
        pub session: String,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Document {
        pub id: i32,
        pub tags: Json<Vec<String>>,
        pub scores: Array<i64>,
        pub meta: serde_json::Value,
    }
}

/// Cursor with untyped columns.
pub fn cursor(names: &[&str], rows: Vec<Vec<Datum>>) -> MemoryCursor {
    rows.into_iter().fold(MemoryCursor::with_names(names), MemoryCursor::row)
}

/// Cursor with declared column types.
pub fn typed_cursor(columns: &[(&str, &str)], rows: Vec<Vec<Datum>>) -> MemoryCursor {
    let columns = columns
        .iter()
        .enumerate()
        .map(|(i, (name, db_type))| ColumnDescriptor::new(i, *name).with_type(*db_type))
        .collect();
    rows.into_iter().fold(MemoryCursor::new(columns), MemoryCursor::row)
}

pub fn text(s: &str) -> Datum {
    Datum::Text(s.to_string())
}

/// Installs a subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_test_writer())
        .try_init();
}
