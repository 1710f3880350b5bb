//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use sqlbind_sqlite::{ConnectOptions, Database};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Opens a private in-memory database with statement tracing on.
pub fn database() -> Database {
    init_tracing();
    let options = ConnectOptions { database: ":memory:".to_string(), trace_sql: true };
    Database::connect(&options).expect("should open in-memory database")
}

/// Installs a subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_test_writer())
        .try_init();
}
