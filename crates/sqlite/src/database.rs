//! Embedded `SQLite` connection.
//!
//! This is a lightweight implementation for development and testing.

#![allow(clippy::significant_drop_tightening)]

use std::sync::Arc;

use anyhow::{Context, Result};
use fromenv::FromEnv;
use rusqlite::Connection;
use sqlbind::{ColumnDescriptor, Destination, MemoryCursor};
use tracing::instrument;

use crate::values::to_datum;

/// Options used to connect to the SQL database.
///
/// This struct is used to load connection options from environment variables.
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// Database path, or `:memory:` for a private in-memory database.
    #[env(from = "SQL_DATABASE", default = ":memory:")]
    pub database: String,

    /// Log every statement at debug level.
    #[env(from = "SQL_TRACE", default = "false")]
    pub trace_sql: bool,
}

impl ConnectOptions {
    /// Loads options from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to a value that cannot be
    /// parsed.
    pub fn load() -> Result<Self> {
        Self::from_env().finalize().context("issue loading connection options")
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            database: ":memory:".to_string(),
            trace_sql: false,
        }
    }
}

/// A shared `SQLite` connection.
#[derive(Debug, Clone)]
pub struct Database {
    // Mutex is necessary since rusqlite::Connection isn't `Sync`
    conn: Arc<parking_lot::Mutex<Connection>>,
    trace_sql: bool,
}

impl Database {
    /// Opens the database named by `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    #[instrument(skip(options), fields(database = %options.database))]
    pub fn connect(options: &ConnectOptions) -> Result<Self> {
        tracing::debug!("initializing SQLite connection");
        let conn = Connection::open(&options.database).context("failed to open SQLite database")?;

        Ok(Self {
            conn: Arc::new(parking_lot::Mutex::new(conn)),
            trace_sql: options.trace_sql,
        })
    }

    /// Opens the database named by the environment (see [`ConnectOptions`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the options cannot be loaded or the database
    /// cannot be opened.
    pub fn connect_env() -> Result<Self> {
        Self::connect(&ConnectOptions::load()?)
    }

    fn trace(&self, sql: &str) {
        if self.trace_sql {
            tracing::debug!(sql, "executing statement");
        }
    }

    /// Executes one statement and returns the number of rows it changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.trace(sql);
        let conn = self.conn.lock();
        conn.execute(sql, []).context("failed to execute statement")
    }

    /// Executes a sequence of `;`-separated statements.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.trace(sql);
        let conn = self.conn.lock();
        conn.execute_batch(sql).context("failed to execute statements")
    }

    /// Runs a query and collects its result set.
    ///
    /// Declared column types are reported as-is, so `JSON` columns select
    /// the JSON scanner.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn fetch(&self, sql: &str) -> Result<MemoryCursor> {
        self.trace(sql);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql).context("failed to prepare statement")?;

        let columns: Vec<ColumnDescriptor> = stmt
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let descriptor = ColumnDescriptor::new(i, column.name());
                match column.decl_type() {
                    Some(decl_type) => descriptor.with_type(decl_type),
                    None => descriptor,
                }
            })
            .collect();

        let mut cursor = MemoryCursor::new(columns.clone());
        let mut rows = stmt.query([]).context("failed to execute query")?;
        while let Some(row) = rows.next().context("failed to fetch row")? {
            let values = columns
                .iter()
                .map(|column| {
                    let value = row.get_ref(column.position).context("failed to get column value")?;
                    Ok(to_datum(value, column.db_type.as_deref()))
                })
                .collect::<Result<Vec<_>>>()?;
            cursor.push(values);
        }

        Ok(cursor)
    }

    /// Runs a query and decodes its result set into `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or its rows cannot be decoded.
    pub fn query<D: Destination + ?Sized>(&self, sql: &str, dest: &mut D) -> Result<()> {
        let mut cursor = self.fetch(sql)?;
        sqlbind::decode(&mut cursor, dest).context("failed to decode rows")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_operations() {
        let db = Database::connect(&ConnectOptions::default()).expect("connect");

        let changed = db
            .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)")
            .expect("create table");
        assert_eq!(changed, 0);

        let changed = db
            .execute("INSERT INTO users (name, age) VALUES ('Alice', 30), ('Bob', 25)")
            .expect("insert");
        assert_eq!(changed, 2);

        let mut names: Vec<String> = Vec::new();
        db.query("SELECT name FROM users ORDER BY name", &mut names).expect("query");
        assert_eq!(names, ["Alice", "Bob"]);

        let mut cursor = db.fetch("SELECT id, name FROM users").expect("fetch");
        let columns = sqlbind::Cursor::columns(&cursor).expect("columns");
        assert_eq!(columns[1].name, "name");
        assert_eq!(columns[1].db_type.as_deref(), Some("TEXT"));
        assert!(sqlbind::Cursor::next_row(&mut cursor).expect("row").is_some());
    }

    #[test]
    fn failures_carry_context() {
        let db = Database::connect(&ConnectOptions::default()).expect("connect");
        let err = db.execute("NOT SQL").unwrap_err();
        assert_eq!(err.to_string(), "failed to execute statement");

        let mut n = 0_i64;
        let err = db.query("SELECT 'abc' AS n", &mut n).unwrap_err();
        assert_eq!(err.to_string(), "failed to decode rows");
        assert!(err.downcast_ref::<sqlbind::Error>().is_some());
    }

    #[test]
    fn options_default_to_memory() {
        let options = ConnectOptions::default();
        assert_eq!(options.database, ":memory:");
        assert!(!options.trace_sql);
    }
}
