//! Product store module
//!
//! File-backed `SQLite` store behind `/search`. A fresh connection is opened
//! per query and nothing is locked or wrapped in a transaction.

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{params, Connection};

use crate::config::{DatabaseConfig, DB_PASSWORD};
use crate::error::AppError;
use crate::utils::weak_password_hash;

pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    price REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    password_hash TEXT NOT NULL
);
";

const SAMPLE_PRODUCTS: &[(&str, f64)] = &[
    ("Widget", 9.99),
    ("Gadget", 19.99),
    ("Gizmo", 29.5),
    ("Blue Widget", 12.0),
];

const SAMPLE_USERS: &[(&str, &str)] = &[("admin", DB_PASSWORD), ("alice", "password1")];

/// One result row, columns in select order
pub type Row = Vec<Value>;

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the store file and bootstrap its tables
    pub fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        let path = PathBuf::from(&config.path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self { path };
        let conn = store.connect()?;
        conn.execute_batch(CREATE_TABLES)?;
        if config.seed {
            seed(&conn)?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, AppError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Run a SQL string exactly as given and collect every row
    pub fn raw_query(&self, sql: &str) -> Result<Vec<Row>, AppError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let columns = stmt.column_count();

        let rows = stmt.query_map([], |row| {
            (0..columns)
                .map(|i| row.get::<_, Value>(i))
                .collect::<Result<Row, _>>()
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Fill empty tables with sample rows
fn seed(conn: &Connection) -> Result<(), AppError> {
    let products: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |r| r.get(0))?;
    if products == 0 {
        for (name, price) in SAMPLE_PRODUCTS {
            conn.execute(
                "INSERT INTO products (name, price) VALUES (?1, ?2)",
                params![name, price],
            )?;
        }
    }

    let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
    if users == 0 {
        for (username, password) in SAMPLE_USERS {
            conn.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                params![username, weak_password_hash(password)],
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_config(dir: &Path, seed: bool) -> DatabaseConfig {
        DatabaseConfig {
            path: dir.join("data/app.db").to_string_lossy().into_owned(),
            host: "localhost".to_string(),
            user: "admin".to_string(),
            password: DB_PASSWORD.to_string(),
            seed,
        }
    }

    #[test]
    fn test_open_creates_and_seeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&db_config(dir.path(), true)).unwrap();
        assert!(store.path().exists());

        let rows = store.raw_query("SELECT * FROM products").unwrap();
        assert_eq!(rows.len(), SAMPLE_PRODUCTS.len());
        assert_eq!(rows[0][1], Value::Text("Widget".to_string()));
    }

    #[test]
    fn test_reopen_does_not_reseed() {
        let dir = tempfile::tempdir().unwrap();
        Store::open(&db_config(dir.path(), true)).unwrap();
        let store = Store::open(&db_config(dir.path(), true)).unwrap();

        let rows = store.raw_query("SELECT COUNT(*) FROM users").unwrap();
        assert_eq!(rows, vec![vec![Value::Integer(2)]]);
    }

    #[test]
    fn test_unseeded_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&db_config(dir.path(), false)).unwrap();
        assert!(store.raw_query("SELECT * FROM products").unwrap().is_empty());
    }

    #[test]
    fn test_user_passwords_are_md5() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&db_config(dir.path(), true)).unwrap();
        let rows = store
            .raw_query("SELECT password_hash FROM users WHERE username = 'admin'")
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![Value::Text("0192023a7bbd73250516f069df18b500".to_string())]]
        );
    }

    #[test]
    fn test_bad_sql_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&db_config(dir.path(), true)).unwrap();
        assert!(matches!(
            store.raw_query("SELECT * FROM nowhere"),
            Err(AppError::Database(_))
        ));
    }
}
