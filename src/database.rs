use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
}

/// Key-value storage with the shape of the browser Web Storage API.
/// Values are opaque strings; callers serialize JSON into them.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
    fn remove_item(&self, key: &str) -> Result<(), DatabaseError>;
    fn clear(&self) -> Result<(), DatabaseError>;
}

/// Which storage area a `StorageArea` reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Area {
    /// Kept until explicitly removed
    Local,
    /// Kept across restarts, dropped when a new session starts
    Session,
}

impl Area {
    fn table(&self) -> &'static str {
        match self {
            Area::Local => "local_storage",
            Area::Session => "session_storage",
        }
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;

        let db = Database { conn };
        db.initialize_schema()?;
        log::debug!("Opened storage database at {:?}", db_path);

        Ok(db)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema (one table per storage area)
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        for area in [Area::Local, Area::Session] {
            self.conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        key             TEXT PRIMARY KEY,
                        value           TEXT NOT NULL,
                        updated_at      TEXT NOT NULL
                    )",
                    area.table()
                ),
                [],
            )?;
        }
        Ok(())
    }

    pub fn local(&self) -> StorageArea<'_> {
        StorageArea { conn: &self.conn, area: Area::Local }
    }

    pub fn session(&self) -> StorageArea<'_> {
        StorageArea { conn: &self.conn, area: Area::Session }
    }

    /// Drop everything in the session area
    pub fn start_new_session(&self) -> Result<(), DatabaseError> {
        log::info!("Starting a new session, clearing session storage");
        self.session().clear()
    }
}

/// One storage area of a `Database`
#[derive(Clone, Copy)]
pub struct StorageArea<'a> {
    conn: &'a Connection,
    area: Area,
}

impl StorageArea<'_> {
    /// All keys in this area, sorted
    pub fn keys(&self) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT key FROM {} ORDER BY key ASC", self.area.table()))?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl Storage for StorageArea<'_> {
    fn get_item(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                &format!("SELECT value FROM {} WHERE key = ?1", self.area.table()),
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.conn.execute(
            &format!(
                "INSERT INTO {} (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                self.area.table()
            ),
            rusqlite::params![key, value, now],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            &format!("DELETE FROM {} WHERE key = ?1", self.area.table()),
            rusqlite::params![key],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute(&format!("DELETE FROM {}", self.area.table()), [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_and_overwrite() {
        let db = Database::open_in_memory().unwrap();
        let local = db.local();

        assert_eq!(local.get_item("invoices").unwrap(), None);
        local.set_item("invoices", "[]").unwrap();
        local.set_item("invoices", "[1]").unwrap();
        assert_eq!(local.get_item("invoices").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn areas_are_independent() {
        let db = Database::open_in_memory().unwrap();
        db.local().set_item("k", "local").unwrap();
        db.session().set_item("k", "session").unwrap();

        assert_eq!(db.local().get_item("k").unwrap().as_deref(), Some("local"));
        assert_eq!(db.session().get_item("k").unwrap().as_deref(), Some("session"));

        db.session().remove_item("k").unwrap();
        assert_eq!(db.session().get_item("k").unwrap(), None);
        assert_eq!(db.local().get_item("k").unwrap().as_deref(), Some("local"));
    }

    #[test]
    fn new_session_only_clears_session_area() {
        let db = Database::open_in_memory().unwrap();
        db.local().set_item("invoices", "[]").unwrap();
        db.session().set_item("currentInvoice", "{}").unwrap();
        db.session().set_item("other", "x").unwrap();

        db.start_new_session().unwrap();

        assert!(db.session().keys().unwrap().is_empty());
        assert_eq!(db.local().keys().unwrap(), vec!["invoices".to_string()]);
    }
}
