//! Database connection and item operations

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::sync::Arc;

use crate::error::StorageError;
use crate::migrations::run_migrations;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn get_item(&self, origin: &str, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| query_item(conn, origin, key))
    }

    /// Store a value, returning whatever was stored under the key before
    pub fn set_item(&self, origin: &str, key: &str, value: &str) -> Result<Option<String>> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }

        let updated_at = Utc::now().to_rfc3339();
        self.transaction(|conn| {
            let previous = query_item(conn, origin, key)?;
            conn.execute(
                "INSERT OR REPLACE INTO storage_items (origin, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![origin, key, value, updated_at],
            )?;
            Ok(previous)
        })
    }

    pub fn remove_item(&self, origin: &str, key: &str) -> Result<Option<String>> {
        self.transaction(|conn| {
            let previous = query_item(conn, origin, key)?;
            conn.execute(
                "DELETE FROM storage_items WHERE origin = ?1 AND key = ?2",
                [origin, key],
            )?;
            Ok(previous)
        })
    }

    pub fn clear(&self, origin: &str) -> Result<usize> {
        self.with_connection(|conn| {
            let removed = conn.execute("DELETE FROM storage_items WHERE origin = ?1", [origin])?;
            Ok(removed)
        })
    }

    pub fn len(&self, origin: &str) -> Result<usize> {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM storage_items WHERE origin = ?1",
                [origin],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }

    pub fn is_empty(&self, origin: &str) -> Result<bool> {
        Ok(self.len(origin)? == 0)
    }

    /// Keys for an origin in insertion-independent, sorted order
    pub fn keys(&self, origin: &str) -> Result<Vec<String>> {
        self.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT key FROM storage_items WHERE origin = ?1 ORDER BY key")?;
            let keys: Vec<String> = stmt
                .query_map([origin], |row| row.get(0))?
                .filter_map(|r| r.ok())
                .collect();
            Ok(keys)
        })
    }
}

fn query_item(conn: &Connection, origin: &str, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM storage_items WHERE origin = ?1 AND key = ?2",
            [origin, key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://app.example.com";

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 =
                conn.query_row("SELECT COUNT(*) FROM storage_items", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_set_returns_previous_value() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.set_item(ORIGIN, "app_tabs", "[]").unwrap(), None);
        assert_eq!(
            db.set_item(ORIGIN, "app_tabs", "[\"a\"]").unwrap(),
            Some("[]".to_string())
        );
        assert_eq!(
            db.get_item(ORIGIN, "app_tabs").unwrap(),
            Some("[\"a\"]".to_string())
        );
    }

    #[test]
    fn test_origins_are_partitioned() {
        let db = Database::open_in_memory().unwrap();
        db.set_item(ORIGIN, "k", "one").unwrap();
        db.set_item("https://other.example.com", "k", "two").unwrap();

        assert_eq!(db.get_item(ORIGIN, "k").unwrap(), Some("one".to_string()));
        assert_eq!(db.len(ORIGIN).unwrap(), 1);

        db.clear(ORIGIN).unwrap();
        assert!(db.is_empty(ORIGIN).unwrap());
        assert_eq!(
            db.get_item("https://other.example.com", "k").unwrap(),
            Some("two".to_string())
        );
    }

    #[test]
    fn test_remove_and_keys() {
        let db = Database::open_in_memory().unwrap();
        db.set_item(ORIGIN, "b", "2").unwrap();
        db.set_item(ORIGIN, "a", "1").unwrap();
        assert_eq!(db.keys(ORIGIN).unwrap(), vec!["a", "b"]);

        assert_eq!(db.remove_item(ORIGIN, "a").unwrap(), Some("1".to_string()));
        assert_eq!(db.remove_item(ORIGIN, "a").unwrap(), None);
        assert_eq!(db.keys(ORIGIN).unwrap(), vec!["b"]);
    }

    #[test]
    fn test_empty_key_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.set_item(ORIGIN, "", "x"),
            Err(StorageError::EmptyKey)
        ));
    }
}
