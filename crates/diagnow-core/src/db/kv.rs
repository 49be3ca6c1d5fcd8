//! Namespaced key-value operations.

use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Database, DbResult};

/// Prefix every stored key carries.
pub const KEY_PREFIX: &str = "diagnow_";

pub const PATIENTS_KEY: &str = "patients";
pub const PRESCRIPTIONS_KEY: &str = "prescriptions";
pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

fn namespaced(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

impl Database {
    /// Read the raw value under `key`.
    pub fn get_item(&self, key: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?",
                [namespaced(key)],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Write the raw value under `key`, replacing any previous one.
    pub fn set_item(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')
            "#,
            params![namespaced(key), value],
        )?;
        Ok(())
    }

    /// Remove `key`. Returns whether it existed.
    pub fn remove_item(&self, key: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?", [namespaced(key)])?;
        Ok(rows_affected > 0)
    }

    /// Whether anything is stored under `key`.
    pub fn contains_key(&self, key: &str) -> DbResult<bool> {
        Ok(self.get_item(key)?.is_some())
    }

    /// Deserialize the JSON stored under `key`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        match self.get_item(key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Serialize `value` as JSON under `key`.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let text = serde_json::to_string(value)?;
        self.set_item(key, &text)
    }

    /// Remove every key in the namespace. Returns how many were removed.
    pub fn clear_all(&self) -> DbResult<usize> {
        let rows_affected = self.conn.execute(
            "DELETE FROM kv_store WHERE substr(key, 1, length(?1)) = ?1",
            [KEY_PREFIX],
        )?;
        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_set_get_remove() {
        let db = setup_db();
        assert_eq!(db.get_item(TOKEN_KEY).unwrap(), None);

        db.set_item(TOKEN_KEY, "abc").unwrap();
        db.set_item(TOKEN_KEY, "def").unwrap();
        assert_eq!(db.get_item(TOKEN_KEY).unwrap().as_deref(), Some("def"));

        assert!(db.remove_item(TOKEN_KEY).unwrap());
        assert!(!db.remove_item(TOKEN_KEY).unwrap());
        assert!(!db.contains_key(TOKEN_KEY).unwrap());
    }

    #[test]
    fn test_keys_are_namespaced() {
        let db = setup_db();
        db.set_item(USER_KEY, "{}").unwrap();

        let stored: String = db
            .conn()
            .query_row("SELECT key FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, "diagnow_user");
    }

    #[test]
    fn test_json_round_trip() {
        let db = setup_db();
        db.set_json("numbers", &vec![1, 2, 3]).unwrap();
        let back: Option<Vec<i32>> = db.get_json("numbers").unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_corrupt_json_is_an_error() {
        let db = setup_db();
        db.set_item(PATIENTS_KEY, "not json").unwrap();
        let result: DbResult<Option<Vec<i32>>> = db.get_json(PATIENTS_KEY);
        assert!(result.is_err());
    }

    #[test]
    fn test_clear_all_only_touches_namespace() {
        let db = setup_db();
        db.set_item(TOKEN_KEY, "t").unwrap();
        db.set_item(USER_KEY, "{}").unwrap();
        db.conn()
            .execute("INSERT INTO kv_store (key, value) VALUES ('other_app', 'x')", [])
            .unwrap();

        assert_eq!(db.clear_all().unwrap(), 2);

        let remaining: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
