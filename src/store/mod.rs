//! SQLite persistence for the garage: loadout records stored as JSON rows.

use crate::loadout::LoadoutRecord;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS loadouts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    chassis TEXT NOT NULL,
    saved_at TEXT NOT NULL,
    record_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_loadouts_chassis ON loadouts(chassis);
";

/// One row of the loadout listing.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLoadout {
    pub id: i64,
    pub name: String,
    pub chassis: String,
    pub saved_at: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| e.to_string())?;
        conn.execute_batch(SCHEMA).map_err(|e| e.to_string())?;
        Ok(Store { conn })
    }

    /// Inserts or replaces the loadout stored under the record's name.
    pub fn save_loadout(&self, record: &LoadoutRecord) -> Result<i64, String> {
        let now: DateTime<Utc> = Utc::now();
        let saved = now.to_rfc3339();
        let json = serde_json::to_string(record).map_err(|e| e.to_string())?;
        self.conn
            .execute(
                "INSERT INTO loadouts (name, chassis, saved_at, record_json) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name) DO UPDATE SET
                    chassis = excluded.chassis,
                    saved_at = excluded.saved_at,
                    record_json = excluded.record_json",
                params![record.name, record.chassis, saved, json],
            )
            .map_err(|e| e.to_string())?;
        let id = self
            .conn
            .query_row(
                "SELECT id FROM loadouts WHERE name = ?1",
                params![record.name],
                |r| r.get(0),
            )
            .map_err(|e| e.to_string())?;
        tracing::debug!("saved loadout {} as row {}", record.name, id);
        Ok(id)
    }

    pub fn list_loadouts(&self) -> Result<Vec<StoredLoadout>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, chassis, saved_at FROM loadouts ORDER BY name")
            .map_err(|e| e.to_string())?;
        let rows = stmt
            .query_map([], |r| {
                Ok(StoredLoadout {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    chassis: r.get(2)?,
                    saved_at: r.get(3)?,
                })
            })
            .map_err(|e| e.to_string())?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| e.to_string())?);
        }
        Ok(out)
    }

    pub fn load_record(&self, name: &str) -> Result<Option<LoadoutRecord>, String> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT record_json FROM loadouts WHERE name = ?1",
                params![name],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| e.to_string())?;
        match json {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| e.to_string()),
            None => Ok(None),
        }
    }

    /// Returns false when no loadout had that name.
    pub fn delete_loadout(&self, name: &str) -> Result<bool, String> {
        let n = self
            .conn
            .execute("DELETE FROM loadouts WHERE name = ?1", params![name])
            .map_err(|e| e.to_string())?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_catalog;
    use crate::stats::testing::laser_hunchie;

    #[test]
    fn save_list_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("garage.db")).unwrap();
        let c = test_catalog();
        let mut record = LoadoutRecord::from_loadout(&laser_hunchie(&c));
        record.name = "Lasers".to_string();

        let id = store.save_loadout(&record).unwrap();
        let again = store.save_loadout(&record).unwrap();
        assert_eq!(id, again);

        let list = store.list_loadouts().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].chassis, "HBK-4P");
        assert!(DateTime::parse_from_rfc3339(&list[0].saved_at).is_ok());

        let loaded = store.load_record("Lasers").unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.build(&c).unwrap(), record.build(&c).unwrap());

        assert!(store.load_record("missing").unwrap().is_none());
        assert!(store.delete_loadout("Lasers").unwrap());
        assert!(!store.delete_loadout("Lasers").unwrap());
    }
}
