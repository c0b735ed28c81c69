use anyhow::{anyhow, Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::models::{Entry, OutreachStatus, RawEntry, StatusChange};

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub records_found: usize,
    pub entries_added: usize,
    pub duplicates: usize,
    pub errors: usize,
}

impl Database {
    pub fn open() -> Result<Self> {
        Self::open_at(&Self::default_path()?)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "founder-links") {
            Ok(proj_dirs.data_dir().join("founder-links.db"))
        } else {
            Ok(PathBuf::from("founder-links.db"))
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company TEXT,
                raw_json TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'saved' CHECK (status IN ('saved', 'contacted', 'replied', 'interviewing', 'closed')),
                notes TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS status_changes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entry_id INTEGER NOT NULL REFERENCES entries(id),
                status TEXT NOT NULL,
                note TEXT,
                changed_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_entries_status ON entries(status);
            CREATE INDEX IF NOT EXISTS idx_status_changes_entry ON status_changes(entry_id);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='entries'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'founder-links init' first."
            ));
        }
        Ok(())
    }

    // --- Entry operations ---

    /// Stores one scraped record. Returns `None` when an identical record is
    /// already present.
    pub fn add_entry(&self, record: &Value) -> Result<Option<i64>> {
        if !record.is_object() {
            return Err(anyhow!("Record is not a JSON object"));
        }
        let raw: RawEntry = serde_json::from_value(record.clone())
            .context("Failed to decode record")?;
        let raw_json = serde_json::to_string(record)?;

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO entries (company, raw_json) VALUES (?1, ?2)",
            params![raw.display_name(), raw_json],
        )?;
        if inserted == 0 {
            return Ok(None);
        }

        let entry_id = self.conn.last_insert_rowid();
        self.record_status_change(entry_id, OutreachStatus::Saved, Some("imported"))?;
        Ok(Some(entry_id))
    }

    pub fn import_records(&self, records: &[Value]) -> Result<ImportStats> {
        let mut stats = ImportStats {
            records_found: records.len(),
            ..Default::default()
        };

        let tx = self.conn.unchecked_transaction()?;
        for (index, record) in records.iter().enumerate() {
            match self.add_entry(record) {
                Ok(Some(_)) => stats.entries_added += 1,
                Ok(None) => stats.duplicates += 1,
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!(index, error = %e, "skipping record");
                }
            }
        }
        tx.commit()?;

        Ok(stats)
    }

    pub fn list_entries(
        &self,
        status: Option<OutreachStatus>,
        company: Option<&str>,
    ) -> Result<Vec<Entry>> {
        let mut sql = String::from(
            "SELECT id, company, raw_json, status, notes, created_at, updated_at
             FROM entries
             WHERE 1=1",
        );

        let mut params: Vec<String> = vec![];

        if let Some(s) = status {
            sql.push_str(&format!(" AND status = ?{}", params.len() + 1));
            params.push(s.as_str().to_string());
        }

        if let Some(c) = company {
            sql.push_str(&format!(" AND LOWER(company) LIKE LOWER(?{})", params.len() + 1));
            params.push(format!("%{}%", c));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), Self::row_to_entry)?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list entries")
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<Entry>> {
        let result = self.conn.query_row(
            "SELECT id, company, raw_json, status, notes, created_at, updated_at
             FROM entries WHERE id = ?1",
            [id],
            Self::row_to_entry,
        );
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Moves an entry to another outreach column. The note belongs to the
    /// change, not the entry. Returns false when the entry does not exist.
    pub fn set_status(&self, id: i64, status: OutreachStatus, note: Option<&str>) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE entries SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if updated == 0 {
            return Ok(false);
        }
        self.record_status_change(id, status, note)?;
        Ok(true)
    }

    /// Replaces the entry's free-form notes; `None` clears them.
    pub fn set_notes(&self, id: i64, notes: Option<&str>) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE entries SET notes = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![notes, id],
        )?;
        Ok(updated > 0)
    }

    fn record_status_change(&self, entry_id: i64, status: OutreachStatus, note: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO status_changes (entry_id, status, note) VALUES (?1, ?2, ?3)",
            params![entry_id, status.as_str(), note],
        )?;
        Ok(())
    }

    pub fn status_history(&self, entry_id: i64) -> Result<Vec<StatusChange>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entry_id, status, note, changed_at
             FROM status_changes WHERE entry_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([entry_id], |row| {
            Ok(StatusChange {
                id: row.get(0)?,
                entry_id: row.get(1)?,
                status: parse_status(row, 2)?,
                note: row.get(3)?,
                changed_at: row.get(4)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to load status history")
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        let raw_json: String = row.get(2)?;
        let raw: RawEntry = serde_json::from_str(&raw_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        Ok(Entry {
            id: row.get(0)?,
            company: row.get(1)?,
            raw,
            status: parse_status(row, 3)?,
            notes: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

fn parse_status(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<OutreachStatus> {
    let text: String = row.get(idx)?;
    text.parse::<OutreachStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// Accepts either a JSON array of records or a single record object.
pub fn parse_records(json: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(json).context("Input is not valid JSON")?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Ok(vec![value]),
        _ => Err(anyhow!("Expected a JSON array or object of records")),
    }
}
