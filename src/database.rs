//! SQLite event sink.
//!
//! Persists classified events as flat records, one row per event with every
//! optional field nullable, and supports the inverse query: grouping rows
//! back by kind to reconstruct a `ParsedLog`-shaped structure.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::models::{Event, EventKind, ParsedLog};

/// Thread-safe database wrapper
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.as_ref().display()))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            -- One flat record per classified log line
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                line_number INTEGER NOT NULL,
                event_type TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                host TEXT NOT NULL,
                pid TEXT,
                message TEXT,
                user TEXT,
                source_ip TEXT,
                source_port TEXT,
                directory TEXT,
                command TEXT,
                key_fingerprint TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);
            CREATE INDEX IF NOT EXISTS idx_events_date ON events(date);
            "#,
        )?;

        Ok(())
    }

    /// Insert every event of a parse pass in one transaction.
    /// Returns the number of rows written.
    pub fn insert_events(&self, log: &ParsedLog) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO events (line_number, event_type, date, time, host, pid, message,
                                     user, source_ip, source_port, directory, command, key_fingerprint)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )?;

            for event in log.iter() {
                stmt.execute(params![
                    event.line_number as i64,
                    event.kind.label(),
                    event.date,
                    event.time,
                    event.host,
                    event.pid,
                    event.message,
                    event.user,
                    event.source_ip,
                    event.source_port,
                    event.directory,
                    event.command,
                    event.key_fingerprint,
                ])?;
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Delete all stored events. Returns the number of rows removed.
    pub fn delete_all(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM events", [])?;
        Ok(rows)
    }

    /// Total stored event count
    pub fn count(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Reconstruct a `ParsedLog`-shaped structure from the rows of the given
    /// kinds. Rows come back in line order within each kind.
    pub fn events_for_kinds(&self, kinds: &[EventKind]) -> Result<ParsedLog> {
        let conn = self.conn.lock().unwrap();
        let mut log = ParsedLog::new();

        let mut stmt = conn.prepare(
            "SELECT line_number, date, time, host, pid, message, user, source_ip,
                    source_port, directory, command, key_fingerprint
             FROM events WHERE event_type = ? ORDER BY line_number",
        )?;

        for &kind in kinds {
            let events = stmt
                .query_map([kind.label()], |row| {
                    Ok(Event {
                        line_number: row.get::<_, i64>(0)? as u64,
                        kind,
                        date: row.get(1)?,
                        time: row.get(2)?,
                        host: row.get(3)?,
                        pid: row.get(4)?,
                        message: row.get(5)?,
                        user: row.get(6)?,
                        source_ip: row.get(7)?,
                        source_port: row.get(8)?,
                        directory: row.get(9)?,
                        command: row.get(10)?,
                        key_fingerprint: row.get(11)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            for event in events {
                log.push(event);
            }
        }

        Ok(log)
    }

    /// Reconstruct the full ten-kind log
    pub fn rebuild_log(&self) -> Result<ParsedLog> {
        self.events_for_kinds(&EventKind::ALL)
    }

    /// Earliest and latest stored event dates, for rebuilding a date range
    /// from persisted records. `None` when the table is empty.
    pub fn date_bounds(&self) -> Result<Option<(String, String)>> {
        let conn = self.conn.lock().unwrap();
        let bounds: (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(date), MAX(date) FROM events",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(match bounds {
            (Some(first), Some(last)) => Some((first, last)),
            _ => None,
        })
    }
}
