//! SQLite persistence layer: the run log.
//!
//! RULE: Only store.rs talks to the database.
//! The engine calls store methods; the clock never touches SQL.

use rusqlite::{params, Connection, OptionalExtension};
use crate::{
    error::SimResult,
    event::EventLogEntry,
    types::Tick,
};

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the run database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: readers don't block the tick loop.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        version: &str,
        config_json: &str,
        started_at: &str,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, version, config, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, version, config_json, started_at],
        )?;
        Ok(())
    }

    pub fn run_exists(&self, run_id: &str) -> SimResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM run WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        insert_event(&self.conn, entry)
    }

    /// Append a batch of events atomically: all rows land or none do.
    pub fn append_events(&self, entries: &[EventLogEntry]) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for entry in entries {
            insert_event(&tx, entry)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Drop every event logged after `tick`. Returns the number removed.
    pub fn truncate_events_after(&self, run_id: &str, tick: Tick) -> SimResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM event_log WHERE run_id = ?1 AND tick > ?2",
            params![run_id, tick as i64],
        )?;
        Ok(removed)
    }

    pub fn events_for_tick(&self, run_id: &str, tick: Tick) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, tick, source, event_type, payload
             FROM event_log WHERE run_id = ?1 AND tick = ?2
             ORDER BY id ASC"
        )?;
        let entries = stmt.query_map(params![run_id, tick as i64], |row| {
            Ok(EventLogEntry {
                id:         Some(row.get(0)?),
                run_id:     row.get(1)?,
                tick:       row.get::<_, i64>(2)? as u64,
                source:     row.get(3)?,
                event_type: row.get(4)?,
                payload:    row.get(5)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn save_snapshot(&self, run_id: &str, tick: Tick, payload: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshot (run_id, tick, payload) VALUES (?1, ?2, ?3)",
            params![run_id, tick as i64, payload],
        )?;
        Ok(())
    }

    pub fn latest_snapshot(&self, run_id: &str) -> SimResult<Option<(Tick, String)>> {
        let result = self.conn.query_row(
            "SELECT tick, payload FROM snapshot
             WHERE run_id = ?1
             ORDER BY tick DESC LIMIT 1",
            params![run_id],
            |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?)),
        ).optional()?;
        Ok(result)
    }
}

fn insert_event(conn: &Connection, entry: &EventLogEntry) -> SimResult<()> {
    conn.execute(
        "INSERT INTO event_log (run_id, tick, source, event_type, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.run_id,
            entry.tick as i64,
            entry.source,
            entry.event_type,
            entry.payload,
        ],
    )?;
    Ok(())
}
