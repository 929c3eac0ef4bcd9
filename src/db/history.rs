use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use serde::Serialize;
use std::path::Path;

use super::pool::{open_memory_pool, open_rw_pool, DbPool};
use crate::error::ApiError;

/// Most recent records served by `/historial` — 7 days at hourly cadence.
pub const HISTORY_LIMIT: u32 = 168;

/// One persisted snapshot row from the `precios` table.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub bcv_usd: f64,
    pub bcv_eur: f64,
    pub binance_ves: f64,
    pub fecha: String,
}

/// Append-only store of hourly rate snapshots.
///
/// Constructed once at startup and handed to every consumer explicitly;
/// cloning shares the underlying pool.
#[derive(Clone)]
pub struct HistoryStore {
    pool: DbPool,
}

impl HistoryStore {
    pub fn open(path: &Path) -> Result<Self, ApiError> {
        let store = Self {
            pool: open_rw_pool(path, 4)?,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Store backed by an in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self, ApiError> {
        let store = Self {
            pool: open_memory_pool()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), ApiError> {
        let conn = self.pool.get()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS precios (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bcv_usd REAL,
                bcv_eur REAL,
                binance_ves REAL,
                fecha TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }

    /// Append one snapshot. The persistence gate is the caller's concern.
    pub fn insert(
        &self,
        bcv_usd: f64,
        bcv_eur: f64,
        binance_ves: f64,
        fecha: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO precios (bcv_usd, bcv_eur, binance_ves, fecha)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                bcv_usd,
                bcv_eur,
                binance_ves,
                fecha.to_rfc3339_opts(SecondsFormat::Secs, true)
            ],
        )?;
        Ok(())
    }

    /// The most recent records, returned oldest first.
    pub fn recent(&self) -> Result<Vec<HistoryRecord>, ApiError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, bcv_usd, bcv_eur, binance_ves, fecha
             FROM precios
             ORDER BY id DESC
             LIMIT ?",
        )?;

        let rows: Vec<HistoryRecord> = stmt
            .query_map(params![HISTORY_LIMIT], |row| {
                Ok(HistoryRecord {
                    id: row.get(0)?,
                    bcv_usd: row.get(1)?,
                    bcv_eur: row.get(2)?,
                    binance_ves: row.get(3)?,
                    fecha: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // Reverse to chronological order.
        let mut records = rows;
        records.reverse();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour_offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(hour_offset)
    }

    #[test]
    fn insert_and_read_back() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.insert(40.0, 50.0, 200.0, ts(0)).unwrap();

        let records = store.recent().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].bcv_usd, 40.0);
        assert_eq!(records[0].bcv_eur, 50.0);
        assert_eq!(records[0].binance_ves, 200.0);
    }

    #[test]
    fn recent_is_bounded_and_ascending() {
        let store = HistoryStore::open_in_memory().unwrap();
        for i in 0..200 {
            store.insert(36.0 + i as f64, 40.0, 230.0, ts(i)).unwrap();
        }

        let records = store.recent().unwrap();
        assert_eq!(records.len(), HISTORY_LIMIT as usize);

        // Oldest of the window is row 33 (200 - 168 + 1), newest is row 200.
        assert_eq!(records.first().unwrap().id, 33);
        assert_eq!(records.last().unwrap().id, 200);
        for pair in records.windows(2) {
            assert!(pair[0].id < pair[1].id);
            assert!(pair[0].fecha < pair[1].fecha);
        }
    }

    #[test]
    fn empty_store_reads_empty() {
        let store = HistoryStore::open_in_memory().unwrap();
        assert!(store.recent().unwrap().is_empty());
    }
}
