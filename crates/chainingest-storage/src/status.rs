//! SQLite-backed processing status and object inventory.
//!
//! Thread-safe via an internal `Arc<Mutex<Connection>>`; WAL mode is enabled
//! for concurrent read performance. File-backed in production, in-memory for
//! tests.
//!
//! ## Schema
//! ```sql
//! CREATE TABLE block_processing (
//!     block_number INTEGER PRIMARY KEY,
//!     gcs_path     TEXT NOT NULL,
//!     status       TEXT NOT NULL DEFAULT 'pending',
//!     errors       TEXT,
//!     created_at   TEXT NOT NULL,
//!     updated_at   TEXT NOT NULL
//! );
//! CREATE TABLE gcs_objects (
//!     path         TEXT PRIMARY KEY,
//!     block_number INTEGER,
//!     file_type    TEXT NOT NULL,
//!     size         INTEGER,
//!     updated_at   TEXT NOT NULL
//! );
//! ```

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use chainingest_core::error::StatusError;

use crate::layout::FileType;

/// Per-block processing state.
///
/// Transitions: `{absent, pending} → processing → {valid, invalid}`, with
/// `invalid → processing` permitted via reprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Valid,
    Invalid,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Valid => "valid",
            ProcessingStatus::Invalid => "invalid",
        }
    }

    pub fn parse(s: &str) -> Result<Self, StatusError> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "processing" => Ok(ProcessingStatus::Processing),
            "valid" => Ok(ProcessingStatus::Valid),
            "invalid" => Ok(ProcessingStatus::Invalid),
            other => Err(StatusError::Database(format!(
                "unknown processing status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of `block_processing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub block_number: u64,
    pub gcs_path: String,
    pub status: ProcessingStatus,
    pub errors: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `gcs_objects` — the storage inventory cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
    pub block_number: Option<u64>,
    pub file_type: FileType,
    pub size: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed status tracker and object inventory.
#[derive(Clone)]
pub struct StatusStore {
    conn: Arc<Mutex<Connection>>,
}

impl StatusStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StatusError> {
        let conn = Connection::open(path.as_ref()).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(db_err)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (tests, dry runs).
    pub fn in_memory() -> Result<Self, StatusError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StatusError> {
        self.conn
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS block_processing (
                    block_number INTEGER PRIMARY KEY,
                    gcs_path     TEXT NOT NULL,
                    status       TEXT NOT NULL DEFAULT 'pending',
                    errors       TEXT,
                    created_at   TEXT NOT NULL,
                    updated_at   TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS block_processing_status
                    ON block_processing (status);
                CREATE TABLE IF NOT EXISTS gcs_objects (
                    path         TEXT PRIMARY KEY,
                    block_number INTEGER,
                    file_type    TEXT NOT NULL,
                    size         INTEGER,
                    updated_at   TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS gcs_objects_block
                    ON gcs_objects (block_number);",
            )
            .map_err(db_err)
    }

    // ─── block_processing ───────────────────────────────────────────────────

    /// Record or refresh a block's row, setting path and status.
    pub fn record_block(
        &self,
        block_number: u64,
        gcs_path: &str,
        status: ProcessingStatus,
    ) -> Result<(), StatusError> {
        let now = now_str();
        self.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO block_processing
                     (block_number, gcs_path, status, errors, created_at, updated_at)
                 VALUES (?1, ?2, ?3, NULL, ?4, ?4)
                 ON CONFLICT(block_number) DO UPDATE SET
                     gcs_path = excluded.gcs_path,
                     status = excluded.status,
                     updated_at = excluded.updated_at",
                params![block_number as i64, gcs_path, status.as_str(), now],
            )
            .map_err(db_err)?;
        debug!(block = block_number, %status, "block recorded");
        Ok(())
    }

    /// Update the status (and error text) of an existing row.
    pub fn update_status(
        &self,
        block_number: u64,
        status: ProcessingStatus,
        errors: Option<&str>,
    ) -> Result<(), StatusError> {
        let changed = self
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE block_processing
                 SET status = ?2, errors = ?3, updated_at = ?4
                 WHERE block_number = ?1",
                params![block_number as i64, status.as_str(), errors, now_str()],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(StatusError::BlockNotFound { block_number });
        }
        debug!(block = block_number, %status, "status updated");
        Ok(())
    }

    /// Fetch one block's row.
    pub fn get_block(&self, block_number: u64) -> Result<Option<BlockRecord>, StatusError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT block_number, gcs_path, status, errors, created_at, updated_at
                 FROM block_processing WHERE block_number = ?1",
            )
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map(params![block_number as i64], row_to_record)
            .map_err(db_err)?;
        match rows.next() {
            Some(row) => Ok(Some(row.map_err(db_err)?)),
            None => Ok(None),
        }
    }

    /// Blocks with a given status, newest first, bounded by `limit`.
    pub fn blocks_by_status(
        &self,
        status: ProcessingStatus,
        limit: usize,
    ) -> Result<Vec<BlockRecord>, StatusError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT block_number, gcs_path, status, errors, created_at, updated_at
                 FROM block_processing WHERE status = ?1
                 ORDER BY block_number DESC LIMIT ?2",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![status.as_str(), limit as i64], row_to_record)
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    /// Blocks within `[min, max]`, optionally filtered by status, ascending.
    pub fn blocks_in_range(
        &self,
        min: u64,
        max: u64,
        status: Option<ProcessingStatus>,
    ) -> Result<Vec<BlockRecord>, StatusError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT block_number, gcs_path, status, errors, created_at, updated_at
                 FROM block_processing
                 WHERE block_number >= ?1 AND block_number <= ?2
                   AND (?3 IS NULL OR status = ?3)
                 ORDER BY block_number",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(
                params![min as i64, max as i64, status.map(|s| s.as_str())],
                row_to_record,
            )
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    /// Revert `processing` rows older than `age` back to `pending`.
    ///
    /// Covers workers that crashed between the processing mark and a terminal
    /// mark. Returns the number of reclaimed rows.
    pub fn reclaim_stale(&self, age: Duration) -> Result<usize, StatusError> {
        let cutoff = (Utc::now() - age).to_rfc3339_opts(SecondsFormat::Micros, true);
        let changed = self
            .conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE block_processing
                 SET status = 'pending', updated_at = ?1
                 WHERE status = 'processing' AND updated_at < ?2",
                params![now_str(), cutoff],
            )
            .map_err(db_err)?;
        Ok(changed)
    }

    // ─── gcs_objects inventory ──────────────────────────────────────────────

    /// Upsert one page of inventory rows in a single transaction.
    /// Idempotent by path; last writer wins.
    pub fn upsert_objects(&self, objects: &[StoredObject]) -> Result<usize, StatusError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(db_err)?;
        for obj in objects {
            tx.execute(
                "INSERT INTO gcs_objects (path, block_number, file_type, size, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(path) DO UPDATE SET
                     block_number = excluded.block_number,
                     file_type = excluded.file_type,
                     size = excluded.size,
                     updated_at = excluded.updated_at",
                params![
                    obj.path,
                    obj.block_number.map(|n| n as i64),
                    obj.file_type.as_str(),
                    obj.size.map(|s| s as i64),
                    obj.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                ],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;
        Ok(objects.len())
    }

    /// Inventory paths of a given type, optionally bounded by block range.
    pub fn object_paths(
        &self,
        file_type: FileType,
        min: Option<u64>,
        max: Option<u64>,
        limit: Option<usize>,
    ) -> Result<Vec<String>, StatusError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT path FROM gcs_objects
                 WHERE file_type = ?1
                   AND (?2 IS NULL OR block_number >= ?2)
                   AND (?3 IS NULL OR block_number <= ?3)
                 ORDER BY block_number, path
                 LIMIT ?4",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(
                params![
                    file_type.as_str(),
                    min.map(|n| n as i64),
                    max.map(|n| n as i64),
                    limit.map(|n| n as i64).unwrap_or(-1),
                ],
                |row| row.get::<_, String>(0),
            )
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    /// Whether the inventory holds an object for `(block_number, file_type)`.
    pub fn object_exists(
        &self,
        block_number: u64,
        file_type: FileType,
    ) -> Result<bool, StatusError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM gcs_objects
                 WHERE block_number = ?1 AND file_type = ?2",
                params![block_number as i64, file_type.as_str()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(count > 0)
    }
}

fn now_str() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn db_err(e: rusqlite::Error) -> StatusError {
    StatusError::Database(e.to_string())
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlockRecord> {
    let status_str: String = row.get(2)?;
    Ok(BlockRecord {
        block_number: row.get::<_, i64>(0)? as u64,
        gcs_path: row.get(1)?,
        status: ProcessingStatus::parse(&status_str).unwrap_or(ProcessingStatus::Invalid),
        errors: row.get(3)?,
        created_at: parse_ts(&row.get::<_, String>(4)?),
        updated_at: parse_ts(&row.get::<_, String>(5)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StatusStore {
        StatusStore::in_memory().unwrap()
    }

    #[test]
    fn record_and_get() {
        let s = store();
        s.record_block(100, "raw/100.json", ProcessingStatus::Processing)
            .unwrap();

        let rec = s.get_block(100).unwrap().unwrap();
        assert_eq!(rec.gcs_path, "raw/100.json");
        assert_eq!(rec.status, ProcessingStatus::Processing);
        assert!(rec.errors.is_none());
    }

    #[test]
    fn record_upserts_path_and_status() {
        let s = store();
        s.record_block(100, "raw/old.json", ProcessingStatus::Pending)
            .unwrap();
        s.record_block(100, "raw/new.json", ProcessingStatus::Processing)
            .unwrap();

        let rec = s.get_block(100).unwrap().unwrap();
        assert_eq!(rec.gcs_path, "raw/new.json");
        assert_eq!(rec.status, ProcessingStatus::Processing);
    }

    #[test]
    fn update_status_stores_error_text() {
        let s = store();
        s.record_block(100, "raw/100.json", ProcessingStatus::Processing)
            .unwrap();
        s.update_status(100, ProcessingStatus::Invalid, Some("validation failed"))
            .unwrap();

        let rec = s.get_block(100).unwrap().unwrap();
        assert_eq!(rec.status, ProcessingStatus::Invalid);
        assert_eq!(rec.errors.as_deref(), Some("validation failed"));
    }

    #[test]
    fn update_missing_block_is_an_error() {
        let err = store()
            .update_status(42, ProcessingStatus::Valid, None)
            .unwrap_err();
        assert!(matches!(err, StatusError::BlockNotFound { block_number: 42 }));
    }

    #[test]
    fn blocks_by_status_newest_first_with_limit() {
        let s = store();
        for n in 1..=5u64 {
            s.record_block(n, &format!("raw/{n}.json"), ProcessingStatus::Invalid)
                .unwrap();
        }
        s.record_block(6, "raw/6.json", ProcessingStatus::Valid).unwrap();

        let invalid = s.blocks_by_status(ProcessingStatus::Invalid, 3).unwrap();
        let numbers: Vec<u64> = invalid.iter().map(|r| r.block_number).collect();
        assert_eq!(numbers, vec![5, 4, 3]);
    }

    #[test]
    fn blocks_in_range_with_status_filter() {
        let s = store();
        s.record_block(10, "raw/10.json", ProcessingStatus::Valid).unwrap();
        s.record_block(11, "raw/11.json", ProcessingStatus::Invalid).unwrap();
        s.record_block(12, "raw/12.json", ProcessingStatus::Valid).unwrap();
        s.record_block(20, "raw/20.json", ProcessingStatus::Valid).unwrap();

        let all = s.blocks_in_range(10, 12, None).unwrap();
        assert_eq!(all.len(), 3);

        let valid = s
            .blocks_in_range(10, 12, Some(ProcessingStatus::Valid))
            .unwrap();
        let numbers: Vec<u64> = valid.iter().map(|r| r.block_number).collect();
        assert_eq!(numbers, vec![10, 12]);
    }

    #[test]
    fn reclaim_stale_only_touches_old_processing_rows() {
        let s = store();
        s.record_block(1, "raw/1.json", ProcessingStatus::Processing).unwrap();
        s.record_block(2, "raw/2.json", ProcessingStatus::Valid).unwrap();

        // Nothing is older than an hour yet
        assert_eq!(s.reclaim_stale(Duration::hours(1)).unwrap(), 0);

        // With a zero threshold the processing row is reclaimed
        assert_eq!(s.reclaim_stale(Duration::zero()).unwrap(), 1);
        assert_eq!(
            s.get_block(1).unwrap().unwrap().status,
            ProcessingStatus::Pending
        );
        assert_eq!(
            s.get_block(2).unwrap().unwrap().status,
            ProcessingStatus::Valid
        );
    }

    #[test]
    fn inventory_upsert_is_idempotent() {
        let s = store();
        let obj = StoredObject {
            path: "raw/100.json".into(),
            block_number: Some(100),
            file_type: FileType::Raw,
            size: Some(2048),
            updated_at: Utc::now(),
        };
        s.upsert_objects(&[obj.clone()]).unwrap();
        s.upsert_objects(&[obj]).unwrap();

        let paths = s.object_paths(FileType::Raw, None, None, None).unwrap();
        assert_eq!(paths, vec!["raw/100.json"]);
    }

    #[test]
    fn object_paths_filter_by_range_and_type() {
        let s = store();
        let obj = |path: &str, n: u64, ft: FileType| StoredObject {
            path: path.into(),
            block_number: Some(n),
            file_type: ft,
            size: None,
            updated_at: Utc::now(),
        };
        s.upsert_objects(&[
            obj("raw/100.json", 100, FileType::Raw),
            obj("raw/101.json", 101, FileType::Raw),
            obj("raw/200.json", 200, FileType::Raw),
            obj("decoded/100.json", 100, FileType::Decoded),
        ])
        .unwrap();

        let in_range = s
            .object_paths(FileType::Raw, Some(100), Some(150), None)
            .unwrap();
        assert_eq!(in_range, vec!["raw/100.json", "raw/101.json"]);

        assert!(s.object_exists(100, FileType::Decoded).unwrap());
        assert!(!s.object_exists(101, FileType::Decoded).unwrap());
    }
}
