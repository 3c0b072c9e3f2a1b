// src/repository.rs

use crate::database;
use crate::error::StoreError;
use crate::models::{ProblemRecord, ProblemStats, SessionRecord, SessionType};
use crate::store::{ProblemTable, SessionTable, StoreResult};
use log::{debug, info};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row, TransactionBehavior};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

const PROBLEM_COLUMNS: &str = "key, a, b, seen, wrong, streak_correct, last_seen_at, last_wrong_at, ema_time_ms, recent, updated_at";
const SESSION_COLUMNS: &str =
    "id, started_at, ended_at, length, mode, session_type, correct_count, avg_time_ms";

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, err.into())
}

fn row_to_problem(row: &Row) -> Result<ProblemRecord> {
    let recent_json: String = row.get(9)?;
    let recent =
        serde_json::from_str(&recent_json).map_err(|e| conversion_error(9, Type::Text, e))?;

    Ok(ProblemRecord {
        key: row.get(0)?,
        a: row.get(1)?,
        b: row.get(2)?,
        stats: ProblemStats {
            seen: row.get(3)?,
            wrong: row.get(4)?,
            streak_correct: row.get(5)?,
            last_seen_at: row.get(6)?,
            last_wrong_at: row.get(7)?,
            ema_time_ms: row.get(8)?,
        },
        recent,
        updated_at: row.get(10)?,
    })
}

fn row_to_session(row: &Row) -> Result<SessionRecord> {
    let mode: String = row.get(4)?;
    let session_type: String = row.get(5)?;

    Ok(SessionRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        ended_at: row.get(2)?,
        length: row.get(3)?,
        mode: mode.parse().map_err(|e: String| conversion_error(4, Type::Text, e))?,
        session_type: SessionType::from_str(&session_type)
            .map_err(|e| conversion_error(5, Type::Text, e))?,
        correct_count: row.get(6)?,
        avg_time_ms: row.get(7)?,
    })
}

// --- Problems ---

/// Fetches the statistics record for a problem key.
pub fn get_problem(conn: &Connection, key: &str) -> Result<Option<ProblemRecord>> {
    conn.query_row(
        &format!("SELECT {PROBLEM_COLUMNS} FROM problems WHERE key = ?"),
        [key],
        row_to_problem,
    )
    .optional()
}

/// Inserts or replaces the statistics record for a problem.
pub fn put_problem(conn: &Connection, record: &ProblemRecord) -> StoreResult<()> {
    let recent = serde_json::to_string(&record.recent)?;
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO problems ({PROBLEM_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ),
        params![
            record.key,
            record.a,
            record.b,
            record.stats.seen,
            record.stats.wrong,
            record.stats.streak_correct,
            record.stats.last_seen_at,
            record.stats.last_wrong_at,
            record.stats.ema_time_ms,
            recent,
            record.updated_at
        ],
    )?;
    Ok(())
}

pub fn scan_problems(conn: &Connection) -> Result<Vec<ProblemRecord>> {
    let mut stmt = conn.prepare(&format!("SELECT {PROBLEM_COLUMNS} FROM problems"))?;
    let records = stmt
        .query_map([], row_to_problem)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

// --- Sessions ---

/// Stores a finished session and returns its assigned id.
pub fn insert_session(conn: &Connection, record: &SessionRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO sessions (started_at, ended_at, length, mode, session_type, correct_count, avg_time_ms)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            record.started_at,
            record.ended_at,
            record.length,
            record.mode.as_str(),
            record.session_type.as_str(),
            record.correct_count,
            record.avg_time_ms
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn sessions_by_type(conn: &Connection, session_type: SessionType) -> Result<Vec<SessionRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE session_type = ? ORDER BY id ASC"
    ))?;
    let sessions = stmt
        .query_map([session_type.as_str()], row_to_session)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sessions)
}

pub fn recent_sessions(conn: &Connection, limit: usize) -> Result<Vec<SessionRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY started_at DESC, id DESC LIMIT ?"
    ))?;
    let sessions = stmt
        .query_map([limit as i64], row_to_session)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sessions)
}

pub fn scan_sessions(conn: &Connection) -> Result<Vec<SessionRecord>> {
    let mut stmt = conn.prepare(&format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY id ASC"))?;
    let sessions = stmt
        .query_map([], row_to_session)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sessions)
}

// --- Store ---

/// SQLite-backed store. The connection sits behind a mutex so the store can be
/// shared with the threads that write attempt statistics.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> StoreResult<Self> {
        database::init_db(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    pub fn open(path: &Path) -> StoreResult<Self> {
        info!("Database path: {:?}", path);
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ProblemTable for SqliteStore {
    fn get_problem(&self, key: &str) -> StoreResult<Option<ProblemRecord>> {
        let conn = self.lock()?;
        Ok(get_problem(&conn, key)?)
    }

    fn put_problem(&self, record: &ProblemRecord) -> StoreResult<()> {
        let conn = self.lock()?;
        put_problem(&conn, record)
    }

    fn scan_problems(&self) -> StoreResult<Vec<ProblemRecord>> {
        let conn = self.lock()?;
        Ok(scan_problems(&conn)?)
    }

    fn update_problem(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<ProblemRecord>) -> ProblemRecord,
    ) -> StoreResult<ProblemRecord> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = get_problem(&tx, key)?;
        let updated = apply(existing);
        put_problem(&tx, &updated)?;
        tx.commit()?;

        debug!("[DB] Updated problem {} (seen {})", key, updated.stats.seen);
        Ok(updated)
    }
}

impl SessionTable for SqliteStore {
    fn insert_session(&self, record: &SessionRecord) -> StoreResult<i64> {
        let conn = self.lock()?;
        Ok(insert_session(&conn, record)?)
    }

    fn sessions_by_type(&self, session_type: SessionType) -> StoreResult<Vec<SessionRecord>> {
        let conn = self.lock()?;
        Ok(sessions_by_type(&conn, session_type)?)
    }

    fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<SessionRecord>> {
        let conn = self.lock()?;
        Ok(recent_sessions(&conn, limit)?)
    }

    fn scan_sessions(&self) -> StoreResult<Vec<SessionRecord>> {
        let conn = self.lock()?;
        Ok(scan_sessions(&conn)?)
    }
}
