// src/store.rs

use crate::error::StoreError;
use crate::models::{ProblemRecord, SessionRecord, SessionType};

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable per-problem statistics, keyed by the canonical pair string.
pub trait ProblemTable {
    fn get_problem(&self, key: &str) -> StoreResult<Option<ProblemRecord>>;

    /// Insert-or-replace.
    fn put_problem(&self, record: &ProblemRecord) -> StoreResult<()>;

    fn scan_problems(&self) -> StoreResult<Vec<ProblemRecord>>;

    /// Reads the record for `key`, hands it to `apply`, and writes the result back
    /// as one unit. No other update of the same key can interleave.
    fn update_problem(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<ProblemRecord>) -> ProblemRecord,
    ) -> StoreResult<ProblemRecord>;
}

/// Durable per-session summaries with an auto-assigned sequential id.
pub trait SessionTable {
    fn insert_session(&self, record: &SessionRecord) -> StoreResult<i64>;

    fn sessions_by_type(&self, session_type: SessionType) -> StoreResult<Vec<SessionRecord>>;

    /// Newest first by `started_at`.
    fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<SessionRecord>>;

    fn scan_sessions(&self) -> StoreResult<Vec<SessionRecord>>;
}

pub trait Store: ProblemTable + SessionTable + Send + Sync {}

impl<T: ProblemTable + SessionTable + Send + Sync> Store for T {}
