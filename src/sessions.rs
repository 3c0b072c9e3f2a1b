// src/sessions.rs

use crate::error::StoreError;
use crate::models::{ProblemResult, SessionMode, SessionRecord, SessionType};
use crate::store::{SessionTable, StoreResult};
use log::{error, info};

/// Summarizes a session's results. Returns `None` when nothing was attempted,
/// since an empty session is never stored.
pub fn build_session_record(
    results: &[ProblemResult],
    mode: SessionMode,
    started_at: i64,
    ended_at: i64,
) -> Option<SessionRecord> {
    if results.is_empty() {
        return None;
    }

    let length = results.len() as u32;
    let total_time: u64 = results.iter().map(|r| r.time_taken_ms).sum();
    let correct_count = results.iter().filter(|r| r.is_correct).count() as u32;

    Some(SessionRecord {
        id: None,
        started_at,
        ended_at,
        length,
        mode,
        session_type: SessionType::from_length(length),
        correct_count,
        avg_time_ms: total_time as f64 / length as f64,
    })
}

/// Persists a finished session and returns it with its assigned id.
pub fn save_session<T>(table: &T, record: &SessionRecord) -> StoreResult<SessionRecord>
where
    T: SessionTable + ?Sized,
{
    if record.length == 0 {
        return Err(StoreError::EmptySession);
    }

    let id = table
        .insert_session(record)
        .inspect_err(|e| error!("[Sessions] Failed to save session: {}", e))?;

    info!(
        "[Sessions] Saved session {} ({}, {} problems, {}/{} correct)",
        id, record.session_type, record.length, record.correct_count, record.length
    );
    Ok(SessionRecord {
        id: Some(id),
        ..record.clone()
    })
}
