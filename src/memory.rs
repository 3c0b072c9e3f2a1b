// src/memory.rs

use crate::error::StoreError;
use crate::models::{ProblemRecord, SessionRecord, SessionType};
use crate::store::{ProblemTable, SessionTable, StoreResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Process-local store. Holds the same contract as the SQLite backend and can be
/// told to fail reads or writes, which is how outages are simulated.
#[derive(Default)]
pub struct MemoryStore {
    problems: Mutex<HashMap<String, ProblemRecord>>,
    sessions: Mutex<Vec<SessionRecord>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| StoreError::Poisoned)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl ProblemTable for MemoryStore {
    fn get_problem(&self, key: &str) -> StoreResult<Option<ProblemRecord>> {
        self.check_read()?;
        Ok(lock(&self.problems)?.get(key).cloned())
    }

    fn put_problem(&self, record: &ProblemRecord) -> StoreResult<()> {
        self.check_write()?;
        lock(&self.problems)?.insert(record.key.clone(), record.clone());
        Ok(())
    }

    fn scan_problems(&self) -> StoreResult<Vec<ProblemRecord>> {
        self.check_read()?;
        Ok(lock(&self.problems)?.values().cloned().collect())
    }

    fn update_problem(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<ProblemRecord>) -> ProblemRecord,
    ) -> StoreResult<ProblemRecord> {
        self.check_read()?;
        self.check_write()?;
        // Table lock held across the whole read-modify-write.
        let mut problems = lock(&self.problems)?;
        let updated = apply(problems.get(key).cloned());
        problems.insert(key.to_string(), updated.clone());
        Ok(updated)
    }
}

impl SessionTable for MemoryStore {
    fn insert_session(&self, record: &SessionRecord) -> StoreResult<i64> {
        self.check_write()?;
        let mut sessions = lock(&self.sessions)?;
        let id = sessions.len() as i64 + 1;
        sessions.push(SessionRecord {
            id: Some(id),
            ..record.clone()
        });
        Ok(id)
    }

    fn sessions_by_type(&self, session_type: SessionType) -> StoreResult<Vec<SessionRecord>> {
        self.check_read()?;
        Ok(lock(&self.sessions)?
            .iter()
            .filter(|s| s.session_type == session_type)
            .cloned()
            .collect())
    }

    fn recent_sessions(&self, limit: usize) -> StoreResult<Vec<SessionRecord>> {
        self.check_read()?;
        let mut sessions = lock(&self.sessions)?.clone();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        sessions.truncate(limit);
        Ok(sessions)
    }

    fn scan_sessions(&self) -> StoreResult<Vec<SessionRecord>> {
        self.check_read()?;
        Ok(lock(&self.sessions)?.clone())
    }
}
