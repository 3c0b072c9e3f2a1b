// src/stats.rs

use crate::clock::Clock;
use crate::constants::{EMA_ALPHA, RECENT_ATTEMPTS_MAX};
use crate::models::{AttemptLog, ProblemRecord, ProblemStats, RecentAttempt};
use crate::store::{ProblemTable, StoreResult};
use log::{debug, error, info};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Folds one attempt into a problem's record, creating it on first sight.
pub fn apply_attempt(existing: Option<ProblemRecord>, log: &AttemptLog, now: i64) -> ProblemRecord {
    let attempt = RecentAttempt {
        ts: now,
        correct: log.is_correct,
        time_ms: log.time_ms,
        user_answer: log.user_answer,
    };

    let Some(mut record) = existing else {
        return ProblemRecord {
            key: log.key.clone(),
            a: log.a,
            b: log.b,
            recent: vec![attempt],
            stats: ProblemStats {
                seen: 1,
                wrong: if log.is_correct { 0 } else { 1 },
                streak_correct: if log.is_correct { 1 } else { 0 },
                last_seen_at: now,
                last_wrong_at: if log.is_correct { None } else { Some(now) },
                // First sample seeds the average exactly
                ema_time_ms: log.time_ms as f64,
            },
            updated_at: now,
        };
    };

    let stats = &mut record.stats;
    stats.seen += 1;
    if log.is_correct {
        stats.streak_correct += 1;
    } else {
        stats.wrong += 1;
        stats.streak_correct = 0;
        stats.last_wrong_at = Some(now);
    }
    stats.last_seen_at = now;
    stats.ema_time_ms = EMA_ALPHA * log.time_ms as f64 + (1.0 - EMA_ALPHA) * stats.ema_time_ms;

    record.recent.insert(0, attempt);
    record.recent.truncate(RECENT_ATTEMPTS_MAX);
    record.updated_at = now;
    record
}

/// Applies an attempt to durable storage as a single read-modify-write.
pub fn record_attempt<T>(table: &T, clock: &dyn Clock, log: &AttemptLog) -> StoreResult<ProblemRecord>
where
    T: ProblemTable + ?Sized,
{
    let now = clock.now_ms();
    debug!(
        "[Stats Input] {} correct: {}, time: {}ms, answer: {:?}",
        log.key, log.is_correct, log.time_ms, log.user_answer
    );

    let record = table.update_problem(&log.key, &mut |existing| apply_attempt(existing, log, now))?;

    info!(
        "[Stats Result] {}: seen {}, wrong {}, streak {}, ema {:.0}ms",
        record.key,
        record.stats.seen,
        record.stats.wrong,
        record.stats.streak_correct,
        record.stats.ema_time_ms
    );
    Ok(record)
}

/// Fire-and-forget variant used while a session is running. A failed write is
/// logged and dropped; the session never waits on it. The handle is only there
/// for callers that want to wait (tests, shutdown).
pub fn dispatch_attempt<T>(table: Arc<T>, clock: Arc<dyn Clock>, log: AttemptLog) -> JoinHandle<()>
where
    T: ProblemTable + Send + Sync + ?Sized + 'static,
{
    thread::spawn(move || {
        if let Err(e) = record_attempt(table.as_ref(), clock.as_ref(), &log) {
            error!("[Stats] Failed to update stats for {}: {}", log.key, e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory::MemoryStore;

    fn log(key: &str, correct: bool, time_ms: u64) -> AttemptLog {
        let (a, b) = crate::generator::parse_key(key).unwrap();
        AttemptLog {
            key: key.to_string(),
            a,
            b,
            is_correct: correct,
            time_ms,
            user_answer: Some(if correct { a * b } else { a * b + 1 }),
        }
    }

    #[test]
    fn first_attempt_seeds_record() {
        let rec = apply_attempt(None, &log("12x34", false, 3_000), 500);
        assert_eq!(rec.stats.seen, 1);
        assert_eq!(rec.stats.wrong, 1);
        assert_eq!(rec.stats.streak_correct, 0);
        assert_eq!(rec.stats.last_wrong_at, Some(500));
        assert_eq!(rec.stats.ema_time_ms, 3_000.0);
        assert_eq!(rec.recent.len(), 1);

        let ok = apply_attempt(None, &log("12x34", true, 1_000), 500);
        assert_eq!(ok.stats.wrong, 0);
        assert_eq!(ok.stats.streak_correct, 1);
        assert_eq!(ok.stats.last_wrong_at, None);
    }

    #[test]
    fn ema_weights_newest_sample_by_a_quarter() {
        let first = apply_attempt(None, &log("20x20", true, 4_000), 1);
        let second = apply_attempt(Some(first), &log("20x20", true, 8_000), 2);
        assert!((second.stats.ema_time_ms - (0.25 * 8_000.0 + 0.75 * 4_000.0)).abs() < 1e-9);
    }

    #[test]
    fn streak_resets_on_first_miss_and_last_wrong_sticks() {
        let mut rec = None;
        for t in 1..=4 {
            rec = Some(apply_attempt(rec, &log("30x40", true, 1_000), t));
        }
        let rec = rec.unwrap();
        assert_eq!(rec.stats.streak_correct, 4);

        let missed = apply_attempt(Some(rec), &log("30x40", false, 1_000), 5);
        assert_eq!(missed.stats.streak_correct, 0);
        assert_eq!(missed.stats.last_wrong_at, Some(5));

        let again = apply_attempt(Some(missed), &log("30x40", true, 1_000), 6);
        assert_eq!(again.stats.streak_correct, 1);
        assert_eq!(again.stats.last_wrong_at, Some(5));
        assert_eq!(again.stats.last_seen_at, 6);
        assert_eq!(again.stats.seen, 6);
        assert_eq!(again.stats.wrong, 1);
    }

    #[test]
    fn recent_is_bounded_and_newest_first() {
        let mut rec = None;
        for t in 1..=7 {
            rec = Some(apply_attempt(rec, &log("50x60", t % 2 == 0, t as u64 * 100), t));
        }
        let rec = rec.unwrap();
        let stamps: Vec<i64> = rec.recent.iter().map(|a| a.ts).collect();
        assert_eq!(stamps, vec![7, 6, 5, 4, 3]);
        assert!(rec.stats.wrong <= rec.stats.seen);
        assert!(rec.stats.streak_correct <= rec.stats.seen);
    }

    #[test]
    fn record_attempt_goes_through_storage() {
        let store = MemoryStore::new();
        let clock = FixedClock::at(1_000);
        record_attempt(&store, &clock, &log("12x34", true, 2_000)).unwrap();
        clock.advance(10);
        let rec = record_attempt(&store, &clock, &log("12x34", false, 6_000)).unwrap();

        assert_eq!(rec.stats.seen, 2);
        assert_eq!(rec.stats.last_wrong_at, Some(1_010));
        assert_eq!(store.get_problem("12x34").unwrap(), Some(rec));
    }

    #[test]
    fn dispatched_failure_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(0));

        let handle = dispatch_attempt(Arc::clone(&store), clock, log("12x34", true, 900));
        assert!(handle.join().is_ok());
        assert_eq!(store.get_problem("12x34").unwrap(), None);
    }

    #[test]
    fn concurrent_attempts_keep_counts_consistent() {
        let store = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(0));
        let handles: Vec<_> = (0..40)
            .map(|i| {
                dispatch_attempt(Arc::clone(&store), Arc::clone(&clock), log("77x88", i % 3 != 0, 1_500))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let rec = store.get_problem("77x88").unwrap().unwrap();
        assert_eq!(rec.stats.seen, 40);
        assert_eq!(rec.stats.wrong, 14);
        assert!(rec.stats.wrong <= rec.stats.seen);
    }
}
