// src/personal_best.rs

use crate::models::{RecordComparison, SessionRecord};
use crate::store::{SessionTable, StoreResult};
use log::{debug, info};

/// Compares a finished session against stored sessions of the same type.
pub fn check_personal_best<T>(table: &T, current: &SessionRecord) -> StoreResult<RecordComparison>
where
    T: SessionTable + ?Sized,
{
    let history = table.sessions_by_type(current.session_type)?;
    let comparison = compare_with_history(current, &history);

    info!(
        "[Records] {} run of {} ({:.0}ms avg): new record = {}",
        current.session_type, current.length, current.avg_time_ms, comparison.is_new_record
    );
    Ok(comparison)
}

/// Pure comparison. `history` may contain `current` itself; it is skipped by id.
pub fn compare_with_history(current: &SessionRecord, history: &[SessionRecord]) -> RecordComparison {
    let others: Vec<&SessionRecord> = history
        .iter()
        .filter(|s| s.session_type == current.session_type)
        .filter(|s| current.id.is_none() || s.id != current.id)
        .collect();
    debug!("[Records] Comparing against {} prior sessions", others.len());

    match current.session_type.target_length() {
        None => compare_endurance(current, &others),
        Some(target) => compare_timed(current, &others, target),
    }
}

/// Longest run wins; at equal length the lower average time wins.
fn compare_endurance(current: &SessionRecord, others: &[&SessionRecord]) -> RecordComparison {
    if others.is_empty() {
        return RecordComparison {
            is_new_record: true,
            ..Default::default()
        };
    }

    let mut best_length = 0;
    let mut best_pace = f64::INFINITY;
    for s in others {
        if s.length > best_length {
            best_length = s.length;
            best_pace = s.avg_time_ms;
        } else if s.length == best_length && s.avg_time_ms < best_pace {
            best_pace = s.avg_time_ms;
        }
    }

    let is_distance_record = current.length > best_length;
    let is_pace_record = current.length == best_length && current.avg_time_ms < best_pace;

    RecordComparison {
        is_new_record: is_distance_record || is_pace_record,
        previous_best_count: Some(best_length),
        previous_best_avg_pace: best_pace.is_finite().then_some(best_pace),
        ..Default::default()
    }
}

/// Lowest total time among complete runs of exactly `target` problems.
fn compare_timed(current: &SessionRecord, others: &[&SessionRecord], target: u32) -> RecordComparison {
    if current.length < target {
        return RecordComparison::default();
    }

    let best_total = others
        .iter()
        .filter(|s| s.length == target)
        .map(|s| s.total_time_ms())
        .min_by(|a, b| a.total_cmp(b));

    match best_total {
        None => RecordComparison {
            is_new_record: true,
            ..Default::default()
        },
        Some(best) => RecordComparison {
            is_new_record: current.total_time_ms() < best,
            previous_best_time_ms: Some(best),
            ..Default::default()
        },
    }
}
