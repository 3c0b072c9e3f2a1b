// src/scoring.rs

use crate::constants::*;
use crate::models::ProblemRecord;

/// Heuristic weakness of a problem. Only the ordering matters; the value can go
/// negative once a long correct streak outweighs everything else.
pub fn weakness_score(record: &ProblemRecord, now: i64) -> f64 {
    let stats = &record.stats;
    if stats.seen == 0 {
        return 0.0;
    }

    let error_score = stats.wrong as f64 / stats.seen as f64 * WEIGHT_ERROR_RATE;

    let days_since_wrong = match stats.last_wrong_at {
        Some(ts) => (now - ts) as f64 / DAY_MS,
        None => NEVER_WRONG_DAYS,
    };
    let recency_score = if days_since_wrong < RECENCY_SHORT_DAYS {
        WEIGHT_RECENCY_SHORT
    } else if days_since_wrong < RECENCY_MEDIUM_DAYS {
        WEIGHT_RECENCY_MEDIUM
    } else {
        0.0
    };

    let speed_score = if stats.ema_time_ms > SLOW_EMA_MS {
        WEIGHT_SLOW_SPEED
    } else {
        0.0
    };

    let streak_penalty =
        (stats.streak_correct as f64 * STREAK_PENALTY_PER_CORRECT).min(STREAK_PENALTY_MAX);

    error_score + recency_score + speed_score - streak_penalty
}

pub fn is_review_candidate(record: &ProblemRecord, score: f64) -> bool {
    record.stats.seen > 0 && score > REVIEW_SCORE_THRESHOLD
}

/// Review candidates paired with their score, weakest first.
pub fn rank_candidates(records: Vec<ProblemRecord>, now: i64) -> Vec<(ProblemRecord, f64)> {
    let mut ranked: Vec<(ProblemRecord, f64)> = records
        .into_iter()
        .map(|r| {
            let score = weakness_score(&r, now);
            (r, score)
        })
        .filter(|(r, score)| is_review_candidate(r, *score))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
