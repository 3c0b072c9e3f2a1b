// src/insights.rs

use crate::constants::*;
use crate::models::{ProblemRecord, SessionRecord};
use chrono::{NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub today_laps: usize,
    pub current_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakSpot {
    pub key: String,
    pub a: u32,
    pub b: u32,
    pub error_rate: f64,
    pub ema_time_ms: f64,
    pub weakness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_sessions: usize,
    pub total_solved: u64,
    pub global_accuracy: u32, // Percent, rounded
    pub global_avg_speed_ms: f64,
    pub weakest: Vec<WeakSpot>,
}

fn local_date<Tz: TimeZone>(ts: i64, tz: &Tz) -> Option<NaiveDate> {
    tz.timestamp_millis_opt(ts)
        .earliest()
        .map(|dt| dt.date_naive())
}

pub fn today_laps<Tz: TimeZone>(sessions: &[SessionRecord], now: i64, tz: &Tz) -> usize {
    let Some(today) = local_date(now, tz) else {
        return 0;
    };
    sessions
        .iter()
        .filter(|s| local_date(s.started_at, tz) == Some(today))
        .count()
}

/// Consecutive days with at least one session. A streak stays alive through
/// today if yesterday was played, so counting starts from yesterday then.
pub fn day_streak<Tz: TimeZone>(sessions: &[SessionRecord], now: i64, tz: &Tz) -> u32 {
    let played: HashSet<NaiveDate> = sessions
        .iter()
        .filter_map(|s| local_date(s.started_at, tz))
        .collect();

    let Some(today) = local_date(now, tz) else {
        return 0;
    };
    let mut day = if played.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if played.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while played.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

pub fn today_stats<Tz: TimeZone>(sessions: &[SessionRecord], now: i64, tz: &Tz) -> TodayStats {
    TodayStats {
        today_laps: today_laps(sessions, now, tz),
        current_streak: day_streak(sessions, now, tz),
    }
}

/// Display ranking for the stats screen. Separate from the review scorer:
/// mostly error rate, plus how far the average time sits above five seconds.
pub fn display_weakness(record: &ProblemRecord) -> (f64, f64) {
    let stats = &record.stats;
    let error_rate = if stats.seen > 0 {
        stats.wrong as f64 / stats.seen as f64
    } else {
        0.0
    };
    let speed_penalty =
        ((stats.ema_time_ms - WEAKEST_SPEED_FLOOR_MS).max(0.0) / WEAKEST_SPEED_SPAN_MS).min(1.0);
    (
        error_rate * WEAKEST_ERROR_WEIGHT + speed_penalty * WEAKEST_SPEED_WEIGHT,
        error_rate,
    )
}

pub fn global_stats(problems: &[ProblemRecord], sessions: &[SessionRecord]) -> GlobalStats {
    let total_sessions = sessions.len();
    let total_solved: u64 = sessions.iter().map(|s| s.length as u64).sum();
    let global_correct: u64 = sessions.iter().map(|s| s.correct_count as u64).sum();

    let (global_accuracy, global_avg_speed_ms) = if total_solved > 0 {
        let weighted_time: f64 = sessions.iter().map(|s| s.total_time_ms()).sum();
        (
            (global_correct as f64 / total_solved as f64 * 100.0).round() as u32,
            weighted_time / total_solved as f64,
        )
    } else {
        (0, 0.0)
    };

    let mut weakest: Vec<WeakSpot> = problems
        .iter()
        .filter(|p| p.stats.seen > 0)
        .map(|p| {
            let (weakness, error_rate) = display_weakness(p);
            WeakSpot {
                key: p.key.clone(),
                a: p.a,
                b: p.b,
                error_rate,
                ema_time_ms: p.stats.ema_time_ms,
                weakness,
            }
        })
        .filter(|w| w.weakness > WEAKEST_MIN_SCORE)
        .collect();
    weakest.sort_by(|a, b| b.weakness.total_cmp(&a.weakness));
    weakest.truncate(WEAKEST_LIST_LEN);

    GlobalStats {
        total_sessions,
        total_solved,
        global_accuracy,
        global_avg_speed_ms,
        weakest,
    }
}
