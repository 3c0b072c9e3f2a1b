// src/constants.rs

// --- Time Constants ---
pub const DAY_MS: f64 = 86_400_000.0;

// --- Problem Generation ---
pub const FACTOR_MIN: u32 = 11;
pub const FACTOR_MAX: u32 = 99;

// --- Statistics ---
pub const EMA_ALPHA: f64 = 0.25; // Weight of the newest latency sample
pub const RECENT_ATTEMPTS_MAX: usize = 5;

// --- Weakness Scoring ---
pub const WEIGHT_ERROR_RATE: f64 = 50.0;
pub const WEIGHT_RECENCY_SHORT: f64 = 20.0; // Wrong within RECENCY_SHORT_DAYS
pub const WEIGHT_RECENCY_MEDIUM: f64 = 10.0; // Wrong within RECENCY_MEDIUM_DAYS
pub const WEIGHT_SLOW_SPEED: f64 = 15.0;
pub const STREAK_PENALTY_PER_CORRECT: f64 = 5.0;
pub const STREAK_PENALTY_MAX: f64 = 30.0;

pub const RECENCY_SHORT_DAYS: f64 = 2.0;
pub const RECENCY_MEDIUM_DAYS: f64 = 7.0;
pub const NEVER_WRONG_DAYS: f64 = 100.0;
pub const SLOW_EMA_MS: f64 = 8000.0;
pub const REVIEW_SCORE_THRESHOLD: f64 = 10.0;

// --- Session Selection ---
pub const ENDLESS_SEED_BATCH: usize = 20; // Problems generated up front when count == 0
pub const ENDLESS_REPLENISH_BATCH: usize = 10;
pub const ENDLESS_REPLENISH_MARGIN: usize = 5;
pub const MIXED_REVIEW_RATIO: f64 = 0.3;
pub const REVIEW_POOL_MIN: usize = 10;

// --- Session Types ---
pub const SPRINT_LENGTH: u32 = 5;
pub const STANDARD_LENGTH: u32 = 10;

// --- Debrief / Insights ---
pub const SLOW_ANSWER_MS: u64 = 10_000; // Flagged as a weak spot in the debrief
pub const RECENT_SESSIONS_LIMIT: usize = 50;
pub const WEAKEST_LIST_LEN: usize = 5;
pub const WEAKEST_ERROR_WEIGHT: f64 = 0.7;
pub const WEAKEST_SPEED_WEIGHT: f64 = 0.3;
pub const WEAKEST_SPEED_FLOOR_MS: f64 = 5000.0;
pub const WEAKEST_SPEED_SPAN_MS: f64 = 5000.0;
pub const WEAKEST_MIN_SCORE: f64 = 0.1;
