// src/models.rs

use crate::clock::Clock;
use crate::constants::{SPRINT_LENGTH, STANDARD_LENGTH};
use crate::store::Store;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// --- App State ---

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub rng: Mutex<StdRng>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        AppState {
            store,
            clock,
            rng: Mutex::new(rng),
        }
    }
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Practice,
    Review,
    Mixed,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Practice => "practice",
            SessionMode::Review => "review",
            SessionMode::Mixed => "mixed",
        }
    }
}

impl FromStr for SessionMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "practice" => Ok(SessionMode::Practice),
            "review" => Ok(SessionMode::Review),
            "mixed" => Ok(SessionMode::Mixed),
            other => Err(format!("unknown session mode '{other}'")),
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Sprint,
    Standard,
    Endurance,
}

impl SessionType {
    /// Classifies a session purely by how many problems were completed.
    /// A standard run abandoned after exactly 5 problems counts as a sprint.
    pub fn from_length(length: u32) -> Self {
        match length {
            SPRINT_LENGTH => SessionType::Sprint,
            STANDARD_LENGTH => SessionType::Standard,
            _ => SessionType::Endurance,
        }
    }

    /// Length a run must reach to compete on total time. Endurance has none.
    pub fn target_length(&self) -> Option<u32> {
        match self {
            SessionType::Sprint => Some(SPRINT_LENGTH),
            SessionType::Standard => Some(STANDARD_LENGTH),
            SessionType::Endurance => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Sprint => "sprint",
            SessionType::Standard => "standard",
            SessionType::Endurance => "endurance",
        }
    }
}

impl FromStr for SessionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sprint" => Ok(SessionType::Sprint),
            "standard" => Ok(SessionType::Standard),
            "endurance" => Ok(SessionType::Endurance),
            other => Err(format!("unknown session type '{other}'")),
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Data Models ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: String,
    pub factor_a: u32,
    pub factor_b: u32,
    pub solution: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResult {
    #[serde(flatten)]
    pub problem: Problem,
    pub user_answer: Option<u32>, // None if skipped
    pub is_correct: bool,
    pub time_taken_ms: u64,
}

/// One answered or skipped problem, as reported by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptLog {
    pub key: String,
    pub a: u32,
    pub b: u32,
    pub is_correct: bool,
    pub time_ms: u64,
    pub user_answer: Option<u32>,
}

impl AttemptLog {
    pub fn from_result(result: &ProblemResult) -> Self {
        AttemptLog {
            key: result.problem.id.clone(),
            a: result.problem.factor_a,
            b: result.problem.factor_b,
            is_correct: result.is_correct,
            time_ms: result.time_taken_ms,
            user_answer: result.user_answer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAttempt {
    pub ts: i64,
    pub correct: bool,
    pub time_ms: u64,
    pub user_answer: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStats {
    pub seen: u32,
    pub wrong: u32,
    pub streak_correct: u32,
    pub last_seen_at: i64,
    pub last_wrong_at: Option<i64>,
    pub ema_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    pub key: String,
    pub a: u32,
    pub b: u32,
    pub recent: Vec<RecentAttempt>, // Newest first
    pub stats: ProblemStats,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub started_at: i64,
    pub ended_at: i64,
    pub length: u32,
    pub mode: SessionMode,
    pub session_type: SessionType,
    pub correct_count: u32,
    pub avg_time_ms: f64,
}

impl SessionRecord {
    pub fn total_time_ms(&self) -> f64 {
        self.avg_time_ms * self.length as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub problem_count: u32, // 0 = endless
    pub mode: SessionMode,
    #[serde(default)]
    pub forced_problem_ids: Vec<String>,
}

impl SessionConfig {
    pub fn new(problem_count: u32, mode: SessionMode) -> Self {
        SessionConfig {
            problem_count,
            mode,
            forced_problem_ids: Vec::new(),
        }
    }

    /// Immediate review of the items missed in a finished session. Nothing missed,
    /// nothing to review: an empty list would otherwise read as an endless session.
    pub fn review_missed(ids: Vec<String>) -> Option<Self> {
        if ids.is_empty() {
            return None;
        }
        Some(SessionConfig {
            problem_count: ids.len() as u32,
            mode: SessionMode::Review,
            forced_problem_ids: ids,
        })
    }

    pub fn is_endless(&self) -> bool {
        self.problem_count == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordComparison {
    pub is_new_record: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_best_time_ms: Option<f64>, // Sprint / Standard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_best_count: Option<u32>, // Endurance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_best_avg_pace: Option<f64>, // Endurance
}

/// What the results screen receives once a session ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub record: SessionRecord,
    pub saved: bool,
    pub comparison: RecordComparison,
}
