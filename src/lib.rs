// src/lib.rs

pub mod clock;
pub mod config;
pub mod constants;
pub mod database;
pub mod drill;
pub mod error;
pub mod generator;
pub mod insights;
pub mod memory;
pub mod models;
pub mod pedagogy;
pub mod personal_best;
pub mod repository;
pub mod scoring;
pub mod sessions;
pub mod stats;
pub mod store;

use crate::clock::SystemClock;
use crate::config::AppConfig;
use crate::constants::RECENT_SESSIONS_LIMIT;
use crate::drill::DrillSession;
use crate::insights::{GlobalStats, TodayStats};
use crate::models::{AppState, AttemptLog, Problem, SessionConfig, SessionRecord, SessionSummary};
use crate::repository::SqliteStore;
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{error, info, warn};

/// Installs `env_logger`, honouring `RUST_LOG` and falling back to `default_filter`.
pub fn init_logging(default_filter: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .try_init();
}

/// Opens the on-disk store described by `config` and wires the real clock and RNG.
pub fn open_app(config: &AppConfig) -> Result<AppState, String> {
    info!("Starting Commute Math engine...");
    let db_path = config.db_path().map_err(|e| e.to_string())?;
    let store = SqliteStore::open(&db_path).map_err(|e| e.to_string())?;

    Ok(AppState::new(
        Arc::new(store),
        Arc::new(SystemClock),
        StdRng::from_os_rng(),
    ))
}

pub fn get_session_problems(state: &AppState, config: &SessionConfig) -> Result<Vec<Problem>, String> {
    let mut rng = state.rng.lock().map_err(|_| "rng lock poisoned".to_string())?;
    Ok(pedagogy::select_problems(
        state.store.as_ref(),
        state.clock.as_ref(),
        &mut *rng,
        config.problem_count as usize,
        config.mode,
        &config.forced_problem_ids,
    ))
}

pub fn start_session(state: &AppState, config: SessionConfig) -> Result<DrillSession, String> {
    let problems = get_session_problems(state, &config)?;
    Ok(DrillSession::new(config, problems, state.clock.now_ms()))
}

/// Tops up an endless session when it is close to running out.
pub fn replenish_session(state: &AppState, drill: &mut DrillSession) -> Result<usize, String> {
    let mut rng = state.rng.lock().map_err(|_| "rng lock poisoned".to_string())?;
    Ok(drill.replenish(&mut *rng))
}

/// Records an attempt without waiting for storage. Failures end up in the log.
pub fn submit_attempt(state: &AppState, log: AttemptLog) -> JoinHandle<()> {
    stats::dispatch_attempt(Arc::clone(&state.store), Arc::clone(&state.clock), log)
}

/// Saves the finished session (best effort) and compares it against earlier runs.
pub fn finish_session(state: &AppState, record: SessionRecord) -> Result<SessionSummary, String> {
    let (record, saved) = match sessions::save_session(state.store.as_ref(), &record) {
        Ok(stored) => (stored, true),
        Err(e) => {
            warn!("Session summary not persisted: {}", e);
            (record, false)
        }
    };

    let comparison = personal_best::check_personal_best(state.store.as_ref(), &record)
        .inspect_err(|e| error!("Failed to load session history: {}", e))
        .map_err(|e| e.to_string())?;

    Ok(SessionSummary {
        record,
        saved,
        comparison,
    })
}

/// Newest sessions first; `None` returns the default history window.
pub fn recent_sessions(state: &AppState, limit: Option<usize>) -> Result<Vec<SessionRecord>, String> {
    state
        .store
        .recent_sessions(limit.unwrap_or(RECENT_SESSIONS_LIMIT))
        .map_err(|e| e.to_string())
}

pub fn today_stats(state: &AppState) -> Result<TodayStats, String> {
    let sessions = state.store.scan_sessions().map_err(|e| e.to_string())?;
    Ok(insights::today_stats(&sessions, state.clock.now_ms(), &Local))
}

pub fn global_stats(state: &AppState) -> Result<GlobalStats, String> {
    let problems = state.store.scan_problems().map_err(|e| e.to_string())?;
    let sessions = state.store.scan_sessions().map_err(|e| e.to_string())?;
    Ok(insights::global_stats(&problems, &sessions))
}
