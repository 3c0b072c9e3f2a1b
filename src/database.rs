// src/database.rs

use log::debug;
use rusqlite::{Connection, Result};

pub fn init_db(conn: &Connection) -> Result<()> {
    debug!("init_db: Checking database schema...");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS problems (
            key TEXT PRIMARY KEY,
            a INTEGER NOT NULL,
            b INTEGER NOT NULL,
            seen INTEGER NOT NULL DEFAULT 0,
            wrong INTEGER NOT NULL DEFAULT 0,
            streak_correct INTEGER NOT NULL DEFAULT 0,
            last_seen_at INTEGER NOT NULL,
            last_wrong_at INTEGER,
            ema_time_ms REAL NOT NULL DEFAULT 0.0,
            recent TEXT NOT NULL DEFAULT '[]',
            updated_at INTEGER NOT NULL,
            CHECK (wrong <= seen),
            CHECK (streak_correct <= seen)
        );
        CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at INTEGER NOT NULL,
            ended_at INTEGER NOT NULL,
            length INTEGER NOT NULL CHECK (length > 0),
            mode TEXT NOT NULL CHECK (mode IN ('practice','review','mixed')),
            session_type TEXT NOT NULL CHECK (session_type IN ('sprint','standard','endurance')),
            correct_count INTEGER NOT NULL,
            avg_time_ms REAL NOT NULL,
            CHECK (correct_count <= length)
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_type ON sessions (session_type);
        CREATE INDEX IF NOT EXISTS idx_sessions_started ON sessions (started_at);
        ",
    )?;

    Ok(())
}
