//! SQL schema for the ProReporter SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id   TEXT PRIMARY KEY,
    username  TEXT NOT NULL UNIQUE
);

-- The dataset is written once; only insights_json is ever updated.
CREATE TABLE IF NOT EXISTS reports (
    report_id     TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    title         TEXT NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    data_json     TEXT NOT NULL,   -- JSON-encoded Dataset
    insights_json TEXT,            -- JSON-encoded InsightState or NULL
    created_at    TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS shared_reports (
    share_id    TEXT PRIMARY KEY,
    report_id   TEXT NOT NULL REFERENCES reports(report_id) ON DELETE CASCADE,
    shared_by   TEXT NOT NULL,
    shared_with TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (report_id, shared_with)
);

CREATE INDEX IF NOT EXISTS reports_owner_idx        ON reports(user_id);
CREATE INDEX IF NOT EXISTS shared_reports_with_idx  ON shared_reports(shared_with);

PRAGMA user_version = 1;
";
