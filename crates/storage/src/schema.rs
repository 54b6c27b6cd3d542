use rusqlite::Connection;

use crate::error::StorageError;

pub fn init_schema(conn: &Connection, table_prefix: &str) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -32000;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(&SCHEMA_SQL.replace("{prefix}", table_prefix))?;
    Ok(())
}

/// `insert_at` records physical arrival with millisecond precision; in the
/// history table `seq` breaks ties between rows landing in the same
/// millisecond.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS {prefix}schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO {prefix}schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS {prefix}blocks (
    id TEXT PRIMARY KEY,
    insert_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    parent_id TEXT NOT NULL DEFAULT '',
    root_id TEXT NOT NULL,
    board_id TEXT NOT NULL,
    created_by TEXT NOT NULL DEFAULT '',
    modified_by TEXT,
    \"schema\" INTEGER NOT NULL DEFAULT 1,
    type TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    fields TEXT,
    create_at INTEGER NOT NULL DEFAULT 0,
    update_at INTEGER NOT NULL DEFAULT 0,
    delete_at INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_{prefix}blocks_board_parent ON {prefix}blocks (board_id, parent_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}blocks_board_type ON {prefix}blocks (board_id, type);
CREATE INDEX IF NOT EXISTS idx_{prefix}blocks_root ON {prefix}blocks (root_id);

CREATE TABLE IF NOT EXISTS {prefix}blocks_history (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL,
    insert_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    parent_id TEXT NOT NULL DEFAULT '',
    root_id TEXT NOT NULL,
    board_id TEXT NOT NULL,
    created_by TEXT NOT NULL DEFAULT '',
    modified_by TEXT,
    \"schema\" INTEGER NOT NULL DEFAULT 1,
    type TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    fields TEXT,
    create_at INTEGER NOT NULL DEFAULT 0,
    update_at INTEGER NOT NULL DEFAULT 0,
    delete_at INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_{prefix}blocks_history_id
    ON {prefix}blocks_history (id, insert_at, seq);

CREATE TABLE IF NOT EXISTS {prefix}boards (
    id TEXT PRIMARY KEY,
    team_id TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'O',
    title TEXT NOT NULL DEFAULT '',
    is_template INTEGER NOT NULL DEFAULT 0,
    created_by TEXT NOT NULL DEFAULT '',
    create_at INTEGER NOT NULL DEFAULT 0,
    update_at INTEGER NOT NULL DEFAULT 0,
    delete_at INTEGER NOT NULL DEFAULT 0
);
";
