// Database schema — table creation and migrations.
//
// We use a simple version-based migration approach: a `schema_version` table
// tracks which migrations have run, and each migration is a function that
// executes SQL statements.
//
// All timestamps are RFC 3339 TEXT in UTC with a trailing Z, written from
// Rust. That keeps lexicographic comparison equivalent to chronological
// comparison, which the windowed queries rely on.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Monitored accounts
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE COLLATE NOCASE,
            display_name TEXT NOT NULL DEFAULT '',
            description TEXT,
            follower_count INTEGER NOT NULL DEFAULT 0,
            avatar_url TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- Ingested posts; external_id is the platform's post id and the
        -- deduplication key
        CREATE TABLE IF NOT EXISTS content_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT NOT NULL UNIQUE,
            account_id INTEGER NOT NULL REFERENCES accounts(id),
            text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            like_count INTEGER NOT NULL DEFAULT 0,
            retweet_count INTEGER NOT NULL DEFAULT 0,
            reply_count INTEGER NOT NULL DEFAULT 0,
            quote_count INTEGER NOT NULL DEFAULT 0,
            engagement_score REAL NOT NULL DEFAULT 0,
            normalized_score REAL NOT NULL DEFAULT 0,
            trending_score REAL NOT NULL DEFAULT 0,
            is_trending INTEGER NOT NULL DEFAULT 0,
            hashtags TEXT NOT NULL DEFAULT '[]',   -- JSON array of tokens
            mentions TEXT NOT NULL DEFAULT '[]',   -- JSON array of tokens
            urls TEXT NOT NULL DEFAULT '[]',       -- JSON array of URLs
            is_retweet INTEGER NOT NULL DEFAULT 0,
            is_reply INTEGER NOT NULL DEFAULT 0,
            is_quote INTEGER NOT NULL DEFAULT 0
        );

        -- Append-only metric snapshots, one per ingestion of an item
        CREATE TABLE IF NOT EXISTS analytics_snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_item_id INTEGER NOT NULL REFERENCES content_items(id),
            like_count INTEGER NOT NULL DEFAULT 0,
            retweet_count INTEGER NOT NULL DEFAULT 0,
            reply_count INTEGER NOT NULL DEFAULT 0,
            quote_count INTEGER NOT NULL DEFAULT 0,
            engagement_score REAL NOT NULL DEFAULT 0,
            hours_after_post INTEGER NOT NULL DEFAULT 0,
            recorded_at TEXT NOT NULL
        );

        -- One running aggregate per unique topic token
        CREATE TABLE IF NOT EXISTS trending_topics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            topic TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,                    -- HASHTAG / MENTION / KEYWORD
            mention_count INTEGER NOT NULL DEFAULT 0,
            engagement_sum REAL NOT NULL DEFAULT 0,
            trend_score REAL NOT NULL DEFAULT 0,
            velocity REAL NOT NULL DEFAULT 0,
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_trending INTEGER NOT NULL DEFAULT 0
        );

        -- Append-only ledger of collection attempts
        CREATE TABLE IF NOT EXISTS collection_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER REFERENCES accounts(id),  -- NULL = aggregate run
            items_collected INTEGER NOT NULL DEFAULT 0,
            api_calls INTEGER NOT NULL DEFAULT 0,
            errors_count INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'PENDING',
            error_message TEXT,
            started_at TEXT NOT NULL,
            completed_at TEXT,
            duration_seconds INTEGER NOT NULL DEFAULT 0
        );

        -- Lookup of an account's items, newest platform timestamp first
        CREATE INDEX IF NOT EXISTS idx_items_account_created
            ON content_items(account_id, created_at DESC);

        -- Windowed scans over recent items
        CREATE INDEX IF NOT EXISTS idx_items_created
            ON content_items(created_at);

        -- Snapshot series per item, newest first
        CREATE INDEX IF NOT EXISTS idx_snapshots_item_recorded
            ON analytics_snapshots(content_item_id, recorded_at DESC);

        -- Windowed scans over recently-seen topics
        CREATE INDEX IF NOT EXISTS idx_topics_last_seen
            ON trending_topics(last_seen);

        -- Recent runs for the status display
        CREATE INDEX IF NOT EXISTS idx_runs_started
            ON collection_runs(started_at DESC);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
/// The migration function receives the connection and should execute its SQL.
#[allow(dead_code)]
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
    }

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        // Running create_tables twice should not error
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // schema_version, accounts, content_items, analytics_snapshots,
        // trending_topics, collection_runs = 6 tables (sqlite_sequence is
        // filtered out by the sqlite_% exclusion)
        let count = table_count(&conn).unwrap();
        assert_eq!(count, 6i64);
    }

    #[test]
    fn test_external_id_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        conn.execute(
            "INSERT INTO accounts (username, created_at, updated_at)
             VALUES ('acct', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO content_items (external_id, account_id, text, created_at)
             VALUES ('tw1', 1, 'hello', '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO content_items (external_id, account_id, text, created_at)
             VALUES ('tw1', 1, 'again', '2025-01-01T00:00:00Z')",
            [],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn test_username_unique_case_insensitive() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        conn.execute(
            "INSERT INTO accounts (username, created_at, updated_at)
             VALUES ('Builder', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO accounts (username, created_at, updated_at)
             VALUES ('builder', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
            [],
        );
        assert!(dup.is_err());
    }
}
