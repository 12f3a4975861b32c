// Database queries — CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.
//
// Timestamps cross this boundary as chrono DateTime<Utc> and are stored as
// RFC 3339 TEXT with a trailing Z, so string comparison in SQL matches
// chronological order.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};

use super::models::{
    Account, AnalyticsSnapshot, CollectionRun, ContentItem, RunStatus, TopicKind, TrendingTopic,
};

/// Format a timestamp the way every column in this database stores them.
pub fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_ts(raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

// --- Accounts ---

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        description: row.get(3)?,
        follower_count: row.get(4)?,
        avatar_url: row.get(5)?,
        is_active: row.get::<_, i64>(6)? != 0,
        created_at: parse_ts(row.get(7)?)?,
        updated_at: parse_ts(row.get(8)?)?,
    })
}

const ACCOUNT_COLUMNS: &str = "id, username, display_name, description, follower_count, \
                               avatar_url, is_active, created_at, updated_at";

/// Look up an account by its unique username (case-insensitive).
pub fn get_account_by_username(conn: &Connection, username: &str) -> Result<Option<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?1"
    ))?;
    let result = stmt.query_row(params![username], account_from_row).optional()?;
    Ok(result)
}

/// Look up an account by id.
pub fn get_account(conn: &Connection, id: i64) -> Result<Option<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"
    ))?;
    let result = stmt.query_row(params![id], account_from_row).optional()?;
    Ok(result)
}

/// Register a new account. Returns the new row id.
pub fn insert_account(conn: &Connection, account: &Account) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts
            (username, display_name, description, follower_count, avatar_url,
             is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            account.username,
            account.display_name,
            account.description,
            account.follower_count,
            account.avatar_url,
            account.is_active as i64,
            ts(&account.created_at),
            ts(&account.updated_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Opportunistic profile refresh after a successful collection.
pub fn update_account_profile(
    conn: &Connection,
    id: i64,
    display_name: &str,
    description: Option<&str>,
    follower_count: i64,
    avatar_url: Option<&str>,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "UPDATE accounts
         SET display_name = ?2, description = ?3, follower_count = ?4,
             avatar_url = ?5, updated_at = ?6
         WHERE id = ?1",
        params![id, display_name, description, follower_count, avatar_url, ts(&now)],
    )?;
    Ok(())
}

/// All accounts eligible for batch collection, in registration order.
pub fn list_active_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE is_active = 1 ORDER BY id"
    ))?;
    let rows = stmt.query_map([], account_from_row)?;
    collect_rows(rows)
}

// --- Content items ---

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ContentItem> {
    let hashtags: String = row.get(13)?;
    let mentions: String = row.get(14)?;
    let urls: String = row.get(15)?;
    Ok(ContentItem {
        id: row.get(0)?,
        external_id: row.get(1)?,
        account_id: row.get(2)?,
        text: row.get(3)?,
        created_at: parse_ts(row.get(4)?)?,
        like_count: row.get(5)?,
        retweet_count: row.get(6)?,
        reply_count: row.get(7)?,
        quote_count: row.get(8)?,
        engagement_score: row.get(9)?,
        normalized_score: row.get(10)?,
        trending_score: row.get(11)?,
        is_trending: row.get::<_, i64>(12)? != 0,
        hashtags: serde_json::from_str(&hashtags).unwrap_or_default(),
        mentions: serde_json::from_str(&mentions).unwrap_or_default(),
        urls: serde_json::from_str(&urls).unwrap_or_default(),
        is_retweet: row.get::<_, i64>(16)? != 0,
        is_reply: row.get::<_, i64>(17)? != 0,
        is_quote: row.get::<_, i64>(18)? != 0,
    })
}

const ITEM_COLUMNS: &str = "id, external_id, account_id, text, created_at, like_count, \
                            retweet_count, reply_count, quote_count, engagement_score, \
                            normalized_score, trending_score, is_trending, \
                            hashtags, mentions, urls, is_retweet, is_reply, is_quote";

/// Same columns qualified for joins against `accounts a`.
const ITEM_COLUMNS_JOINED: &str =
    "i.id, i.external_id, i.account_id, i.text, i.created_at, i.like_count, \
     i.retweet_count, i.reply_count, i.quote_count, i.engagement_score, \
     i.normalized_score, i.trending_score, i.is_trending, \
     i.hashtags, i.mentions, i.urls, i.is_retweet, i.is_reply, i.is_quote";

/// Find a content item by the platform's post id (the deduplication key).
pub fn get_item_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<ContentItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM content_items WHERE external_id = ?1"
    ))?;
    let result = stmt.query_row(params![external_id], item_from_row).optional()?;
    Ok(result)
}

/// Persist a newly-ingested item (the `id` field is ignored). Returns the row id.
pub fn insert_content_item(conn: &Connection, item: &ContentItem) -> Result<i64> {
    conn.execute(
        "INSERT INTO content_items
            (external_id, account_id, text, created_at,
             like_count, retweet_count, reply_count, quote_count,
             engagement_score, normalized_score, trending_score, is_trending,
             hashtags, mentions, urls, is_retweet, is_reply, is_quote)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            item.external_id,
            item.account_id,
            item.text,
            ts(&item.created_at),
            item.like_count,
            item.retweet_count,
            item.reply_count,
            item.quote_count,
            item.engagement_score,
            item.normalized_score,
            item.trending_score,
            item.is_trending as i64,
            serde_json::to_string(&item.hashtags)?,
            serde_json::to_string(&item.mentions)?,
            serde_json::to_string(&item.urls)?,
            item.is_retweet as i64,
            item.is_reply as i64,
            item.is_quote as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Metric refresh on the update path of ingestion. Topics are deliberately
/// untouched — they were counted when the item was created.
#[allow(clippy::too_many_arguments)]
pub fn update_item_metrics(
    conn: &Connection,
    id: i64,
    likes: i64,
    retweets: i64,
    replies: i64,
    quotes: i64,
    engagement_score: f64,
    normalized_score: f64,
) -> Result<()> {
    conn.execute(
        "UPDATE content_items
         SET like_count = ?2, retweet_count = ?3, reply_count = ?4, quote_count = ?5,
             engagement_score = ?6, normalized_score = ?7
         WHERE id = ?1",
        params![id, likes, retweets, replies, quotes, engagement_score, normalized_score],
    )?;
    Ok(())
}

/// Write the recomputed trending score for an item.
pub fn update_item_trending(
    conn: &Connection,
    id: i64,
    trending_score: f64,
    is_trending: bool,
) -> Result<()> {
    conn.execute(
        "UPDATE content_items SET trending_score = ?2, is_trending = ?3 WHERE id = ?1",
        params![id, trending_score, is_trending as i64],
    )?;
    Ok(())
}

/// The platform post id of the account's newest stored item, for
/// incremental fetches.
pub fn latest_external_id(conn: &Connection, account_id: i64) -> Result<Option<String>> {
    let mut stmt = conn.prepare(
        "SELECT external_id FROM content_items
         WHERE account_id = ?1
         ORDER BY created_at DESC
         LIMIT 1",
    )?;
    let result = stmt.query_row(params![account_id], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Items created at or after the cutoff, each with its account's follower
/// count (needed for trending-score normalization).
pub fn items_created_since(
    conn: &Connection,
    cutoff: DateTime<Utc>,
) -> Result<Vec<(ContentItem, i64)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS_JOINED}, a.follower_count
         FROM content_items i JOIN accounts a ON a.id = i.account_id
         WHERE i.created_at >= ?1"
    ))?;
    let rows = stmt.query_map(params![ts(&cutoff)], |row| {
        Ok((item_from_row(row)?, row.get::<_, i64>(19)?))
    })?;
    collect_rows(rows)
}

/// One account's items created at or after the cutoff, best engagement first.
pub fn items_for_account_since(
    conn: &Connection,
    account_id: i64,
    cutoff: DateTime<Utc>,
) -> Result<Vec<ContentItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM content_items
         WHERE account_id = ?1 AND created_at >= ?2
         ORDER BY engagement_score DESC"
    ))?;
    let rows = stmt.query_map(params![account_id, ts(&cutoff)], item_from_row)?;
    collect_rows(rows)
}

/// Total stored items (status display).
pub fn count_items(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM content_items", [], |row| row.get(0))?)
}

/// How many items created at or after the cutoff carry the topic in their
/// hashtag or mention list.
///
/// Token arrays are stored as JSON, so matching the JSON-quoted token
/// (`"ai"`) is exact for the \w+ tokens the extractor produces. instr()
/// rather than LIKE: topic rows are case-sensitive distinct, and SQLite's
/// LIKE folds ASCII case.
pub fn count_topic_mentions_since(
    conn: &Connection,
    topic: &str,
    cutoff: DateTime<Utc>,
) -> Result<i64> {
    let quoted = serde_json::to_string(topic)?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM content_items
         WHERE created_at >= ?1 AND (instr(hashtags, ?2) > 0 OR instr(mentions, ?2) > 0)",
        params![ts(&cutoff), quoted],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Trending items created at or after the cutoff, ranked by trending score,
/// with the owning account's username.
pub fn trending_items_since(
    conn: &Connection,
    cutoff: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<(ContentItem, String)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS_JOINED}, a.username
         FROM content_items i JOIN accounts a ON a.id = i.account_id
         WHERE i.is_trending = 1 AND i.created_at >= ?1
         ORDER BY i.trending_score DESC
         LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![ts(&cutoff), limit], |row| {
        Ok((item_from_row(row)?, row.get::<_, String>(19)?))
    })?;
    collect_rows(rows)
}

/// Count of trending items created at or after the cutoff.
pub fn count_trending_since(conn: &Connection, cutoff: DateTime<Utc>) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM content_items WHERE is_trending = 1 AND created_at >= ?1",
        params![ts(&cutoff)],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Mean engagement score over items created at or after the cutoff.
pub fn average_engagement_since(conn: &Connection, cutoff: DateTime<Utc>) -> Result<f64> {
    let avg: f64 = conn.query_row(
        "SELECT COALESCE(AVG(engagement_score), 0) FROM content_items WHERE created_at >= ?1",
        params![ts(&cutoff)],
        |row| row.get(0),
    )?;
    Ok(avg)
}

/// Top accounts by average engagement over the window.
/// Ties break on account id ascending so the ranking is deterministic.
pub fn top_accounts_by_engagement(
    conn: &Connection,
    cutoff: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<(String, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT a.username, AVG(i.engagement_score) AS avg_engagement
         FROM content_items i JOIN accounts a ON a.id = i.account_id
         WHERE i.created_at >= ?1
         GROUP BY i.account_id
         ORDER BY avg_engagement DESC, i.account_id ASC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![ts(&cutoff), limit], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;
    collect_rows(rows)
}

// --- Analytics snapshots ---

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<AnalyticsSnapshot> {
    Ok(AnalyticsSnapshot {
        id: row.get(0)?,
        content_item_id: row.get(1)?,
        like_count: row.get(2)?,
        retweet_count: row.get(3)?,
        reply_count: row.get(4)?,
        quote_count: row.get(5)?,
        engagement_score: row.get(6)?,
        hours_after_post: row.get(7)?,
        recorded_at: parse_ts(row.get(8)?)?,
    })
}

/// Append a point-in-time metrics snapshot. Snapshots are never updated.
pub fn insert_snapshot(conn: &Connection, snapshot: &AnalyticsSnapshot) -> Result<i64> {
    conn.execute(
        "INSERT INTO analytics_snapshots
            (content_item_id, like_count, retweet_count, reply_count, quote_count,
             engagement_score, hours_after_post, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            snapshot.content_item_id,
            snapshot.like_count,
            snapshot.retweet_count,
            snapshot.reply_count,
            snapshot.quote_count,
            snapshot.engagement_score,
            snapshot.hours_after_post,
            ts(&snapshot.recorded_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The newest N snapshots for an item, newest first (velocity input).
pub fn recent_snapshots(
    conn: &Connection,
    content_item_id: i64,
    limit: u32,
) -> Result<Vec<AnalyticsSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, content_item_id, like_count, retweet_count, reply_count, quote_count,
                engagement_score, hours_after_post, recorded_at
         FROM analytics_snapshots
         WHERE content_item_id = ?1
         ORDER BY recorded_at DESC, id DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![content_item_id, limit], snapshot_from_row)?;
    collect_rows(rows)
}

/// How many snapshots exist for an item.
pub fn count_snapshots(conn: &Connection, content_item_id: i64) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM analytics_snapshots WHERE content_item_id = ?1",
        params![content_item_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// --- Trending topics ---

fn topic_from_row(row: &Row<'_>) -> rusqlite::Result<TrendingTopic> {
    let kind: String = row.get(2)?;
    Ok(TrendingTopic {
        id: row.get(0)?,
        topic: row.get(1)?,
        kind: TopicKind::from_str(&kind),
        mention_count: row.get(3)?,
        engagement_sum: row.get(4)?,
        trend_score: row.get(5)?,
        velocity: row.get(6)?,
        first_seen: parse_ts(row.get(7)?)?,
        last_seen: parse_ts(row.get(8)?)?,
        is_active: row.get::<_, i64>(9)? != 0,
        is_trending: row.get::<_, i64>(10)? != 0,
    })
}

const TOPIC_COLUMNS: &str = "id, topic, kind, mention_count, engagement_sum, trend_score, \
                             velocity, first_seen, last_seen, is_active, is_trending";

/// Record one mention of a topic: increment the counters, refresh
/// `last_seen`, and reactivate.
///
/// A single INSERT ... ON CONFLICT statement so concurrent ingestions of
/// the same topic cannot lose increments to a read-modify-write race.
/// First sight creates the row with `trend_score` seeded from the item's
/// engagement and zero velocity.
pub fn upsert_topic_mention(
    conn: &Connection,
    topic: &str,
    kind: TopicKind,
    engagement_delta: f64,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO trending_topics
            (topic, kind, mention_count, engagement_sum, trend_score, velocity,
             first_seen, last_seen, is_active, is_trending)
         VALUES (?1, ?2, 1, ?3, ?3, 0, ?4, ?4, 1, 0)
         ON CONFLICT(topic) DO UPDATE SET
            mention_count = mention_count + 1,
            engagement_sum = engagement_sum + ?3,
            last_seen = ?4,
            is_active = 1",
        params![topic, kind.as_str(), engagement_delta, ts(&now)],
    )?;
    Ok(())
}

/// Look up a topic's aggregate row by its token.
pub fn get_topic(conn: &Connection, topic: &str) -> Result<Option<TrendingTopic>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TOPIC_COLUMNS} FROM trending_topics WHERE topic = ?1"
    ))?;
    let result = stmt.query_row(params![topic], topic_from_row).optional()?;
    Ok(result)
}

/// Active topics last seen at or after the cutoff (the recalculation set).
pub fn active_topics_seen_since(
    conn: &Connection,
    cutoff: DateTime<Utc>,
) -> Result<Vec<TrendingTopic>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TOPIC_COLUMNS} FROM trending_topics
         WHERE is_active = 1 AND last_seen >= ?1"
    ))?;
    let rows = stmt.query_map(params![ts(&cutoff)], topic_from_row)?;
    collect_rows(rows)
}

/// Write a topic's recomputed velocity and trend score.
pub fn update_topic_trend(
    conn: &Connection,
    id: i64,
    velocity: f64,
    trend_score: f64,
    is_trending: bool,
) -> Result<()> {
    conn.execute(
        "UPDATE trending_topics
         SET velocity = ?2, trend_score = ?3, is_trending = ?4
         WHERE id = ?1",
        params![id, velocity, trend_score, is_trending as i64],
    )?;
    Ok(())
}

/// Currently-trending topics ranked by trend score.
pub fn trending_topics(conn: &Connection, limit: u32) -> Result<Vec<TrendingTopic>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TOPIC_COLUMNS} FROM trending_topics
         WHERE is_trending = 1 AND is_active = 1
         ORDER BY trend_score DESC
         LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], topic_from_row)?;
    collect_rows(rows)
}

/// Active topics first seen at or after the cutoff with velocity above the
/// bar, fastest first — "emerging" in the insights summary.
pub fn emerging_topics(
    conn: &Connection,
    first_seen_cutoff: DateTime<Utc>,
    min_velocity: f64,
    limit: u32,
) -> Result<Vec<TrendingTopic>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TOPIC_COLUMNS} FROM trending_topics
         WHERE is_active = 1 AND velocity > ?2 AND first_seen >= ?1
         ORDER BY velocity DESC
         LIMIT ?3"
    ))?;
    let rows = stmt.query_map(params![ts(&first_seen_cutoff), min_velocity, limit], topic_from_row)?;
    collect_rows(rows)
}

/// Total tracked topics (status display).
pub fn count_topics(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM trending_topics", [], |row| row.get(0))?)
}

// --- Collection runs ---

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<CollectionRun> {
    let status: String = row.get(5)?;
    let completed_at: Option<String> = row.get(8)?;
    Ok(CollectionRun {
        id: row.get(0)?,
        account_id: row.get(1)?,
        items_collected: row.get(2)?,
        api_calls: row.get(3)?,
        errors_count: row.get(4)?,
        status: RunStatus::from_str(&status),
        error_message: row.get(6)?,
        started_at: parse_ts(row.get(7)?)?,
        completed_at: completed_at.map(parse_ts).transpose()?,
        duration_seconds: row.get(9)?,
    })
}

/// Append one run-outcome record to the ledger. Never updated afterwards.
pub fn insert_collection_run(conn: &Connection, run: &CollectionRun) -> Result<i64> {
    conn.execute(
        "INSERT INTO collection_runs
            (account_id, items_collected, api_calls, errors_count, status,
             error_message, started_at, completed_at, duration_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            run.account_id,
            run.items_collected,
            run.api_calls,
            run.errors_count,
            run.status.as_str(),
            run.error_message,
            ts(&run.started_at),
            run.completed_at.as_ref().map(ts),
            run.duration_seconds,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent runs for the status display.
pub fn recent_collection_runs(conn: &Connection, limit: u32) -> Result<Vec<CollectionRun>> {
    let mut stmt = conn.prepare(
        "SELECT id, account_id, items_collected, api_calls, errors_count, status,
                error_message, started_at, completed_at, duration_seconds
         FROM collection_runs
         ORDER BY started_at DESC, id DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], run_from_row)?;
    collect_rows(rows)
}

fn collect_rows<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// rusqlite's optional() helper — converts "no rows" into None
use rusqlite::OptionalExtension;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use chrono::TimeZone;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn test_account(username: &str) -> Account {
        Account {
            id: 0,
            username: username.to_string(),
            display_name: format!("{username} display"),
            description: None,
            follower_count: 1000,
            avatar_url: None,
            is_active: true,
            created_at: t0(),
            updated_at: t0(),
        }
    }

    fn test_item(external_id: &str, account_id: i64, engagement: f64) -> ContentItem {
        ContentItem {
            id: 0,
            external_id: external_id.to_string(),
            account_id,
            text: "test post #ai".to_string(),
            created_at: t0(),
            like_count: 10,
            retweet_count: 5,
            reply_count: 2,
            quote_count: 1,
            engagement_score: engagement,
            normalized_score: engagement / 10.0,
            trending_score: 0.0,
            is_trending: false,
            hashtags: vec!["ai".to_string()],
            mentions: vec![],
            urls: vec![],
            is_retweet: false,
            is_reply: false,
            is_quote: false,
        }
    }

    #[test]
    fn test_account_roundtrip() {
        let conn = test_db();
        assert!(get_account_by_username(&conn, "builder").unwrap().is_none());

        let id = insert_account(&conn, &test_account("builder")).unwrap();
        assert!(id > 0);

        let loaded = get_account_by_username(&conn, "builder").unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.follower_count, 1000);
        assert!(loaded.is_active);

        // Case-insensitive lookup
        assert!(get_account_by_username(&conn, "BUILDER").unwrap().is_some());
    }

    #[test]
    fn test_update_account_profile() {
        let conn = test_db();
        let id = insert_account(&conn, &test_account("builder")).unwrap();

        let later = t0() + chrono::Duration::hours(1);
        update_account_profile(&conn, id, "New Name", Some("bio"), 2500, None, later).unwrap();

        let loaded = get_account(&conn, id).unwrap().unwrap();
        assert_eq!(loaded.display_name, "New Name");
        assert_eq!(loaded.follower_count, 2500);
        assert_eq!(loaded.updated_at, later);
    }

    #[test]
    fn test_item_roundtrip_and_unique_external_id() {
        let conn = test_db();
        let account_id = insert_account(&conn, &test_account("builder")).unwrap();

        let item_id = insert_content_item(&conn, &test_item("tw1", account_id, 33.0)).unwrap();
        let loaded = get_item_by_external_id(&conn, "tw1").unwrap().unwrap();
        assert_eq!(loaded.id, item_id);
        assert_eq!(loaded.hashtags, vec!["ai"]);
        assert_eq!(loaded.engagement_score, 33.0);

        // Second insert with the same external id must fail
        assert!(insert_content_item(&conn, &test_item("tw1", account_id, 50.0)).is_err());
    }

    #[test]
    fn test_update_item_metrics() {
        let conn = test_db();
        let account_id = insert_account(&conn, &test_account("builder")).unwrap();
        let item_id = insert_content_item(&conn, &test_item("tw1", account_id, 33.0)).unwrap();

        update_item_metrics(&conn, item_id, 100, 20, 10, 5, 200.0, 20.0).unwrap();
        let loaded = get_item_by_external_id(&conn, "tw1").unwrap().unwrap();
        assert_eq!(loaded.like_count, 100);
        assert_eq!(loaded.engagement_score, 200.0);
        // Topics untouched by a metric refresh
        assert_eq!(loaded.hashtags, vec!["ai"]);
    }

    #[test]
    fn test_latest_external_id_orders_by_created_at() {
        let conn = test_db();
        let account_id = insert_account(&conn, &test_account("builder")).unwrap();

        let mut older = test_item("tw_old", account_id, 10.0);
        older.created_at = t0() - chrono::Duration::hours(5);
        insert_content_item(&conn, &older).unwrap();

        let newer = test_item("tw_new", account_id, 10.0);
        insert_content_item(&conn, &newer).unwrap();

        assert_eq!(
            latest_external_id(&conn, account_id).unwrap(),
            Some("tw_new".to_string())
        );
    }

    #[test]
    fn test_snapshot_series_newest_first() {
        let conn = test_db();
        let account_id = insert_account(&conn, &test_account("builder")).unwrap();
        let item_id = insert_content_item(&conn, &test_item("tw1", account_id, 33.0)).unwrap();

        for (i, engagement) in [(0, 33.0), (1, 50.0), (2, 80.0)] {
            insert_snapshot(
                &conn,
                &AnalyticsSnapshot {
                    id: 0,
                    content_item_id: item_id,
                    like_count: 10,
                    retweet_count: 5,
                    reply_count: 2,
                    quote_count: 1,
                    engagement_score: engagement,
                    hours_after_post: i,
                    recorded_at: t0() + chrono::Duration::hours(i),
                },
            )
            .unwrap();
        }

        let snaps = recent_snapshots(&conn, item_id, 5).unwrap();
        assert_eq!(snaps.len(), 3);
        assert_eq!(snaps[0].engagement_score, 80.0);
        assert_eq!(snaps[2].engagement_score, 33.0);
        assert_eq!(count_snapshots(&conn, item_id).unwrap(), 3);
    }

    #[test]
    fn test_topic_upsert_increments() {
        let conn = test_db();
        upsert_topic_mention(&conn, "ai", TopicKind::Hashtag, 10.0, t0()).unwrap();
        upsert_topic_mention(&conn, "ai", TopicKind::Hashtag, 20.0, t0()).unwrap();

        let topic = get_topic(&conn, "ai").unwrap().unwrap();
        assert_eq!(topic.mention_count, 2);
        assert_eq!(topic.engagement_sum, 30.0);
        // First sight seeded trend_score from the first engagement
        assert_eq!(topic.trend_score, 10.0);
        assert!(topic.is_active);
    }

    #[test]
    fn test_topic_upsert_order_independent() {
        let a = test_db();
        upsert_topic_mention(&a, "ai", TopicKind::Hashtag, 10.0, t0()).unwrap();
        upsert_topic_mention(&a, "ai", TopicKind::Hashtag, 20.0, t0()).unwrap();

        let b = test_db();
        upsert_topic_mention(&b, "ai", TopicKind::Hashtag, 20.0, t0()).unwrap();
        upsert_topic_mention(&b, "ai", TopicKind::Hashtag, 10.0, t0()).unwrap();

        let ta = get_topic(&a, "ai").unwrap().unwrap();
        let tb = get_topic(&b, "ai").unwrap().unwrap();
        assert_eq!(ta.mention_count, tb.mention_count);
        assert_eq!(ta.engagement_sum, tb.engagement_sum);
    }

    #[test]
    fn test_count_topic_mentions_is_exact_token_match() {
        let conn = test_db();
        let account_id = insert_account(&conn, &test_account("builder")).unwrap();

        let mut with_ai = test_item("tw1", account_id, 10.0);
        with_ai.hashtags = vec!["ai".to_string()];
        insert_content_item(&conn, &with_ai).unwrap();

        // "aid" must not match "ai"
        let mut with_aid = test_item("tw2", account_id, 10.0);
        with_aid.hashtags = vec!["aid".to_string()];
        insert_content_item(&conn, &with_aid).unwrap();

        let cutoff = t0() - chrono::Duration::hours(1);
        assert_eq!(count_topic_mentions_since(&conn, "ai", cutoff).unwrap(), 1);
        assert_eq!(count_topic_mentions_since(&conn, "aid", cutoff).unwrap(), 1);
    }

    #[test]
    fn test_count_topic_mentions_is_case_sensitive() {
        let conn = test_db();
        let account_id = insert_account(&conn, &test_account("builder")).unwrap();

        // Case variants are distinct topics and must count separately
        let mut lower = test_item("tw1", account_id, 10.0);
        lower.hashtags = vec!["rustlang".to_string()];
        insert_content_item(&conn, &lower).unwrap();

        let mut mixed = test_item("tw2", account_id, 10.0);
        mixed.hashtags = vec!["RustLang".to_string()];
        insert_content_item(&conn, &mixed).unwrap();

        let cutoff = t0() - chrono::Duration::hours(1);
        assert_eq!(count_topic_mentions_since(&conn, "rustlang", cutoff).unwrap(), 1);
        assert_eq!(count_topic_mentions_since(&conn, "RustLang", cutoff).unwrap(), 1);
    }

    #[test]
    fn test_top_accounts_tiebreak_is_account_id() {
        let conn = test_db();
        let first = insert_account(&conn, &test_account("first")).unwrap();
        let second = insert_account(&conn, &test_account("second")).unwrap();

        insert_content_item(&conn, &test_item("a1", first, 50.0)).unwrap();
        insert_content_item(&conn, &test_item("b1", second, 50.0)).unwrap();

        let cutoff = t0() - chrono::Duration::hours(1);
        let top = top_accounts_by_engagement(&conn, cutoff, 5).unwrap();
        assert_eq!(top.len(), 2);
        // Equal averages: lower account id wins
        assert_eq!(top[0].0, "first");
        assert_eq!(top[1].0, "second");
    }

    #[test]
    fn test_collection_run_ledger() {
        let conn = test_db();
        let run = CollectionRun {
            id: 0,
            account_id: None,
            items_collected: 12,
            api_calls: 3,
            errors_count: 1,
            status: RunStatus::PartialSuccess,
            error_message: Some("one post skipped".to_string()),
            started_at: t0(),
            completed_at: Some(t0() + chrono::Duration::seconds(42)),
            duration_seconds: 42,
        };
        let id = insert_collection_run(&conn, &run).unwrap();
        assert!(id > 0);

        let recent = recent_collection_runs(&conn, 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].status, RunStatus::PartialSuccess);
        assert_eq!(recent[0].items_collected, 12);
        assert!(recent[0].account_id.is_none());
    }

    #[test]
    fn test_average_engagement_empty_window_is_zero() {
        let conn = test_db();
        let avg = average_engagement_since(&conn, t0()).unwrap();
        assert_eq!(avg, 0.0);
    }
}
