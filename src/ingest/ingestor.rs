// Per-post ingestion: dedup on external id, score, snapshot, topic counters.
//
// Exactly one content_items row per platform post id. Re-ingesting an
// existing post refreshes its metrics and appends a snapshot; it never
// re-runs topic extraction, so topic counters count distinct posts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::db::models::{AnalyticsSnapshot, ContentItem, TopicKind};
use crate::db::Database;
use crate::scoring::engagement::{engagement_score, normalized_score};
use crate::scoring::topics::extract_topics;
use crate::source::RawPost;

/// What process_post did with a raw post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub content_item_id: i64,
    /// True when a new row was created, false when an existing one was
    /// refreshed.
    pub created: bool,
}

/// Ingest one raw post for a known account.
///
/// Create path: score, persist the item, append the first snapshot, and
/// bump topic counters for every extracted token. Update path: refresh
/// metrics and append a snapshot only.
pub async fn process_post(
    db: &dyn Database,
    raw: &RawPost,
    account_id: i64,
    now: DateTime<Utc>,
) -> Result<IngestOutcome> {
    let engagement = engagement_score(
        raw.metrics.likes,
        raw.metrics.retweets,
        raw.metrics.replies,
        raw.metrics.quotes,
    );
    let normalized = normalized_score(engagement);

    let existing = db
        .get_item_by_external_id(&raw.external_id)
        .await
        .with_context(|| format!("Failed to look up post {}", raw.external_id))?;

    let (item_id, created) = match existing {
        Some(item) => {
            db.update_item_metrics(
                item.id,
                raw.metrics.likes,
                raw.metrics.retweets,
                raw.metrics.replies,
                raw.metrics.quotes,
                engagement,
                normalized,
            )
            .await
            .with_context(|| format!("Failed to refresh metrics for post {}", raw.external_id))?;
            (item.id, false)
        }
        None => {
            // Prefer the platform's parsed entities; fall back to our own
            // extraction when it sent none
            let extracted = extract_topics(&raw.text);
            let hashtags = if raw.hashtags.is_empty() {
                extracted.hashtags
            } else {
                raw.hashtags.clone()
            };
            let mentions = if raw.mentions.is_empty() {
                extracted.mentions
            } else {
                raw.mentions.clone()
            };

            let item = ContentItem {
                id: 0,
                external_id: raw.external_id.clone(),
                account_id,
                text: raw.text.clone(),
                created_at: raw.created_at,
                like_count: raw.metrics.likes,
                retweet_count: raw.metrics.retweets,
                reply_count: raw.metrics.replies,
                quote_count: raw.metrics.quotes,
                engagement_score: engagement,
                normalized_score: normalized,
                trending_score: 0.0,
                is_trending: false,
                hashtags: hashtags.clone(),
                mentions: mentions.clone(),
                urls: raw.urls.clone(),
                is_retweet: raw.is_retweet(),
                is_reply: raw.is_reply(),
                is_quote: raw.is_quote(),
            };

            let id = db
                .insert_content_item(&item)
                .await
                .with_context(|| format!("Failed to insert post {}", raw.external_id))?;

            // Topic counters are best-effort: one bad token must not sink
            // the whole post
            for tag in &hashtags {
                if let Err(e) = db
                    .upsert_topic_mention(tag, TopicKind::Hashtag, engagement, now)
                    .await
                {
                    warn!(topic = %tag, error = %e, "Failed to record hashtag mention");
                }
            }
            for mention in &mentions {
                if let Err(e) = db
                    .upsert_topic_mention(mention, TopicKind::Mention, engagement, now)
                    .await
                {
                    warn!(topic = %mention, error = %e, "Failed to record mention");
                }
            }

            (id, true)
        }
    };

    let hours_after_post = ((now - raw.created_at).num_hours()).max(0);
    let snapshot = AnalyticsSnapshot {
        id: 0,
        content_item_id: item_id,
        like_count: raw.metrics.likes,
        retweet_count: raw.metrics.retweets,
        reply_count: raw.metrics.replies,
        quote_count: raw.metrics.quotes,
        engagement_score: engagement,
        hours_after_post,
        recorded_at: now,
    };
    db.insert_snapshot(&snapshot)
        .await
        .with_context(|| format!("Failed to record snapshot for post {}", raw.external_id))?;

    Ok(IngestOutcome {
        content_item_id: item_id,
        created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use crate::db::SqliteDatabase;
    use crate::source::PostMetrics;
    use chrono::{Duration, TimeZone};
    use rusqlite::Connection;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    async fn test_db_with_account() -> (SqliteDatabase, i64) {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let db = SqliteDatabase::new(conn);
        let account = crate::db::models::Account {
            id: 0,
            username: "builder".to_string(),
            display_name: "Builder".to_string(),
            description: None,
            follower_count: 500,
            avatar_url: None,
            is_active: true,
            created_at: t0(),
            updated_at: t0(),
        };
        let id = db.insert_account(&account).await.unwrap();
        (db, id)
    }

    fn raw_post(external_id: &str, text: &str, likes: i64) -> RawPost {
        RawPost {
            external_id: external_id.to_string(),
            text: text.to_string(),
            created_at: t0() - Duration::hours(2),
            metrics: PostMetrics {
                likes,
                retweets: 0,
                replies: 0,
                quotes: 0,
            },
            hashtags: vec![],
            mentions: vec![],
            urls: vec![],
            reference: None,
        }
    }

    #[tokio::test]
    async fn test_create_path_persists_item_snapshot_and_topics() {
        let (db, account_id) = test_db_with_account().await;

        let raw = raw_post("p1", "launch day #rust @builder", 10);
        let outcome = process_post(&db, &raw, account_id, t0()).await.unwrap();
        assert!(outcome.created);

        let item = db.get_item_by_external_id("p1").await.unwrap().unwrap();
        assert_eq!(item.engagement_score, 10.0);
        assert_eq!(item.hashtags, vec!["rust"]);
        assert_eq!(item.mentions, vec!["builder"]);

        assert_eq!(db.count_snapshots(item.id).await.unwrap(), 1);

        let topic = db.get_topic("rust").await.unwrap().unwrap();
        assert_eq!(topic.mention_count, 1);
        assert_eq!(topic.engagement_sum, 10.0);
        assert_eq!(topic.kind, TopicKind::Hashtag);
    }

    #[tokio::test]
    async fn test_reingest_updates_metrics_without_topic_recount() {
        let (db, account_id) = test_db_with_account().await;

        let raw = raw_post("p1", "launch day #rust", 10);
        process_post(&db, &raw, account_id, t0()).await.unwrap();

        // Same post seen again later with more likes
        let refreshed = raw_post("p1", "launch day #rust", 25);
        let outcome = process_post(&db, &refreshed, account_id, t0() + Duration::hours(1))
            .await
            .unwrap();
        assert!(!outcome.created);

        assert_eq!(db.count_items().await.unwrap(), 1);
        let item = db.get_item_by_external_id("p1").await.unwrap().unwrap();
        assert_eq!(item.like_count, 25);
        assert_eq!(item.engagement_score, 25.0);

        // Two snapshots, one per ingestion
        assert_eq!(db.count_snapshots(item.id).await.unwrap(), 2);

        // Topic counter still reflects one distinct post
        let topic = db.get_topic("rust").await.unwrap().unwrap();
        assert_eq!(topic.mention_count, 1);
        assert_eq!(topic.engagement_sum, 10.0);
    }

    #[tokio::test]
    async fn test_n_reingests_leave_one_row_n_snapshots() {
        let (db, account_id) = test_db_with_account().await;

        for i in 0..5 {
            let raw = raw_post("p1", "steady post", 10 + i);
            process_post(&db, &raw, account_id, t0() + Duration::hours(i))
                .await
                .unwrap();
        }

        assert_eq!(db.count_items().await.unwrap(), 1);
        let item = db.get_item_by_external_id("p1").await.unwrap().unwrap();
        assert_eq!(db.count_snapshots(item.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_platform_entities_win_over_extraction() {
        let (db, account_id) = test_db_with_account().await;

        let mut raw = raw_post("p1", "no tags in text", 1);
        raw.hashtags = vec!["fromapi".to_string()];
        process_post(&db, &raw, account_id, t0()).await.unwrap();

        let item = db.get_item_by_external_id("p1").await.unwrap().unwrap();
        assert_eq!(item.hashtags, vec!["fromapi"]);
        assert!(db.get_topic("fromapi").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_topic_shared_across_posts_counts_each_post_once() {
        let (db, account_id) = test_db_with_account().await;

        process_post(&db, &raw_post("p1", "all in on #ai", 10), account_id, t0())
            .await
            .unwrap();
        process_post(&db, &raw_post("p2", "more #ai takes", 20), account_id, t0())
            .await
            .unwrap();

        let topic = db.get_topic("ai").await.unwrap().unwrap();
        assert_eq!(topic.mention_count, 2);
        assert_eq!(topic.engagement_sum, 30.0);
    }

    #[tokio::test]
    async fn test_snapshot_hours_after_post_never_negative() {
        let (db, account_id) = test_db_with_account().await;

        // Post timestamped in the future relative to `now` (clock skew)
        let mut raw = raw_post("p1", "from the future", 1);
        raw.created_at = t0() + Duration::hours(3);
        let outcome = process_post(&db, &raw, account_id, t0()).await.unwrap();

        let snaps = db.recent_snapshots(outcome.content_item_id, 5).await.unwrap();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].hours_after_post, 0);
    }
}
