// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points — Rust enforces this because
// MutexGuard is !Send.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{
    Account, AnalyticsSnapshot, CollectionRun, ContentItem, TopicKind, TrendingTopic,
};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock().await;
        super::queries::get_account_by_username(&conn, username)
    }

    async fn get_account(&self, id: i64) -> Result<Option<Account>> {
        let conn = self.conn.lock().await;
        super::queries::get_account(&conn, id)
    }

    async fn insert_account(&self, account: &Account) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_account(&conn, account)
    }

    async fn update_account_profile(
        &self,
        id: i64,
        display_name: &str,
        description: Option<&str>,
        follower_count: i64,
        avatar_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::update_account_profile(
            &conn,
            id,
            display_name,
            description,
            follower_count,
            avatar_url,
            now,
        )
    }

    async fn list_active_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.conn.lock().await;
        super::queries::list_active_accounts(&conn)
    }

    async fn get_item_by_external_id(&self, external_id: &str) -> Result<Option<ContentItem>> {
        let conn = self.conn.lock().await;
        super::queries::get_item_by_external_id(&conn, external_id)
    }

    async fn insert_content_item(&self, item: &ContentItem) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_content_item(&conn, item)
    }

    async fn update_item_metrics(
        &self,
        id: i64,
        likes: i64,
        retweets: i64,
        replies: i64,
        quotes: i64,
        engagement_score: f64,
        normalized_score: f64,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::update_item_metrics(
            &conn,
            id,
            likes,
            retweets,
            replies,
            quotes,
            engagement_score,
            normalized_score,
        )
    }

    async fn update_item_trending(
        &self,
        id: i64,
        trending_score: f64,
        is_trending: bool,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::update_item_trending(&conn, id, trending_score, is_trending)
    }

    async fn latest_external_id(&self, account_id: i64) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::latest_external_id(&conn, account_id)
    }

    async fn items_created_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<(ContentItem, i64)>> {
        let conn = self.conn.lock().await;
        super::queries::items_created_since(&conn, cutoff)
    }

    async fn items_for_account_since(
        &self,
        account_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ContentItem>> {
        let conn = self.conn.lock().await;
        super::queries::items_for_account_since(&conn, account_id, cutoff)
    }

    async fn count_items(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_items(&conn)
    }

    async fn count_topic_mentions_since(
        &self,
        topic: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_topic_mentions_since(&conn, topic, cutoff)
    }

    async fn trending_items_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<(ContentItem, String)>> {
        let conn = self.conn.lock().await;
        super::queries::trending_items_since(&conn, cutoff, limit)
    }

    async fn count_trending_since(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_trending_since(&conn, cutoff)
    }

    async fn average_engagement_since(&self, cutoff: DateTime<Utc>) -> Result<f64> {
        let conn = self.conn.lock().await;
        super::queries::average_engagement_since(&conn, cutoff)
    }

    async fn top_accounts_by_engagement(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<(String, f64)>> {
        let conn = self.conn.lock().await;
        super::queries::top_accounts_by_engagement(&conn, cutoff, limit)
    }

    async fn insert_snapshot(&self, snapshot: &AnalyticsSnapshot) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_snapshot(&conn, snapshot)
    }

    async fn recent_snapshots(
        &self,
        content_item_id: i64,
        limit: u32,
    ) -> Result<Vec<AnalyticsSnapshot>> {
        let conn = self.conn.lock().await;
        super::queries::recent_snapshots(&conn, content_item_id, limit)
    }

    async fn count_snapshots(&self, content_item_id: i64) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_snapshots(&conn, content_item_id)
    }

    async fn upsert_topic_mention(
        &self,
        topic: &str,
        kind: TopicKind,
        engagement_delta: f64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_topic_mention(&conn, topic, kind, engagement_delta, now)
    }

    async fn get_topic(&self, topic: &str) -> Result<Option<TrendingTopic>> {
        let conn = self.conn.lock().await;
        super::queries::get_topic(&conn, topic)
    }

    async fn active_topics_seen_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<TrendingTopic>> {
        let conn = self.conn.lock().await;
        super::queries::active_topics_seen_since(&conn, cutoff)
    }

    async fn update_topic_trend(
        &self,
        id: i64,
        velocity: f64,
        trend_score: f64,
        is_trending: bool,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::update_topic_trend(&conn, id, velocity, trend_score, is_trending)
    }

    async fn trending_topics(&self, limit: u32) -> Result<Vec<TrendingTopic>> {
        let conn = self.conn.lock().await;
        super::queries::trending_topics(&conn, limit)
    }

    async fn emerging_topics(
        &self,
        first_seen_cutoff: DateTime<Utc>,
        min_velocity: f64,
        limit: u32,
    ) -> Result<Vec<TrendingTopic>> {
        let conn = self.conn.lock().await;
        super::queries::emerging_topics(&conn, first_seen_cutoff, min_velocity, limit)
    }

    async fn count_topics(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_topics(&conn)
    }

    async fn insert_collection_run(&self, run: &CollectionRun) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_collection_run(&conn, run)
    }

    async fn recent_collection_runs(&self, limit: u32) -> Result<Vec<CollectionRun>> {
        let conn = self.conn.lock().await;
        super::queries::recent_collection_runs(&conn, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use chrono::TimeZone;

    async fn test_db() -> SqliteDatabase {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SqliteDatabase::new(conn)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = test_db().await;
        assert_eq!(db.table_count().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_trait_account_roundtrip() {
        let db = test_db().await;
        let account = Account {
            id: 0,
            username: "builder".to_string(),
            display_name: "Builder".to_string(),
            description: Some("ships things".to_string()),
            follower_count: 1234,
            avatar_url: None,
            is_active: true,
            created_at: t0(),
            updated_at: t0(),
        };
        let id = db.insert_account(&account).await.unwrap();
        let loaded = db.get_account_by_username("builder").await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.follower_count, 1234);

        let active = db.list_active_accounts().await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_trait_topic_upsert() {
        let db = test_db().await;
        db.upsert_topic_mention("rust", TopicKind::Hashtag, 42.0, t0())
            .await
            .unwrap();
        let topic = db.get_topic("rust").await.unwrap().unwrap();
        assert_eq!(topic.mention_count, 1);
        assert_eq!(topic.engagement_sum, 42.0);
        assert_eq!(topic.kind, TopicKind::Hashtag);
    }
}
