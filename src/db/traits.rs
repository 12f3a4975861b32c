// Database trait — backend-agnostic async interface for all DB operations.
//
// Implementor: SqliteDatabase (wraps rusqlite). All methods are async so a
// native-async backend fits behind the same interface later.
//
// The trait mirrors the queries.rs function signatures, so switching from
// direct Connection usage to `Arc<dyn Database>` is a straightforward
// mechanical replacement in callers.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{
    Account, AnalyticsSnapshot, CollectionRun, ContentItem, TopicKind, TrendingTopic,
};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Accounts ---

    async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>>;

    async fn get_account(&self, id: i64) -> Result<Option<Account>>;

    /// Register a new account and return its id.
    async fn insert_account(&self, account: &Account) -> Result<i64>;

    /// Opportunistic profile refresh after a successful collection.
    async fn update_account_profile(
        &self,
        id: i64,
        display_name: &str,
        description: Option<&str>,
        follower_count: i64,
        avatar_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// All accounts eligible for batch collection, in registration order.
    async fn list_active_accounts(&self) -> Result<Vec<Account>>;

    // --- Content items ---

    /// Find an item by the platform's post id (the deduplication key).
    async fn get_item_by_external_id(&self, external_id: &str) -> Result<Option<ContentItem>>;

    /// Persist a newly-ingested item and return its id.
    async fn insert_content_item(&self, item: &ContentItem) -> Result<i64>;

    /// Metric refresh on the update path of ingestion.
    #[allow(clippy::too_many_arguments)]
    async fn update_item_metrics(
        &self,
        id: i64,
        likes: i64,
        retweets: i64,
        replies: i64,
        quotes: i64,
        engagement_score: f64,
        normalized_score: f64,
    ) -> Result<()>;

    /// Write an item's recomputed trending score.
    async fn update_item_trending(&self, id: i64, trending_score: f64, is_trending: bool)
        -> Result<()>;

    /// Newest stored platform post id for an account (incremental fetch).
    async fn latest_external_id(&self, account_id: i64) -> Result<Option<String>>;

    /// Items created at or after the cutoff, with each account's follower count.
    async fn items_created_since(&self, cutoff: DateTime<Utc>)
        -> Result<Vec<(ContentItem, i64)>>;

    /// One account's items in the window, best engagement first.
    async fn items_for_account_since(
        &self,
        account_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ContentItem>>;

    async fn count_items(&self) -> Result<i64>;

    /// Items in the window carrying the topic in their hashtag/mention lists.
    async fn count_topic_mentions_since(&self, topic: &str, cutoff: DateTime<Utc>)
        -> Result<i64>;

    /// Trending items in the window ranked by trending score, with usernames.
    async fn trending_items_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<(ContentItem, String)>>;

    async fn count_trending_since(&self, cutoff: DateTime<Utc>) -> Result<i64>;

    async fn average_engagement_since(&self, cutoff: DateTime<Utc>) -> Result<f64>;

    /// Top accounts by average engagement; ties break on account id ascending.
    async fn top_accounts_by_engagement(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<(String, f64)>>;

    // --- Analytics snapshots ---

    /// Append a point-in-time metrics snapshot.
    async fn insert_snapshot(&self, snapshot: &AnalyticsSnapshot) -> Result<i64>;

    /// The newest N snapshots for an item, newest first.
    async fn recent_snapshots(&self, content_item_id: i64, limit: u32)
        -> Result<Vec<AnalyticsSnapshot>>;

    async fn count_snapshots(&self, content_item_id: i64) -> Result<i64>;

    // --- Trending topics ---

    /// Atomic increment of a topic's counters (upsert on the topic token).
    async fn upsert_topic_mention(
        &self,
        topic: &str,
        kind: TopicKind,
        engagement_delta: f64,
        now: DateTime<Utc>,
    ) -> Result<()>;

    async fn get_topic(&self, topic: &str) -> Result<Option<TrendingTopic>>;

    /// Active topics last seen at or after the cutoff.
    async fn active_topics_seen_since(&self, cutoff: DateTime<Utc>)
        -> Result<Vec<TrendingTopic>>;

    /// Write a topic's recomputed velocity and trend score.
    async fn update_topic_trend(
        &self,
        id: i64,
        velocity: f64,
        trend_score: f64,
        is_trending: bool,
    ) -> Result<()>;

    /// Currently-trending topics ranked by trend score.
    async fn trending_topics(&self, limit: u32) -> Result<Vec<TrendingTopic>>;

    /// Fast-moving recently-born topics for the insights summary.
    async fn emerging_topics(
        &self,
        first_seen_cutoff: DateTime<Utc>,
        min_velocity: f64,
        limit: u32,
    ) -> Result<Vec<TrendingTopic>>;

    async fn count_topics(&self) -> Result<i64>;

    // --- Collection runs ---

    /// Append one run-outcome record to the ledger.
    async fn insert_collection_run(&self, run: &CollectionRun) -> Result<i64>;

    /// Most recent runs for the status display.
    async fn recent_collection_runs(&self, limit: u32) -> Result<Vec<CollectionRun>>;
}
