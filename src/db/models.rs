// Data models — Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monitored social account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    /// Platform username, unique within the store.
    pub username: String,
    pub display_name: String,
    pub description: Option<String>,
    pub follower_count: i64,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ingested post and its derived scores.
///
/// Exactly one row exists per `external_id`. Metric counts are the
/// platform's point-in-time totals at the most recent ingestion, not deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    /// The platform's post id — the deduplication key.
    pub external_id: String,
    pub account_id: i64,
    pub text: String,
    /// Platform-asserted creation time.
    pub created_at: DateTime<Utc>,
    pub like_count: i64,
    pub retweet_count: i64,
    pub reply_count: i64,
    pub quote_count: i64,
    pub engagement_score: f64,
    pub normalized_score: f64,
    pub trending_score: f64,
    pub is_trending: bool,
    /// Extracted tokens, order of first appearance (JSON arrays in the DB).
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub urls: Vec<String>,
    pub is_retweet: bool,
    pub is_reply: bool,
    pub is_quote: bool,
}

/// Immutable point-in-time metrics record, appended on every refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub id: i64,
    pub content_item_id: i64,
    pub like_count: i64,
    pub retweet_count: i64,
    pub reply_count: i64,
    pub quote_count: i64,
    pub engagement_score: f64,
    /// Whole hours between the post's creation and this snapshot.
    pub hours_after_post: i64,
    pub recorded_at: DateTime<Utc>,
}

/// What kind of token a trending topic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicKind {
    Hashtag,
    Mention,
    Keyword,
}

impl TopicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicKind::Hashtag => "HASHTAG",
            TopicKind::Mention => "MENTION",
            TopicKind::Keyword => "KEYWORD",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "HASHTAG" => TopicKind::Hashtag,
            "MENTION" => TopicKind::Mention,
            _ => TopicKind::Keyword,
        }
    }
}

impl std::fmt::Display for TopicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Running aggregate for one unique topic token.
///
/// `mention_count` and `engagement_sum` only ever increment, via a
/// single-statement upsert. `trend_score` and `velocity` are recomputed by
/// the trend pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub id: i64,
    pub topic: String,
    pub kind: TopicKind,
    pub mention_count: i64,
    pub engagement_sum: f64,
    pub trend_score: f64,
    pub velocity: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_active: bool,
    pub is_trending: bool,
}

/// Outcome status of one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
    PartialSuccess,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "PENDING",
            RunStatus::Running => "RUNNING",
            RunStatus::Success => "SUCCESS",
            RunStatus::Failed => "FAILED",
            RunStatus::PartialSuccess => "PARTIAL_SUCCESS",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "PENDING" => RunStatus::Pending,
            "RUNNING" => RunStatus::Running,
            "SUCCESS" => RunStatus::Success,
            "PARTIAL_SUCCESS" => RunStatus::PartialSuccess,
            _ => RunStatus::Failed,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded collection attempt. Append-only; never mutated after
/// `completed_at` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRun {
    pub id: i64,
    /// None for an aggregate all-accounts run.
    pub account_id: Option<i64>,
    pub items_collected: i64,
    pub api_calls: i64,
    pub errors_count: i64,
    pub status: RunStatus,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_kind_round_trip() {
        for kind in [TopicKind::Hashtag, TopicKind::Mention, TopicKind::Keyword] {
            assert_eq!(TopicKind::from_str(kind.as_str()), kind);
        }
    }

    #[test]
    fn run_status_round_trip() {
        for status in [
            RunStatus::Pending,
            RunStatus::Running,
            RunStatus::Success,
            RunStatus::Failed,
            RunStatus::PartialSuccess,
        ] {
            assert_eq!(RunStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_status_string_falls_to_failed() {
        assert_eq!(RunStatus::from_str("GARBAGE"), RunStatus::Failed);
    }
}
