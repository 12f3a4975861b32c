// ContentSource trait — the seam between ingestion and the platform API.
//
// Implementor: HttpContentSource (X API v2 over reqwest). Tests swap in
// in-memory fakes, so the collector never touches the network in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SourceError;

/// A platform profile as returned by the source, before it becomes an
/// `Account` row.
#[derive(Debug, Clone)]
pub struct Profile {
    /// The platform's user id.
    pub external_id: String,
    pub username: String,
    pub display_name: String,
    pub description: Option<String>,
    pub follower_count: i64,
    pub avatar_url: Option<String>,
}

/// How a post references another post, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Retweeted,
    Quoted,
    RepliedTo,
}

/// Public engagement counters attached to a post.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostMetrics {
    pub likes: i64,
    pub retweets: i64,
    pub replies: i64,
    pub quotes: i64,
}

/// A post as returned by the source, before scoring and persistence.
#[derive(Debug, Clone)]
pub struct RawPost {
    /// The platform's post id (the deduplication key downstream).
    pub external_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub metrics: PostMetrics,
    /// Entity lists the platform parsed out of the text. Downstream falls
    /// back to its own extraction when these are empty.
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub urls: Vec<String>,
    pub reference: Option<ReferenceKind>,
}

impl RawPost {
    pub fn is_retweet(&self) -> bool {
        self.reference == Some(ReferenceKind::Retweeted)
    }

    pub fn is_reply(&self) -> bool {
        self.reference == Some(ReferenceKind::RepliedTo)
    }

    pub fn is_quote(&self) -> bool {
        self.reference == Some(ReferenceKind::Quoted)
    }
}

/// Read-only access to the content platform.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Look up a profile by username. `Ok(None)` means the username does
    /// not exist on the platform; errors are transport-level failures.
    async fn get_profile(&self, username: &str) -> Result<Option<Profile>, SourceError>;

    /// Fetch up to `max_posts` recent posts for a user, newest first.
    ///
    /// When `since_id` is set, only posts newer than that platform id are
    /// returned (incremental collection).
    async fn get_recent_posts(
        &self,
        user_external_id: &str,
        max_posts: u32,
        since_id: Option<&str>,
    ) -> Result<Vec<RawPost>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_kind_flags() {
        let mut post = RawPost {
            external_id: "1".to_string(),
            text: "hi".to_string(),
            created_at: Utc::now(),
            metrics: PostMetrics::default(),
            hashtags: vec![],
            mentions: vec![],
            urls: vec![],
            reference: None,
        };
        assert!(!post.is_retweet() && !post.is_reply() && !post.is_quote());

        post.reference = Some(ReferenceKind::Retweeted);
        assert!(post.is_retweet());
        assert!(!post.is_quote());

        post.reference = Some(ReferenceKind::RepliedTo);
        assert!(post.is_reply());

        post.reference = Some(ReferenceKind::Quoted);
        assert!(post.is_quote());
    }
}
