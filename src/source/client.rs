// HTTP content source — X API v2 over reqwest with bearer auth.
//
// A thin wrapper with a generic GET helper; endpoint methods build the
// query and map the typed responses into the trait's Profile/RawPost
// shapes. HTTP status codes map onto the SourceError taxonomy so the
// collector can tell retryable failures from permanent ones.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::SourceError;

use super::rate_limit::{with_retry, RateLimiter};
use super::traits::{ContentSource, PostMetrics, Profile, RawPost, ReferenceKind};

/// Backoff applied when a 429 response carries no Retry-After header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// The platform caps page size at 100; values below 5 are rejected.
const MIN_PAGE_SIZE: u32 = 5;
const MAX_PAGE_SIZE: u32 = 100;

pub struct HttpContentSource {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    users_limiter: RateLimiter,
    posts_limiter: RateLimiter,
}

impl HttpContentSource {
    pub fn new(base_url: &str, api_token: &str) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("wildfire/0.1 (trend-analytics)")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            users_limiter: RateLimiter::for_users(),
            posts_limiter: RateLimiter::for_posts(),
        })
    }

    /// Make an authenticated GET request and deserialize the response.
    ///
    /// `params` are query string key-value pairs.
    async fn api_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);

        debug!(path = path, "API GET request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(params)
            .send()
            .await
            .map_err(|e| SourceError::Transport(format!("Request failed for {path}: {e}")))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(path.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RETRY_AFTER);
            return Err(SourceError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Transport(format!(
                "{path} returned {status}: {body}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Validation(format!("Bad response shape for {path}: {e}")))
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn get_profile(&self, username: &str) -> Result<Option<Profile>, SourceError> {
        let path = format!("/users/by/username/{username}");

        let result = with_retry(&self.users_limiter, || {
            self.api_get::<UserResponse>(
                &path,
                &[("user.fields", "description,public_metrics,profile_image_url")],
            )
        })
        .await;

        let resp = match result {
            Ok(resp) => resp,
            // The platform reports unknown usernames as 404
            Err(SourceError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(resp.data.map(|user| Profile {
            external_id: user.id,
            username: user.username,
            display_name: user.name,
            description: user.description,
            follower_count: user
                .public_metrics
                .map(|m| m.followers_count)
                .unwrap_or(0),
            avatar_url: user.profile_image_url,
        }))
    }

    async fn get_recent_posts(
        &self,
        user_external_id: &str,
        max_posts: u32,
        since_id: Option<&str>,
    ) -> Result<Vec<RawPost>, SourceError> {
        let path = format!("/users/{user_external_id}/tweets");
        let page_size = max_posts.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE).to_string();

        let mut params = vec![
            ("max_results", page_size.as_str()),
            (
                "tweet.fields",
                "created_at,public_metrics,entities,referenced_tweets",
            ),
        ];
        if let Some(since) = since_id {
            params.push(("since_id", since));
        }

        let resp = with_retry(&self.posts_limiter, || {
            self.api_get::<TimelineResponse>(&path, &params)
        })
        .await?;

        let tweets = resp.data.unwrap_or_default();
        let mut posts = Vec::with_capacity(tweets.len());
        for tweet in tweets {
            posts.push(tweet.into_raw_post()?);
        }
        Ok(posts)
    }
}

// -- Serde types for user lookup --

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Option<UserData>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
    username: String,
    name: String,
    description: Option<String>,
    public_metrics: Option<UserMetrics>,
    profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserMetrics {
    followers_count: i64,
}

// -- Serde types for the user timeline --

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    data: Option<Vec<Tweet>>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: Option<String>,
    public_metrics: Option<TweetMetrics>,
    entities: Option<TweetEntities>,
    referenced_tweets: Option<Vec<ReferencedTweet>>,
}

#[derive(Debug, Deserialize, Default)]
struct TweetMetrics {
    #[serde(default)]
    like_count: i64,
    #[serde(default)]
    retweet_count: i64,
    #[serde(default)]
    reply_count: i64,
    #[serde(default)]
    quote_count: i64,
}

#[derive(Debug, Deserialize)]
struct TweetEntities {
    hashtags: Option<Vec<TagEntity>>,
    mentions: Option<Vec<MentionEntity>>,
    urls: Option<Vec<UrlEntity>>,
}

#[derive(Debug, Deserialize)]
struct TagEntity {
    tag: String,
}

#[derive(Debug, Deserialize)]
struct MentionEntity {
    username: String,
}

#[derive(Debug, Deserialize)]
struct UrlEntity {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ReferencedTweet {
    #[serde(rename = "type")]
    kind: String,
}

impl Tweet {
    fn into_raw_post(self) -> Result<RawPost, SourceError> {
        let created_at = match self.created_at {
            Some(ts) => ts
                .parse::<DateTime<Utc>>()
                .map_err(|e| SourceError::Validation(format!("Bad timestamp '{ts}': {e}")))?,
            None => {
                return Err(SourceError::Validation(format!(
                    "Post {} is missing created_at",
                    self.id
                )))
            }
        };

        let metrics = self.public_metrics.unwrap_or_default();

        let (hashtags, mentions, urls) = match self.entities {
            Some(entities) => (
                entities
                    .hashtags
                    .unwrap_or_default()
                    .into_iter()
                    .map(|h| h.tag.to_lowercase())
                    .collect(),
                entities
                    .mentions
                    .unwrap_or_default()
                    .into_iter()
                    .map(|m| m.username.to_lowercase())
                    .collect(),
                entities
                    .urls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|u| u.url)
                    .collect(),
            ),
            None => (Vec::new(), Vec::new(), Vec::new()),
        };

        // The first referenced tweet decides the post's kind
        let reference = self
            .referenced_tweets
            .as_ref()
            .and_then(|refs| refs.first())
            .and_then(|r| match r.kind.as_str() {
                "retweeted" => Some(ReferenceKind::Retweeted),
                "quoted" => Some(ReferenceKind::Quoted),
                "replied_to" => Some(ReferenceKind::RepliedTo),
                _ => None,
            });

        Ok(RawPost {
            external_id: self.id,
            text: self.text,
            created_at,
            metrics: PostMetrics {
                likes: metrics.like_count,
                retweets: metrics.retweet_count,
                replies: metrics.reply_count,
                quotes: metrics.quote_count,
            },
            hashtags,
            mentions,
            urls,
            reference,
        })
    }
}
