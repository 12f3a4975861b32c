// Trend analysis pass: rescore items and topics, then assemble a report.
//
// Unlike collection, this pass has no fault isolation — it reads and
// writes only the local database, so any error is a real defect and
// propagates immediately.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::db::models::{ContentItem, TrendingTopic};
use crate::db::Database;
use crate::scoring::engagement::{trending_score, velocity};

/// How many snapshots feed the velocity calculation.
const VELOCITY_SNAPSHOTS: u32 = 5;

/// Window for a topic's recent-mention velocity, in hours.
const TOPIC_RECENT_WINDOW_HOURS: i64 = 6;

/// Multiplier applied to topic velocity in the topic trend score.
const TOPIC_VELOCITY_BOOST: f64 = 100.0;

/// A topic is trending when its score exceeds this and its velocity
/// exceeds one mention per hour.
const TOPIC_TREND_THRESHOLD: f64 = 50.0;
const TOPIC_VELOCITY_THRESHOLD: f64 = 1.0;

/// Reporting window for the trending item list.
const REPORT_WINDOW_DAYS: i64 = 7;

const MAX_TRENDING_ITEMS: u32 = 50;
const MAX_TRENDING_TOPICS: u32 = 20;
const TOP_ACCOUNTS: u32 = 5;

/// Emerging topics: younger than a day and moving faster than two
/// mentions per hour.
const EMERGING_VELOCITY: f64 = 2.0;
const EMERGING_AGE_HOURS: i64 = 24;
const MAX_EMERGING: u32 = 10;

/// Aggregate insights attached to every trend report.
#[derive(Debug, Clone)]
pub struct TrendInsights {
    /// Trending items inside the reporting window.
    pub trending_count: i64,
    pub average_engagement: f64,
    /// (username, average engagement), best first; ties break on the
    /// older account.
    pub top_accounts: Vec<(String, f64)>,
    pub emerging_topics: Vec<TrendingTopic>,
}

/// Output of one analysis pass.
#[derive(Debug, Clone)]
pub struct TrendReport {
    pub generated_at: DateTime<Utc>,
    pub window_hours: i64,
    pub items_scored: i64,
    pub topics_scored: i64,
    /// (item, username), best trending score first.
    pub trending_items: Vec<(ContentItem, String)>,
    pub trending_topics: Vec<TrendingTopic>,
    pub insights: TrendInsights,
}

/// Run a full analysis pass.
///
/// Rescores every item created inside the window and every active topic
/// seen inside it, then assembles the ranked report. `threshold` is the
/// strict lower bound an item's trending score must exceed.
pub async fn analyze_trends(
    db: &dyn Database,
    window_hours: i64,
    threshold: f64,
    now: DateTime<Utc>,
) -> Result<TrendReport> {
    let cutoff = now - Duration::hours(window_hours);

    // Step 1: rescore items
    let items = db
        .items_created_since(cutoff)
        .await
        .context("Failed to load items for rescoring")?;
    let items_scored = items.len() as i64;

    for (item, follower_count) in &items {
        let snapshots = db.recent_snapshots(item.id, VELOCITY_SNAPSHOTS).await?;
        let item_velocity = velocity(&snapshots);
        let hours_old = (now - item.created_at).num_seconds() as f64 / 3600.0;
        let score = trending_score(
            item.engagement_score,
            hours_old,
            *follower_count,
            item_velocity,
        );
        db.update_item_trending(item.id, score, score > threshold)
            .await?;
    }

    // Step 2: rescore topics
    let topics = db
        .active_topics_seen_since(cutoff)
        .await
        .context("Failed to load topics for rescoring")?;
    let topics_scored = topics.len() as i64;
    let recent_cutoff = now - Duration::hours(TOPIC_RECENT_WINDOW_HOURS);

    for topic in &topics {
        let recent_mentions = db
            .count_topic_mentions_since(&topic.topic, recent_cutoff)
            .await?;
        let topic_velocity = recent_mentions as f64 / TOPIC_RECENT_WINDOW_HOURS as f64;
        let trend_score = topic.engagement_sum / (topic.mention_count.max(1) as f64)
            + topic_velocity * TOPIC_VELOCITY_BOOST;
        let is_trending =
            trend_score > TOPIC_TREND_THRESHOLD && topic_velocity > TOPIC_VELOCITY_THRESHOLD;
        db.update_topic_trend(topic.id, topic_velocity, trend_score, is_trending)
            .await?;
    }

    // Step 3: ranked lists over the reporting window
    let report_cutoff = now - Duration::days(REPORT_WINDOW_DAYS);
    let trending_items = db
        .trending_items_since(report_cutoff, MAX_TRENDING_ITEMS)
        .await?;
    let trending_topics = db.trending_topics(MAX_TRENDING_TOPICS).await?;

    // Step 4: insights
    let insights = TrendInsights {
        trending_count: db.count_trending_since(report_cutoff).await?,
        average_engagement: db.average_engagement_since(report_cutoff).await?,
        top_accounts: db
            .top_accounts_by_engagement(report_cutoff, TOP_ACCOUNTS)
            .await?,
        emerging_topics: db
            .emerging_topics(
                now - Duration::hours(EMERGING_AGE_HOURS),
                EMERGING_VELOCITY,
                MAX_EMERGING,
            )
            .await?,
    };

    info!(
        items_scored = items_scored,
        topics_scored = topics_scored,
        trending = insights.trending_count,
        "Trend analysis complete"
    );

    Ok(TrendReport {
        generated_at: now,
        window_hours,
        items_scored,
        topics_scored,
        trending_items,
        trending_topics,
        insights,
    })
}
