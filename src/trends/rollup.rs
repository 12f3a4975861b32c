// Per-account analytics rollup for the `analyze --account` path.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::db::models::ContentItem;
use crate::db::Database;

/// How many of the account's best items the rollup carries.
const TOP_ITEMS: usize = 10;

/// One calendar day's engagement totals.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyEngagement {
    pub date: NaiveDate,
    pub items: i64,
    pub engagement: f64,
}

/// Rollup of one account's recent activity.
#[derive(Debug, Clone)]
pub struct AccountAnalytics {
    pub username: String,
    pub follower_count: i64,
    pub lookback_days: i64,
    pub total_items: i64,
    pub average_engagement: f64,
    pub trending_count: i64,
    /// Best items by engagement, capped at ten.
    pub top_items: Vec<ContentItem>,
    /// Day-by-day totals, oldest first. Days without posts are omitted.
    pub daily_engagement: Vec<DailyEngagement>,
}

/// Build the analytics rollup for one tracked account.
pub async fn account_analytics(
    db: &dyn Database,
    username: &str,
    days: i64,
    now: DateTime<Utc>,
) -> Result<AccountAnalytics> {
    let account = db
        .get_account_by_username(username)
        .await
        .with_context(|| format!("Failed to look up @{username}"))?;
    let Some(account) = account else {
        bail!("Account @{username} is not tracked. Run `wildfire track {username}` first.");
    };

    let cutoff = now - Duration::days(days);
    let items = db.items_for_account_since(account.id, cutoff).await?;

    let total_items = items.len() as i64;
    let engagement_total: f64 = items.iter().map(|i| i.engagement_score).sum();
    let average_engagement = if total_items > 0 {
        engagement_total / total_items as f64
    } else {
        0.0
    };
    let trending_count = items.iter().filter(|i| i.is_trending).count() as i64;

    // Items arrive best-engagement-first, so the top slice is a prefix
    let top_items: Vec<ContentItem> = items.iter().take(TOP_ITEMS).cloned().collect();

    let mut by_day: BTreeMap<NaiveDate, (i64, f64)> = BTreeMap::new();
    for item in &items {
        let entry = by_day.entry(item.created_at.date_naive()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += item.engagement_score;
    }
    let daily_engagement = by_day
        .into_iter()
        .map(|(date, (items, engagement))| DailyEngagement {
            date,
            items,
            engagement,
        })
        .collect();

    Ok(AccountAnalytics {
        username: account.username,
        follower_count: account.follower_count,
        lookback_days: days,
        total_items,
        average_engagement,
        trending_count,
        top_items,
        daily_engagement,
    })
}
