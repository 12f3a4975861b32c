// Collection pipeline: pull recent posts for monitored accounts and
// ingest them, with fault isolation at both the post and account level.
//
// Every attempt leaves a row in the collection_runs ledger — per-account
// runs for collect_account, plus one aggregate row (NULL account_id) per
// collect_all batch.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{info, warn};

use crate::db::models::{Account, CollectionRun, RunStatus};
use crate::db::Database;
use crate::source::ContentSource;

use super::ingestor::process_post;

/// Summary of one account's collection.
#[derive(Debug, Clone)]
pub struct AccountCollection {
    pub account_id: i64,
    pub username: String,
    pub items_created: i64,
    pub items_updated: i64,
    /// Posts dropped by per-post fault isolation.
    pub posts_skipped: i64,
    pub api_calls: i64,
}

impl AccountCollection {
    pub fn items_collected(&self) -> i64 {
        self.items_created + self.items_updated
    }
}

/// Summary of a whole collect_all batch.
#[derive(Debug, Clone)]
pub struct CollectionResult {
    /// True only when every account collected cleanly.
    pub success: bool,
    /// Accounts that collected successfully; failed accounts are counted
    /// in `errors` instead.
    pub accounts_processed: i64,
    pub items_collected: i64,
    /// One entry per failed account, "username: cause".
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// Collect recent posts for one account.
///
/// Fetches the profile (also serving as the platform-id lookup), pulls
/// posts newer than the newest one already stored, and ingests each with
/// per-post isolation. A run row is written on both success and failure.
pub async fn collect_account(
    db: &dyn Database,
    source: &dyn ContentSource,
    username: &str,
    max_posts: u32,
    now: DateTime<Utc>,
) -> Result<AccountCollection> {
    let started = Instant::now();

    match collect_account_inner(db, source, username, max_posts, now, started).await {
        Ok(summary) => Ok(summary),
        Err(e) => {
            // Ledger the failure before propagating; the account row may
            // not exist yet
            let account_id = db
                .get_account_by_username(username)
                .await
                .ok()
                .flatten()
                .map(|a| a.id);
            record_run(
                db,
                account_id,
                0,
                1,
                1,
                RunStatus::Failed,
                Some(format!("{e:#}")),
                now,
                started,
            )
            .await;
            Err(e)
        }
    }
}

async fn collect_account_inner(
    db: &dyn Database,
    source: &dyn ContentSource,
    username: &str,
    max_posts: u32,
    now: DateTime<Utc>,
    started: Instant,
) -> Result<AccountCollection> {
    let profile = source
        .get_profile(username)
        .await
        .with_context(|| format!("Failed to fetch profile for @{username}"))?
        .with_context(|| format!("Account @{username} does not exist on the platform"))?;

    let account_id = match db.get_account_by_username(username).await? {
        Some(account) => {
            db.update_account_profile(
                account.id,
                &profile.display_name,
                profile.description.as_deref(),
                profile.follower_count,
                profile.avatar_url.as_deref(),
                now,
            )
            .await?;
            account.id
        }
        None => {
            let account = Account {
                id: 0,
                username: profile.username.clone(),
                display_name: profile.display_name.clone(),
                description: profile.description.clone(),
                follower_count: profile.follower_count,
                avatar_url: profile.avatar_url.clone(),
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            db.insert_account(&account).await?
        }
    };

    // Incremental fetch: only posts newer than the newest stored one
    let since_id = db.latest_external_id(account_id).await?;
    let posts = source
        .get_recent_posts(&profile.external_id, max_posts, since_id.as_deref())
        .await
        .with_context(|| format!("Failed to fetch posts for @{username}"))?;

    let mut items_created = 0i64;
    let mut items_updated = 0i64;
    let mut posts_skipped = 0i64;

    for post in &posts {
        match process_post(db, post, account_id, now).await {
            Ok(outcome) if outcome.created => items_created += 1,
            Ok(_) => items_updated += 1,
            Err(e) => {
                warn!(
                    username = username,
                    post = %post.external_id,
                    error = %e,
                    "Failed to ingest post, skipping"
                );
                posts_skipped += 1;
            }
        }
    }

    let summary = AccountCollection {
        account_id,
        username: username.to_string(),
        items_created,
        items_updated,
        posts_skipped,
        api_calls: 2,
    };

    let status = if posts_skipped > 0 {
        RunStatus::PartialSuccess
    } else {
        RunStatus::Success
    };
    record_run(
        db,
        Some(account_id),
        summary.items_collected(),
        summary.api_calls,
        posts_skipped,
        status,
        None,
        now,
        started,
    )
    .await;

    info!(
        username = username,
        created = items_created,
        updated = items_updated,
        skipped = posts_skipped,
        "Account collection complete"
    );

    Ok(summary)
}

/// Collect every active account in one batch.
///
/// Account failures are isolated: one bad account is recorded in `errors`
/// and the batch moves on. The aggregate ledger row carries a NULL
/// account id.
pub async fn collect_all(
    db: &dyn Database,
    source: &dyn ContentSource,
    max_posts: u32,
    now: DateTime<Utc>,
) -> Result<CollectionResult> {
    let started = Instant::now();

    match collect_all_inner(db, source, max_posts, now, started).await {
        Ok(result) => Ok(result),
        Err(e) => {
            record_run(
                db,
                None,
                0,
                0,
                1,
                RunStatus::Failed,
                Some(format!("{e:#}")),
                now,
                started,
            )
            .await;
            Err(e)
        }
    }
}

async fn collect_all_inner(
    db: &dyn Database,
    source: &dyn ContentSource,
    max_posts: u32,
    now: DateTime<Utc>,
    started: Instant,
) -> Result<CollectionResult> {
    let accounts = db.list_active_accounts().await?;

    let pb = ProgressBar::new(accounts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Collecting [{bar:30}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut accounts_processed = 0i64;
    let mut items_collected = 0i64;
    let mut api_calls = 0i64;
    let mut errors: Vec<String> = Vec::new();

    for account in &accounts {
        match collect_account(db, source, &account.username, max_posts, now).await {
            Ok(summary) => {
                accounts_processed += 1;
                items_collected += summary.items_collected();
                api_calls += summary.api_calls;
            }
            Err(e) => {
                warn!(username = %account.username, error = %e, "Account collection failed");
                errors.push(format!("{}: {e:#}", account.username));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let status = if errors.is_empty() {
        RunStatus::Success
    } else if errors.len() == accounts.len() && !accounts.is_empty() {
        RunStatus::Failed
    } else {
        RunStatus::PartialSuccess
    };
    record_run(
        db,
        None,
        items_collected,
        api_calls,
        errors.len() as i64,
        status,
        (!errors.is_empty()).then(|| errors.join("; ")),
        now,
        started,
    )
    .await;

    Ok(CollectionResult {
        success: errors.is_empty(),
        accounts_processed,
        items_collected,
        errors,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Best-effort ledger write; a failed write is logged, never propagated.
#[allow(clippy::too_many_arguments)]
async fn record_run(
    db: &dyn Database,
    account_id: Option<i64>,
    items_collected: i64,
    api_calls: i64,
    errors_count: i64,
    status: RunStatus,
    error_message: Option<String>,
    started_at: DateTime<Utc>,
    started: Instant,
) {
    let elapsed = started.elapsed();
    let run = CollectionRun {
        id: 0,
        account_id,
        items_collected,
        api_calls,
        errors_count,
        status,
        error_message,
        started_at,
        completed_at: Some(
            started_at + Duration::from_std(elapsed).unwrap_or_else(|_| Duration::zero()),
        ),
        duration_seconds: elapsed.as_secs() as i64,
    };
    if let Err(e) = db.insert_collection_run(&run).await {
        warn!(error = %e, "Failed to record collection run");
    }
}
