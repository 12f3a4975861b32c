// Colored terminal output for trend reports, rollups, and collection
// summaries. The main.rs display functions delegate here.

use colored::Colorize;

use crate::ingest::CollectionResult;
use crate::trends::{AccountAnalytics, TrendReport};

/// Display a full trend report in the terminal.
pub fn display_trend_report(report: &TrendReport) {
    println!(
        "\n{}",
        format!(
            "=== Trend Report ({}h window, {} items rescored) ===",
            report.window_hours, report.items_scored
        )
        .bold()
    );

    // Trending items
    if report.trending_items.is_empty() {
        println!("\nNo trending content yet. Run `wildfire collect` to gather posts.");
    } else {
        println!("\n{}", "Trending content:".bold());
        println!(
            "  {:>4}  {:<18} {:>8}  {:>6}  {}",
            "Rank".dimmed(),
            "Account".dimmed(),
            "Score".dimmed(),
            "Eng".dimmed(),
            "Text".dimmed(),
        );
        println!("  {}", "-".repeat(78).dimmed());

        for (i, (item, username)) in report.trending_items.iter().enumerate() {
            let preview = super::truncate_chars(&item.text, 48);
            println!(
                "  {:>4}. @{:<17} {:>8.1}  {:>6.0}  {}",
                i + 1,
                username,
                item.trending_score,
                item.engagement_score,
                preview.dimmed(),
            );
        }
    }

    // Trending topics
    if !report.trending_topics.is_empty() {
        println!("\n{}", "Trending topics:".bold());
        for topic in &report.trending_topics {
            let marker = match topic.kind {
                crate::db::models::TopicKind::Hashtag => "#",
                crate::db::models::TopicKind::Mention => "@",
                crate::db::models::TopicKind::Keyword => "",
            };
            println!(
                "  {}{:<24} score {:>7.1}  {:>5.1}/hr  {} mentions",
                marker.cyan(),
                topic.topic.cyan(),
                topic.trend_score,
                topic.velocity,
                topic.mention_count,
            );
        }
    }

    // Insights
    let insights = &report.insights;
    println!("\n{}", "Insights:".bold());
    println!("  Trending items: {}", insights.trending_count);
    println!("  Average engagement: {:.1}", insights.average_engagement);

    if !insights.top_accounts.is_empty() {
        println!("  Top accounts by avg engagement:");
        for (username, avg) in &insights.top_accounts {
            println!("    @{:<20} {:>8.1}", username, avg);
        }
    }

    if !insights.emerging_topics.is_empty() {
        println!("  {} emerging:", "↗".green());
        for topic in &insights.emerging_topics {
            println!(
                "    {:<24} {:.1} mentions/hr",
                topic.topic.green(),
                topic.velocity
            );
        }
    }
    println!();
}

/// Display one account's analytics rollup.
pub fn display_account_analytics(rollup: &AccountAnalytics) {
    println!(
        "\n{}",
        format!(
            "=== @{} (last {} days) ===",
            rollup.username, rollup.lookback_days
        )
        .bold()
    );
    println!("  Followers: {}", rollup.follower_count);
    println!("  Posts in window: {}", rollup.total_items);
    println!("  Average engagement: {:.1}", rollup.average_engagement);
    println!("  Trending posts: {}", rollup.trending_count);

    if !rollup.top_items.is_empty() {
        println!("\n  Best posts:");
        for (i, item) in rollup.top_items.iter().enumerate() {
            let preview = super::truncate_chars(&item.text, 60);
            let trend_marker = if item.is_trending {
                "▲".red().to_string()
            } else {
                " ".to_string()
            };
            println!(
                "    {:>2}. {} [eng {:>6.0}] {}",
                i + 1,
                trend_marker,
                item.engagement_score,
                preview.dimmed(),
            );
        }
    }

    if !rollup.daily_engagement.is_empty() {
        println!("\n  Daily engagement:");
        for day in &rollup.daily_engagement {
            println!(
                "    {}  {:>3} posts  {:>8.0}",
                day.date, day.items, day.engagement
            );
        }
    }
    println!();
}

/// Display a collect_all batch summary.
pub fn display_collection_result(result: &CollectionResult) {
    if result.success {
        println!(
            "{} Collected {} items from {} accounts in {:.1}s",
            "✓".green().bold(),
            result.items_collected,
            result.accounts_processed,
            result.duration_ms as f64 / 1000.0,
        );
    } else {
        println!(
            "{} Collected {} items from {} accounts ({} failed) in {:.1}s",
            "!".yellow().bold(),
            result.items_collected,
            result.accounts_processed,
            result.errors.len(),
            result.duration_ms as f64 / 1000.0,
        );
        for error in &result.errors {
            println!("  {} {}", "-".dimmed(), error.red());
        }
    }
}
