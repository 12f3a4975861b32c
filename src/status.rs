// System status display — DB stats, tracked accounts, recent runs.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::db::Database;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_display_path: &str) -> Result<()> {
    if !Path::new(db_display_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `wildfire init` to set up the database.");
        return Ok(());
    }

    // Database file size
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    // Tracked accounts
    let accounts = db.list_active_accounts().await?;
    if accounts.is_empty() {
        println!("Tracked accounts: none");
        println!("  Run `wildfire track <username>` to start monitoring an account");
    } else {
        println!("Tracked accounts: {}", accounts.len());
        for account in &accounts {
            println!(
                "  @{} ({} followers)",
                account.username, account.follower_count
            );
        }
    }

    // Stored content
    println!("Content items: {}", db.count_items().await?);
    println!("Topics seen: {}", db.count_topics().await?);

    // Recent runs
    let runs = db.recent_collection_runs(5).await?;
    if runs.is_empty() {
        println!("Collection runs: none yet");
        println!("  Run `wildfire collect` to gather posts");
    } else {
        println!("Recent collection runs:");
        for run in &runs {
            let scope = match run.account_id {
                Some(id) => format!("account #{id}"),
                None => "all accounts".to_string(),
            };
            println!(
                "  {} {} — {} items, {} errors ({})",
                run.started_at.format("%Y-%m-%d %H:%M"),
                scope,
                run.items_collected,
                run.errors_count,
                run.status,
            );
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
