// Trend analysis — item/topic rescoring, report assembly, and per-account
// rollups.

pub mod analyzer;
pub mod rollup;

pub use analyzer::{analyze_trends, TrendInsights, TrendReport};
pub use rollup::{account_analytics, AccountAnalytics, DailyEngagement};
