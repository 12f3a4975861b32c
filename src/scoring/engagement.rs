// Engagement and trending score formulas.
//
// The engagement score is a fixed-weight linear combination: retweets and
// quotes signal stronger endorsement/amplification than likes, so they
// weigh more. The trending score layers age decay, follower normalization,
// and a velocity bonus on top of it.

use crate::db::models::AnalyticsSnapshot;

/// Weight applied to each raw metric in the engagement score.
pub const LIKE_WEIGHT: i64 = 1;
pub const RETWEET_WEIGHT: i64 = 3;
pub const REPLY_WEIGHT: i64 = 2;
pub const QUOTE_WEIGHT: i64 = 4;

/// Age-decay horizon in hours (one week). Past it the weight sits at the floor.
pub const AGE_HORIZON_HOURS: f64 = 168.0;

/// Floor for the age weight — old-but-viral content keeps minimal visibility.
pub const AGE_WEIGHT_FLOOR: f64 = 0.1;

/// Floor for follower normalization. log10(0 + 1)/10 is exactly 0, and the
/// trending score divides by this value, so a zero-follower account would
/// otherwise be a divide-by-zero.
pub const FOLLOWER_NORM_FLOOR: f64 = 0.01;

/// Multiplier applied to engagement-per-hour velocity in the trending score.
pub const VELOCITY_BOOST: f64 = 10.0;

/// Weighted engagement score: likes*1 + retweets*3 + replies*2 + quotes*4.
pub fn engagement_score(likes: i64, retweets: i64, replies: i64, quotes: i64) -> f64 {
    (likes * LIKE_WEIGHT + retweets * RETWEET_WEIGHT + replies * REPLY_WEIGHT
        + quotes * QUOTE_WEIGHT) as f64
}

/// Engagement score normalized to 0-100, clamping at 1000 raw engagement.
pub fn normalized_score(engagement: f64) -> f64 {
    (engagement / 1000.0 * 100.0).min(100.0)
}

/// Linear age decay over the one-week horizon, floored at 0.1.
pub fn age_weight(hours_old: f64) -> f64 {
    (1.0 - hours_old / AGE_HORIZON_HOURS).max(AGE_WEIGHT_FLOOR)
}

/// Follower-count normalization: log10(f + 1) / 10, floored at
/// `FOLLOWER_NORM_FLOOR` so downstream division is always defined.
pub fn follower_normalization(follower_count: i64) -> f64 {
    (((follower_count + 1) as f64).log10() / 10.0).max(FOLLOWER_NORM_FLOOR)
}

/// Engagement velocity (points per hour) from a newest-first snapshot series.
///
/// Uses the two most recent snapshots. Exactly 0 when fewer than two exist
/// or when they carry the same timestamp — never NaN, never negative-infinity.
pub fn velocity(snapshots: &[AnalyticsSnapshot]) -> f64 {
    if snapshots.len() < 2 {
        return 0.0;
    }
    let latest = &snapshots[0];
    let previous = &snapshots[1];
    let hours_between =
        (latest.recorded_at - previous.recorded_at).num_seconds() as f64 / 3600.0;
    if hours_between <= 0.0 {
        return 0.0;
    }
    (latest.engagement_score - previous.engagement_score) / hours_between
}

/// Combined trending score, floored at 0:
/// `(engagement * age_weight) / follower_normalization + velocity * 10`.
pub fn trending_score(
    engagement: f64,
    hours_old: f64,
    follower_count: i64,
    velocity: f64,
) -> f64 {
    let base = engagement * age_weight(hours_old) / follower_normalization(follower_count);
    (base + velocity * VELOCITY_BOOST).max(0.0)
}
