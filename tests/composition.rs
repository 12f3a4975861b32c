// Composition tests — verifying that the pure scoring functions chain
// together correctly, without any database or network access.

use wildfire::output::truncate_chars;
use wildfire::scoring::engagement::{
    engagement_score, normalized_score, trending_score, FOLLOWER_NORM_FLOOR,
};
use wildfire::scoring::similarity::similarity;
use wildfire::scoring::topics::extract_topics;

// ============================================================
// Chain: raw metrics -> engagement -> normalized -> trending
// ============================================================

#[test]
fn score_chain_for_a_typical_post() {
    // 120 likes, 40 retweets, 25 replies, 5 quotes
    let engagement = engagement_score(120, 40, 25, 5);
    assert_eq!(engagement, 120.0 + 120.0 + 50.0 + 20.0);

    let normalized = normalized_score(engagement);
    assert!((normalized - 31.0).abs() < 1e-9);

    // 12h old, 50k followers, 8 points/hr velocity
    let trending = trending_score(engagement, 12.0, 50_000, 8.0);
    assert!(trending.is_finite());
    assert!(trending > 0.0);

    // The same post from a smaller account trends harder
    let small_account = trending_score(engagement, 12.0, 500, 8.0);
    assert!(small_account > trending);
}

#[test]
fn fresher_posts_outscore_older_ones() {
    let fresh = trending_score(300.0, 2.0, 10_000, 0.0);
    let day_old = trending_score(300.0, 24.0, 10_000, 0.0);
    let week_old = trending_score(300.0, 168.0, 10_000, 0.0);
    assert!(fresh > day_old);
    assert!(day_old > week_old);
}

#[test]
fn zero_follower_account_never_faults_the_chain() {
    let engagement = engagement_score(50, 10, 5, 2);
    let trending = trending_score(engagement, 1.0, 0, 0.0);
    assert!(trending.is_finite());
    // The floor bounds the amplification
    assert!(trending <= engagement / FOLLOWER_NORM_FLOOR);
}

// ============================================================
// Chain: text -> topics -> similarity
// ============================================================

#[test]
fn extracted_topics_feed_similarity() {
    let a = "Big #rust release today, thanks @ferris for the push";
    let b = "Huge #rust milestone shipped today";

    let topics_a = extract_topics(a);
    let topics_b = extract_topics(b);
    assert_eq!(topics_a.hashtags, vec!["rust"]);
    assert_eq!(topics_b.hashtags, vec!["rust"]);
    assert_eq!(topics_a.mentions, vec!["ferris"]);

    let sim = similarity(a, b);
    assert!(sim > 0.0 && sim < 1.0);
}

#[test]
fn near_duplicate_posts_score_near_one() {
    let a = "launch day for the new engine";
    let sim = similarity(a, a);
    assert_eq!(sim, 1.0);
}

#[test]
fn unrelated_posts_score_zero() {
    let sim = similarity("kubernetes cluster autoscaling", "sourdough starter feeding");
    assert_eq!(sim, 0.0);
}

// ============================================================
// Display helpers
// ============================================================

#[test]
fn truncation_respects_char_boundaries() {
    let text = "trend🔥report with emoji";
    let short = truncate_chars(text, 6);
    assert_eq!(short, "trend🔥...");
}
