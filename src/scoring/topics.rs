// Topic token extraction — literal hashtags and mentions from post text.
//
// Topics are not modeled semantically: a topic is the exact token after a
// `#` or `@`. Order of first appearance is preserved, and duplicates within
// one text collapse so a tag can increment a topic's count at most once per
// content item.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Hashtags and mentions pulled from one post's text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedTopics {
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
}

fn hashtag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\w+)").unwrap())
}

fn mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@(\w+)").unwrap())
}

/// Extract hashtag and mention tokens from post text.
pub fn extract_topics(text: &str) -> ExtractedTopics {
    ExtractedTopics {
        hashtags: capture_unique(hashtag_re(), text),
        mentions: capture_unique(mention_re(), text),
    }
}

/// All first-group captures, first-appearance order, duplicates dropped.
fn capture_unique(re: &Regex, text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for cap in re.captures_iter(text) {
        let token = cap[1].to_string();
        if !seen.contains(&token) {
            seen.push(token);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_hashtags_and_mentions() {
        let topics = extract_topics("Shipping #rust tooling with @alice and @bob #opensource");
        assert_eq!(topics.hashtags, vec!["rust", "opensource"]);
        assert_eq!(topics.mentions, vec!["alice", "bob"]);
    }

    #[test]
    fn preserves_first_appearance_order() {
        let topics = extract_topics("#zebra #apple #zebra #mango");
        assert_eq!(topics.hashtags, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn duplicates_collapse_within_one_text() {
        let topics = extract_topics("#ai #ai #ai @dev @dev");
        assert_eq!(topics.hashtags, vec!["ai"]);
        assert_eq!(topics.mentions, vec!["dev"]);
    }

    #[test]
    fn plain_text_yields_nothing() {
        let topics = extract_topics("no tags in this post at all");
        assert!(topics.hashtags.is_empty());
        assert!(topics.mentions.is_empty());
    }

    #[test]
    fn punctuation_terminates_tokens() {
        let topics = extract_topics("big news: #launch! cc @team.");
        assert_eq!(topics.hashtags, vec!["launch"]);
        assert_eq!(topics.mentions, vec!["team"]);
    }

    #[test]
    fn case_is_preserved_as_extracted() {
        let topics = extract_topics("#RustLang vs #rustlang");
        assert_eq!(topics.hashtags, vec!["RustLang", "rustlang"]);
    }
}
