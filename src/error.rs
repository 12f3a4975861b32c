// Error taxonomy for the content-source boundary.
//
// The collection pipeline decides what to do from the variant alone:
// RateLimited is retryable after a bounded wait, everything else is fatal
// to the current account's run (but never to sibling accounts).
// Persistence failures stay as anyhow errors from the Database trait.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The referenced account or post does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// The upstream API refused the call; retry after the given wait.
    #[error("rate limited (retry after {}s)", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// The upstream call itself failed (network, 5xx, bad payload).
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream payload was malformed (missing required field).
    #[error("invalid input: {0}")]
    Validation(String),
}

impl SourceError {
    /// Whether the collection pipeline should wait and retry this call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_retryable() {
        let err = SourceError::RateLimited {
            retry_after: Duration::from_secs(30),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn other_variants_are_fatal() {
        assert!(!SourceError::NotFound("@ghost".into()).is_retryable());
        assert!(!SourceError::Transport("connection reset".into()).is_retryable());
        assert!(!SourceError::Validation("missing external id".into()).is_retryable());
    }

    #[test]
    fn display_includes_wait() {
        let err = SourceError::RateLimited {
            retry_after: Duration::from_secs(90),
        };
        assert!(err.to_string().contains("90s"));
    }
}
