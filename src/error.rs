use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure to retrieve a page. Logged and skipped by the walker, never retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Why a fetched page produced no article record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no mw-parser-output container")]
    MissingContent,

    #[error("no first-level heading")]
    MissingTitle,

    #[error("content too short ({chars} chars)")]
    TooShort { chars: usize },
}

impl ExtractError {
    /// Short content is a quality filter, not a structural failure.
    pub fn is_quality_gate(&self) -> bool {
        matches!(self, ExtractError::TooShort { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_too_short_is_quality_gate() {
        assert!(ExtractError::TooShort { chars: 12 }.is_quality_gate());
        assert!(!ExtractError::MissingContent.is_quality_gate());
        assert!(!ExtractError::MissingTitle.is_quality_gate());
    }

    #[test]
    fn status_message_names_url() {
        let e = FetchError::Status {
            url: "https://af.wikipedia.org/wiki/X".into(),
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(e.to_string(), "HTTP 404 Not Found for https://af.wikipedia.org/wiki/X");
    }
}
