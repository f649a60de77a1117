//! Error types for crawling and configuration.

use thiserror::Error;

/// Errors raised by a single crawl call.
///
/// Every variant is fatal to the call that produced it. Retrying is left to
/// the host loop.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Response code other than 200 from forge ({status}): {body}")]
    Upstream {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to reach forge: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode forge response: {0}")]
    Decode(String),

    #[error("Cursor is not a valid repository id: {0:?}")]
    InvalidCursor(String),

    #[error("Forge returned repository {got} which is not after {after}")]
    OutOfOrder { after: u64, got: u64 },
}

impl CrawlError {
    /// Build an upstream error from a non-success status and its body.
    pub fn from_status(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// HTTP status of the failed request, if the forge answered at all.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Errors found while assembling configuration at process start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GITLAB_PERSONAL_TOKEN environment var must be provided (or gitlab.token in config)")]
    MissingToken,

    #[error("Environment variable {name} must be a number, got {value:?}")]
    InvalidEnv { name: String, value: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to expand path {0:?}")]
    Expand(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_keeps_status_and_body() {
        let err = CrawlError::from_status(reqwest::StatusCode::SERVICE_UNAVAILABLE, "try later");

        assert_eq!(err.status(), Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("try later"));
    }

    #[test]
    fn test_non_http_errors_have_no_status() {
        assert_eq!(CrawlError::InvalidCursor("abc".to_string()).status(), None);
        assert_eq!(CrawlError::OutOfOrder { after: 5, got: 5 }.status(), None);
    }
}
