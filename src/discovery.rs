//! Repository discovery abstraction layer
//!
//! This module holds the provider-agnostic types that flow through a crawl
//! (candidates in, results out) and the two seams around the cursor logic:
//! [`ProjectListing`], the fetch capability the crawler consumes, and
//! [`Crawl`], the capability a host loop calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CrawlError;

/// Repository visibility as reported by the forge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Internal,
    Private,
    /// Any value the forge adds later
    #[serde(other)]
    Other,
}

/// A single repository fetched from the listing, not yet filtered.
///
/// Field names match the GitLab `/projects` payload so it deserializes
/// straight from the response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CrawlCandidate {
    /// Numeric project id, the keyset ordering key
    pub id: u64,

    /// Canonical browser URL
    pub web_url: String,

    /// HTTPS clone URL
    pub http_url_to_repo: String,

    pub visibility: Visibility,

    #[serde(default)]
    pub star_count: u64,

    #[serde(default)]
    pub forks_count: u64,

    /// Last activity timestamp (UTC)
    pub last_activity_at: DateTime<Utc>,
}

/// An accepted repository, handed to the downstream publisher.
///
/// `id` doubles as the resumption cursor for the next crawl call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CrawlResult {
    pub id: String,
    pub repo_url: String,
    pub git_url: String,
    /// Never populated by the crawler: the listing API only samples the top
    /// few languages, so a partial set is worse than none.
    pub languages: Option<Vec<String>>,
}

impl CrawlResult {
    pub fn from_candidate(candidate: &CrawlCandidate) -> Self {
        Self {
            id: candidate.id.to_string(),
            repo_url: candidate.web_url.clone(),
            git_url: candidate.http_url_to_repo.clone(),
            languages: None,
        }
    }
}

/// Keyset-ordered listing of repositories on a forge.
#[async_trait]
pub trait ProjectListing: Send + Sync {
    /// Fetch the single repository with the smallest id strictly greater
    /// than `id_after`, or `None` when the listing has nothing past it.
    async fn fetch_after(&self, id_after: u64) -> Result<Option<CrawlCandidate>, CrawlError>;

    /// Provider name for display/logging
    fn provider_name(&self) -> &'static str;
}

/// Something a host loop can ask for the next accepted repository.
///
/// Implementations hold no state between calls: everything needed to resume
/// is in `cursor`.
#[async_trait]
pub trait Crawl: Send + Sync {
    async fn crawl_next(&self, cursor: Option<&str>) -> Result<Option<CrawlResult>, CrawlError>;

    /// Provider name for display/logging
    fn provider_name(&self) -> &'static str;
}
