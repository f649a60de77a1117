use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GitLabConfig;
use crate::discovery::{CrawlCandidate, ProjectListing};
use crate::error::CrawlError;

/// GitLab projects listing client with personal-token authentication
pub struct GitLabClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitLabClient {
    /// Create a new client from configuration.
    ///
    /// The token must already be resolved (see [`crate::Config::validate`]).
    pub fn new(config: &GitLabConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .context("GitLab personal token is not configured")?;

        if !token.starts_with("glpat-") {
            warn!("GitLab token doesn't look like a personal access token (should start with glpat-)");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("forge-indexer/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Listing endpoint this client queries
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters for a single-item keyset page after `id_after`
    fn page_query(&self, id_after: u64) -> [(&'static str, String); 6] {
        [
            ("private_token", self.token.clone()),
            ("pagination", "keyset".to_string()),
            ("order_by", "id".to_string()),
            ("sort", "asc".to_string()),
            ("per_page", "1".to_string()),
            ("id_after", id_after.to_string()),
        ]
    }
}

#[async_trait]
impl ProjectListing for GitLabClient {
    async fn fetch_after(&self, id_after: u64) -> Result<Option<CrawlCandidate>, CrawlError> {
        debug!("Fetching next project after id {}", id_after);

        let response = self
            .client
            .get(&self.base_url)
            .query(&self.page_query(id_after))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(CrawlError::from_status(status, body));
        }

        let body = response.text().await?;
        let projects: Vec<CrawlCandidate> =
            serde_json::from_str(&body).map_err(|e| CrawlError::Decode(e.to_string()))?;

        Ok(projects.into_iter().next())
    }

    fn provider_name(&self) -> &'static str {
        "GitLab"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> GitLabConfig {
        GitLabConfig {
            base_url: "https://gitlab.example.com/api/v4/projects/".to_string(),
            token: token.map(str::to_string),
            timeout_secs: 3,
        }
    }

    #[test]
    fn test_client_requires_token() {
        assert!(GitLabClient::new(&config(None)).is_err());
        assert!(GitLabClient::new(&config(Some(""))).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GitLabClient::new(&config(Some("glpat-abc"))).unwrap();
        assert_eq!(client.base_url(), "https://gitlab.example.com/api/v4/projects");
    }

    #[test]
    fn test_page_query() {
        let client = GitLabClient::new(&config(Some("glpat-abc"))).unwrap();
        let query = client.page_query(17);

        assert!(query.contains(&("private_token", "glpat-abc".to_string())));
        assert!(query.contains(&("pagination", "keyset".to_string())));
        assert!(query.contains(&("order_by", "id".to_string())));
        assert!(query.contains(&("sort", "asc".to_string())));
        assert!(query.contains(&("per_page", "1".to_string())));
        assert!(query.contains(&("id_after", "17".to_string())));
    }
}
