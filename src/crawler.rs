//! Resumable crawl over a keyset-ordered listing.
//!
//! [`CursorAdvancer::advance`] walks the listing one project at a time,
//! starting strictly after the caller's cursor, and stops at the first
//! project the filter chain accepts. Rejected projects still move the
//! working cursor forward so they are never fetched twice in one call.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::discovery::{Crawl, CrawlResult, ProjectListing};
use crate::error::CrawlError;
use crate::filter::{self, FilterParameters, Verdict};

/// Parse a caller cursor into the listing's numeric id space.
///
/// `None` means the start of the collection.
pub fn parse_cursor(cursor: Option<&str>) -> Result<u64, CrawlError> {
    match cursor {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| CrawlError::InvalidCursor(raw.to_string())),
    }
}

/// Drives the fetch/filter loop against a [`ProjectListing`]
pub struct CursorAdvancer<L> {
    listing: L,
    filters: FilterParameters,
}

impl<L: ProjectListing> CursorAdvancer<L> {
    pub fn new(listing: L, filters: FilterParameters) -> Self {
        Self { listing, filters }
    }

    pub fn filters(&self) -> &FilterParameters {
        &self.filters
    }

    pub fn listing(&self) -> &L {
        &self.listing
    }

    /// Return the next accepted repository after `cursor`, or `None` when
    /// the listing currently has nothing further.
    pub async fn advance(
        &self,
        cursor: Option<&str>,
        filters: &FilterParameters,
    ) -> Result<Option<CrawlResult>, CrawlError> {
        let mut id_after = parse_cursor(cursor)?;

        loop {
            debug!("Start a new crawl");
            debug!("Last crawl id: {:?}", cursor);
            debug!("Last tested id: {}", id_after);

            let Some(candidate) = self.listing.fetch_after(id_after).await? else {
                debug!("No repositories after id {}", id_after);
                return Ok(None);
            };

            if candidate.id <= id_after {
                return Err(CrawlError::OutOfOrder {
                    after: id_after,
                    got: candidate.id,
                });
            }

            info!(
                "Tested repository id: {} ({})",
                candidate.id, candidate.web_url
            );
            debug!(
                visibility = ?candidate.visibility,
                stars = candidate.star_count,
                forks = candidate.forks_count,
                last_activity = %candidate.last_activity_at,
                "Tested repository details"
            );

            match filter::evaluate(&candidate, filters, Utc::now()) {
                Verdict::Reject(reason) => {
                    info!("Repository {} rejected due to {}", candidate.id, reason);
                    id_after = candidate.id;
                }
                Verdict::Accept => {
                    let result = CrawlResult::from_candidate(&candidate);
                    info!("Repository accepted: {} ({})", result.id, result.repo_url);
                    return Ok(Some(result));
                }
            }
        }
    }
}

#[async_trait]
impl<L: ProjectListing> Crawl for CursorAdvancer<L> {
    async fn crawl_next(&self, cursor: Option<&str>) -> Result<Option<CrawlResult>, CrawlError> {
        self.advance(cursor, &self.filters).await
    }

    fn provider_name(&self) -> &'static str {
        self.listing.provider_name()
    }
}
