//! forge-indexer - Incremental discovery of public forge repositories
//!
//! forge-indexer walks a forge's project listing in id order, one project at
//! a time, and hands out the next repository that passes the configured
//! acceptance filters. Each call resumes from a cursor the caller supplies,
//! so the crawl can be stopped and restarted at any point.
//!
//! ## Core Features
//!
//! - **Keyset Crawling**: Strictly increasing traversal of the GitLab projects API
//! - **Acceptance Filters**: Visibility, stars, forks and inactivity thresholds
//! - **Resumable State**: SQLite-backed cursor and processed-id tracking
//! - **Configuration Management**: YAML configuration with environment overrides
//!
//! ## Modules
//!
//! - [`crawler`]: The cursor advancer
//! - [`filter`]: Acceptance filter chain
//! - [`gitlab`]: GitLab projects listing client
//! - [`runner`]: Host loop with cursor persistence and publishing

pub mod config;
pub mod crawler;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod gitlab;
pub mod publish;
pub mod runner;
pub mod state;

pub use config::Config;
pub use crawler::CursorAdvancer;
pub use discovery::{Crawl, CrawlCandidate, CrawlResult, ProjectListing, Visibility};
pub use error::{ConfigError, CrawlError};
pub use filter::{FilterParameters, RejectReason, Verdict};
pub use gitlab::GitLabClient;
pub use runner::{RunOptions, RunSummary, Runner};
pub use state::{CursorStore, StateDb};
