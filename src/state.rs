//! State Management - SQLite-based persistence for the crawl cursor
//!
//! This module provides persistent storage for:
//! - The last accepted repository id per indexer (the resume cursor)
//! - Every accepted repository, so processed ids can be audited
//!
//! Committing a result updates both in one transaction, so the cursor never
//! points past a repository that was not recorded.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

use crate::discovery::CrawlResult;

/// Where the host loop keeps its cursor between crawl calls
pub trait CursorStore {
    /// Last committed id, or `None` when crawling from the start
    fn load_cursor(&self) -> Result<Option<String>>;

    /// Record an accepted result and move the cursor to its id
    fn commit(&mut self, result: &CrawlResult) -> Result<()>;
}

/// A repository recorded as processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRepo {
    pub id: String,
    pub indexer: String,
    pub repo_url: String,
    pub git_url: String,
    pub crawled_at: DateTime<Utc>,
}

/// State database manager
pub struct StateDb {
    conn: Connection,
    indexer: String,
}

impl StateDb {
    /// Open or create the state database at a specific path
    pub fn open_at(path: &Path, indexer: impl Into<String>) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        let db = Self {
            conn,
            indexer: indexer.into(),
        };
        db.initialize()?;

        info!("State database opened at {}", path.display());
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(indexer: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Self {
            conn,
            indexer: indexer.into(),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS cursor (
                    indexer TEXT PRIMARY KEY,
                    last_id TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS processed (
                    indexer TEXT NOT NULL,
                    id TEXT NOT NULL,
                    repo_url TEXT NOT NULL,
                    git_url TEXT NOT NULL,
                    crawled_at TEXT NOT NULL,
                    PRIMARY KEY (indexer, id)
                );

                CREATE INDEX IF NOT EXISTS idx_processed_crawled ON processed(indexer, crawled_at);
                "#,
            )
            .context("Failed to initialize database schema")?;

        debug!("Database schema initialized");
        Ok(())
    }

    pub fn indexer(&self) -> &str {
        &self.indexer
    }

    /// Look up a processed repository by id
    pub fn get_processed(&self, id: &str) -> Result<Option<ProcessedRepo>> {
        let result = self
            .conn
            .query_row(
                r#"
                SELECT id, indexer, repo_url, git_url, crawled_at
                FROM processed
                WHERE indexer = ?1 AND id = ?2
                "#,
                params![self.indexer, id],
                |row| {
                    Ok(ProcessedRepo {
                        id: row.get(0)?,
                        indexer: row.get(1)?,
                        repo_url: row.get(2)?,
                        git_url: row.get(3)?,
                        crawled_at: row
                            .get::<_, String>(4)
                            .ok()
                            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                            .map(|dt| dt.with_timezone(&Utc))
                            .unwrap_or_else(Utc::now),
                    })
                },
            )
            .optional()
            .context("Failed to query processed repository")?;

        Ok(result)
    }

    /// Number of repositories processed by this indexer
    pub fn processed_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM processed WHERE indexer = ?1",
                params![self.indexer],
                |row| row.get(0),
            )
            .context("Failed to count processed repositories")?;

        Ok(count as u64)
    }
}

impl CursorStore for StateDb {
    fn load_cursor(&self) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT last_id FROM cursor WHERE indexer = ?1",
                params![self.indexer],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to load cursor")
    }

    fn commit(&mut self, result: &CrawlResult) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self
            .conn
            .transaction()
            .context("Failed to start cursor transaction")?;

        tx.execute(
            r#"
            INSERT INTO processed (indexer, id, repo_url, git_url, crawled_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(indexer, id) DO UPDATE SET
                repo_url = ?3,
                git_url = ?4,
                crawled_at = ?5
            "#,
            params![self.indexer, result.id, result.repo_url, result.git_url, now],
        )
        .context("Failed to record processed repository")?;

        tx.execute(
            r#"
            INSERT INTO cursor (indexer, last_id, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(indexer) DO UPDATE SET
                last_id = ?2,
                updated_at = ?3
            "#,
            params![self.indexer, result.id, now],
        )
        .context("Failed to update cursor")?;

        tx.commit().context("Failed to commit cursor transaction")?;

        debug!("Cursor for {} moved to {}", self.indexer, result.id);
        Ok(())
    }
}
