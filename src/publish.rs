//! Downstream delivery of accepted repositories.

use anyhow::{Context, Result};
use std::io::Write;

use crate::discovery::CrawlResult;

/// Receives every accepted repository before the cursor moves past it
pub trait Publisher {
    fn publish(&mut self, result: &CrawlResult) -> Result<()>;
}

/// Writes one JSON object per line and flushes after each result
pub struct JsonLinesPublisher<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesPublisher<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Publisher for JsonLinesPublisher<W> {
    fn publish(&mut self, result: &CrawlResult) -> Result<()> {
        serde_json::to_writer(&mut self.writer, result)
            .context("Failed to serialize crawl result")?;
        self.writer
            .write_all(b"\n")
            .and_then(|_| self.writer.flush())
            .context("Failed to write crawl result")?;
        Ok(())
    }
}
