use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{ConvertError, Result};
use crate::domain::{Entry, Feed};

/// `2024-01-01T00:00:00Z`
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse an RSS/Atom/JSON Feed document. Summaries are kept as HTML.
    pub fn normalize(&self, body: &[u8]) -> Result<Feed> {
        let feed = parser::parse(body).map_err(|e| ConvertError::FeedParse(e.to_string()))?;

        let title = feed
            .title
            .map(|t| decode_html_entities(&t.content).to_string())
            .unwrap_or_default();

        let entries = feed
            .entries
            .into_iter()
            .map(|entry| {
                let title = entry
                    .title
                    .map(|t| decode_html_entities(&t.content).to_string())
                    .unwrap_or_default();
                let published = entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.format(DATE_FORMAT).to_string())
                    .unwrap_or_default();
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default();
                let summary = entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body))
                    .unwrap_or_default();

                Entry::new(title, published, link, summary)
            })
            .collect();

        Ok(Feed::new(title, entries))
    }
}
