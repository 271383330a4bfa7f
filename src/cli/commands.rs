use std::path::PathBuf;

use crate::app::{AppContext, ConvertError, Result};
use crate::domain::{Entry, Feed};
use crate::export::Format;
use crate::render::summary_text;

/// Fetch (or read) and parse `source`, keeping at most `limit` entries.
pub async fn load_feed(ctx: &AppContext, source: &str, limit: Option<usize>) -> Result<Feed> {
    tracing::info!(source, "Getting feed");

    let body = if is_remote(source) {
        let result = ctx.fetcher.fetch(source).await?;
        if !result.is_success() {
            return Err(ConvertError::FeedParse(format!(
                "{} answered with HTTP status {}",
                source, result.status
            )));
        }
        result.body
    } else {
        std::fs::read(source)?
    };

    let feed = ctx.normalizer.normalize(&body)?.truncated(limit);
    tracing::debug!(title = %feed.title, entries = feed.entries.len(), "Parsed feed");
    Ok(feed)
}

fn is_remote(source: &str) -> bool {
    url::Url::parse(source)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Run the requested exporters in order. The first failure stops the run.
pub async fn convert(ctx: &AppContext, feed: &Feed, formats: &[Format]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(formats.len());

    for format in formats {
        let path = ctx.exporter(*format).export(feed).await?;
        println!("{} saved to {}", format, path.display());
        written.push(path);
    }

    Ok(written)
}

pub fn print_feed(feed: &Feed, json: bool) -> Result<()> {
    let output = if json {
        format_json(feed)?
    } else {
        format_text(feed)?
    };
    println!("{}", output);
    Ok(())
}

/// `{"feed": ..., "entries": [...]}` with summaries reduced to text.
pub fn format_json(feed: &Feed) -> Result<String> {
    Ok(serde_json::to_string_pretty(&as_text(feed)?)?)
}

pub fn format_text(feed: &Feed) -> Result<String> {
    let feed = as_text(feed)?;
    let mut out = format!("Feed: {}\n", feed.title);

    for entry in &feed.entries {
        out.push_str(&format!(
            "\nTitle: {}\nDate: {}\nLink: {}\n\n{}\n",
            entry.display_title(),
            entry.published,
            entry.link,
            entry.summary
        ));
    }

    Ok(out)
}

fn as_text(feed: &Feed) -> Result<Feed> {
    let entries = feed
        .entries
        .iter()
        .map(|entry| {
            Ok(Entry {
                summary: summary_text(&entry.summary)?,
                ..entry.clone()
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Feed::new(feed.title.clone(), entries))
}
