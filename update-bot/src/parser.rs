use crate::sources::rss_feed::{FeedAuthor, FeedItem};
use crate::types::{Result, UpdateError};
use chrono::Utc;
use feed_rs::parser;
use tracing::debug;

/// Parse an RSS/Atom document into items, in document order.
pub fn parse_feed(content: &str) -> Result<Vec<FeedItem>> {
    let feed = parser::parse(content.as_bytes())
        .map_err(|e| UpdateError::Parse(format!("Failed to parse feed: {}", e)))?;

    let items: Vec<FeedItem> = feed.entries.into_iter().map(convert_entry).collect();
    debug!("Parsed feed with {} entries", items.len());
    Ok(items)
}

/// Reddit serves its feeds declaring `text/html` content, which the feed
/// parser refuses. Only the first occurrence is the declaration.
pub fn repair_reddit_feed(content: &str) -> String {
    content.replacen("text/html", "application/rss+xml", 1)
}

fn convert_entry(entry: feed_rs::model::Entry) -> FeedItem {
    FeedItem {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        link: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
        description: entry.summary.map(|s| s.content),
        content: entry.content.and_then(|c| c.body),
        authors: entry
            .authors
            .into_iter()
            .map(|a| FeedAuthor { name: a.name })
            .collect(),
        published_at: entry.published.map(|dt| dt.with_timezone(&Utc)),
        updated_at: entry.updated.map(|dt| dt.with_timezone(&Utc)),
    }
}
