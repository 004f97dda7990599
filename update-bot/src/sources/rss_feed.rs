use crate::config::FeedConfig;
use crate::fetcher::{FetchConfig, Fetcher};
use crate::format::FeedFormat;
use crate::parser::{parse_feed, repair_reddit_feed};
use crate::recency::RecencyFilter;
use crate::source::{SnapshotLocation, SourceFetcher, UpdateSource};
use crate::types::{Result, Timestamped, Titled};
use crate::utils::file_name_from_url;
use crate::diff::ByTitle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interfaces::{ChannelId, OutgoingMessage};
use serde::{Deserialize, Serialize};

/// Snapshot directory for syndication feeds.
pub const FEED_SNAPSHOT_KIND: &str = "RSS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedAuthor {
    pub name: String,
}

/// One entry of a syndication feed.
///
/// The serialized field names are what snapshots on disk contain; unknown
/// fields are ignored and absent ones default, so snapshots written by older
/// or newer builds still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw markup of the entry body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<FeedAuthor>,
    #[serde(rename = "publishedParsed", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedParsed", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl FeedItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(|a| a.name.as_str())
    }
}

impl Titled for FeedItem {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Timestamped for FeedItem {
    fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// Downloads and parses one feed URL.
pub struct FeedFetcher {
    url: String,
    reddit: bool,
    http: Fetcher,
}

impl FeedFetcher {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let fetch_config = if config.is_reddit() {
            FetchConfig::reddit()
        } else {
            FetchConfig::default()
        };

        Ok(Self {
            url: config.feed_url.clone(),
            reddit: config.is_reddit(),
            http: Fetcher::new(&fetch_config)?,
        })
    }
}

#[async_trait]
impl SourceFetcher for FeedFetcher {
    type Item = FeedItem;

    async fn fetch(&self) -> Result<Vec<FeedItem>> {
        let body = self.http.fetch_text(&self.url).await?;
        if self.reddit {
            parse_feed(&repair_reddit_feed(&body))
        } else {
            parse_feed(&body)
        }
    }
}

/// A configured syndication feed.
///
/// Items are identified by title alone, and only items published and updated
/// within the last day are announced.
pub struct FeedSource {
    config: FeedConfig,
    channel: ChannelId,
    format: FeedFormat,
    fetcher: FeedFetcher,
    recency: RecencyFilter,
}

impl FeedSource {
    pub fn new(config: FeedConfig, channel: ChannelId) -> Result<Self> {
        config.validate()?;
        let fetcher = FeedFetcher::new(&config)?;

        Ok(Self {
            format: FeedFormat::from(config.feed_type),
            config,
            channel,
            fetcher,
            recency: RecencyFilter::default(),
        })
    }

    pub fn with_recency(mut self, recency: RecencyFilter) -> Self {
        self.recency = recency;
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn feed_format(&self) -> FeedFormat {
        self.format
    }
}

/// Snapshot file name: the configured override, else derived from the URL.
pub fn snapshot_file_name(config: &FeedConfig) -> String {
    config
        .file_name
        .clone()
        .unwrap_or_else(|| file_name_from_url(&config.feed_url))
}

impl UpdateSource for FeedSource {
    type Item = FeedItem;
    type Fetcher = FeedFetcher;
    type Equality = ByTitle;

    fn name(&self) -> String {
        self.config.feed_url.clone()
    }

    fn channel(&self) -> ChannelId {
        self.channel
    }

    fn snapshot_location(&self) -> SnapshotLocation {
        SnapshotLocation::new(FEED_SNAPSHOT_KIND, snapshot_file_name(&self.config))
    }

    fn fetcher(&self) -> &FeedFetcher {
        &self.fetcher
    }

    fn equality(&self) -> &ByTitle {
        &ByTitle
    }

    fn retain_recent(&self, items: Vec<FeedItem>, now: DateTime<Utc>) -> Vec<FeedItem> {
        self.recency.retain(items, now)
    }

    fn format(&self, items: &[FeedItem]) -> Result<Vec<OutgoingMessage>> {
        self.format.render(&self.config, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotStore;
    use chrono::TimeZone;
    use std::path::Path;

    #[test]
    fn snapshot_paths_from_url() {
        let store = SnapshotStore::new("");
        let cases = [
            ("https://www.kernel.org/feeds/kdist.xml", "Modules/RSS/kernel.org_feeds_kdist.xml.json"),
            ("https://www.reddit.com/r/longevity/.rss", "Modules/RSS/reddit.com_r_longevity_.rss.json"),
        ];

        for (url, expected) in cases {
            let source = FeedSource::new(FeedConfig::minimal("news", url), ChannelId(1)).unwrap();
            assert_eq!(store.locate(&source.snapshot_location()), Path::new(expected));
        }
    }

    #[test]
    fn snapshot_name_override_wins() {
        let mut config = FeedConfig::minimal("news", "https://www.reddit.com/r/longevity/.rss");
        config.file_name = Some("longevity".to_string());
        assert_eq!(snapshot_file_name(&config), "longevity");
    }

    #[test]
    fn feed_sources_drop_stale_items() {
        let source = FeedSource::new(
            FeedConfig::minimal("news", "https://example.com/feed.xml"),
            ChannelId(1),
        )
        .unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
        let mut fresh = FeedItem::new("fresh", "https://example.com/1");
        fresh.published_at = Some(now - chrono::Duration::hours(1));
        let mut stale = FeedItem::new("stale", "https://example.com/2");
        stale.published_at = Some(now - chrono::Duration::days(30));

        let kept = source.retain_recent(vec![stale, fresh.clone()], now);
        assert_eq!(kept, vec![fresh]);
    }

    #[test]
    fn snapshot_json_uses_stable_field_names() {
        let mut item = FeedItem::new("A", "https://example.com/a");
        item.published_at = Some(Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap());
        item.authors = vec![FeedAuthor { name: "octocat".to_string() }];

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "A",
                "link": "https://example.com/a",
                "authors": [{ "name": "octocat" }],
                "publishedParsed": "2024-05-17T10:00:00Z"
            })
        );
    }

    #[test]
    fn snapshot_json_tolerates_unknown_and_missing_fields() {
        let json = r#"[{ "title": "A", "guid": "x", "extensions": {} }, {}]"#;
        let items: Vec<FeedItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items, vec![FeedItem::new("A", ""), FeedItem::default()]);
    }
}
