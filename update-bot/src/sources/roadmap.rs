use crate::diff::Structural;
use crate::fetcher::{FetchConfig, Fetcher};
use crate::format::selector;
use crate::source::{SnapshotLocation, SourceFetcher, UpdateSource};
use crate::types::{Result, UpdateError};
use crate::utils::bullet_list;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use interfaces::{ChannelId, Embed, EmbedField, EmbedMedia, OutgoingMessage};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ROADMAP_URL: &str = "https://www.lifespan.io/road-maps/the-rejuvenation-roadmap/";
pub const ROADMAP_SNAPSHOT_KIND: &str = "LongevityIORoadmap";
pub const ROADMAP_SNAPSHOT_FILE: &str = "longevity_io_roadmap";

const CHANGELOG_CONTAINER: &str = "#content > div:nth-child(6)";
const ROADMAP_COLOR: u32 = 0xe1ad01;
const ROADMAP_THUMBNAIL: &str =
    "https://pbs.twimg.com/profile_images/1303743628569968642/CAUc2pVY_400x400.jpg";
const DATE_FORMATS: [&str; 2] = ["%d %B %Y", "%d %b %Y"];

/// One dated block of the roadmap changelog.
///
/// Compared structurally: editing any line of an existing date produces a new
/// entry rather than a modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub date: DateTime<Utc>,
    pub updates: Vec<String>,
}

/// Extract the changelog entries from the roadmap page.
///
/// Inside the changelog container a `<p>` holds a date and the `<ul>` that
/// follows lists that date's updates. `<section>` blocks are skipped.
pub fn parse_changelog(html: &str) -> Result<Vec<ChangelogEntry>> {
    let document = Html::parse_document(html);
    let container_selector = selector(CHANGELOG_CONTAINER)?;
    let container = document.select(&container_selector).next().ok_or_else(|| {
        UpdateError::Parse(format!("changelog container {:?} not found", CHANGELOG_CONTAINER))
    })?;

    let mut last_date: Option<DateTime<Utc>> = None;
    let mut entries = Vec::new();

    for child in container.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "p" => {
                last_date = Some(parse_date(element_text(&child).trim())?);
            }
            "ul" => {
                let date = last_date.ok_or_else(|| {
                    UpdateError::Parse(format!(
                        "update list without a date: {}",
                        element_text(&child).trim()
                    ))
                })?;
                let text = element_text(&child);
                let updates = text
                    .trim_matches('\n')
                    .split('\n')
                    .map(str::to_string)
                    .collect();
                entries.push(ChangelogEntry { date, updates });
            }
            "section" => continue,
            other => {
                return Err(UpdateError::Parse(format!("unexpected tag in changelog: {}", other)));
            }
        }
    }

    debug!("Parsed {} changelog entries", entries.len());
    Ok(entries)
}

/// Dates appear as `2 January 2006`, `02 January 2006`, `2 Jan 2006` or
/// `02 Jan 2006`.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| UpdateError::Parse(format!("failed to parse date: {}", input)))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

/// One embed per changed date with a bullet per update line.
pub fn changelog_messages(entries: &[ChangelogEntry]) -> Vec<OutgoingMessage> {
    entries
        .iter()
        .map(|entry| {
            OutgoingMessage::embed(Embed {
                url: Some(ROADMAP_URL.to_string()),
                title: Some(format!("Update found to {}!", entry.date.format("%-d %B %Y"))),
                description: Some(ROADMAP_URL.to_string()),
                timestamp: Some(entry.date.to_rfc3339()),
                color: Some(ROADMAP_COLOR),
                thumbnail: Some(EmbedMedia {
                    url: ROADMAP_THUMBNAIL.to_string(),
                }),
                fields: vec![EmbedField {
                    name: "Changelog".to_string(),
                    value: bullet_list(entry.updates.iter().map(String::as_str)),
                    inline: false,
                }],
                ..Default::default()
            })
        })
        .collect()
}

pub struct RoadmapFetcher {
    url: String,
    http: Fetcher,
}

impl RoadmapFetcher {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            http: Fetcher::new(&FetchConfig::default())?,
        })
    }
}

#[async_trait]
impl SourceFetcher for RoadmapFetcher {
    type Item = ChangelogEntry;

    async fn fetch(&self) -> Result<Vec<ChangelogEntry>> {
        let body = self.http.fetch_text(&self.url).await?;
        parse_changelog(&body)
    }
}

/// The Rejuvenation Roadmap changelog page.
///
/// Every structurally new entry is announced; there is no recency window.
pub struct RoadmapSource {
    channel: ChannelId,
    fetcher: RoadmapFetcher,
}

impl RoadmapSource {
    pub fn new(channel: ChannelId) -> Result<Self> {
        Ok(Self {
            channel,
            fetcher: RoadmapFetcher::new(ROADMAP_URL)?,
        })
    }
}

impl UpdateSource for RoadmapSource {
    type Item = ChangelogEntry;
    type Fetcher = RoadmapFetcher;
    type Equality = Structural;

    fn name(&self) -> String {
        "Rejuvenation Roadmap changelog".to_string()
    }

    fn channel(&self) -> ChannelId {
        self.channel
    }

    fn snapshot_location(&self) -> SnapshotLocation {
        SnapshotLocation::new(ROADMAP_SNAPSHOT_KIND, ROADMAP_SNAPSHOT_FILE)
    }

    fn fetcher(&self) -> &RoadmapFetcher {
        &self.fetcher
    }

    fn equality(&self) -> &Structural {
        &Structural
    }

    fn format(&self, items: &[ChangelogEntry]) -> Result<Vec<OutgoingMessage>> {
        Ok(changelog_messages(items))
    }
}
