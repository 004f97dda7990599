use crate::types::{Result, UpdateError};
use crate::utils::parse_hex_color;
use interfaces::ChannelId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// How a feed's new items are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedType {
    Reddit,
    Github,
    TitleAndLink,
    KernelOrgUpdates,
}

/// One entry of the feeds file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    pub channel_name: String,
    #[serde(rename = "feedURL")]
    pub feed_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "thumbnailURL", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub feed_type: Option<FeedType>,
    /// Embed author; `${entryAuthor}` is replaced by the item's first author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Snapshot file name override (without `.json`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl FeedConfig {
    pub fn minimal(channel_name: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            feed_url: feed_url.into(),
            color: None,
            title: None,
            description: None,
            thumbnail_url: None,
            feed_type: None,
            author: None,
            file_name: None,
        }
    }

    pub fn is_reddit(&self) -> bool {
        self.feed_type == Some(FeedType::Reddit)
    }

    /// Numeric embed color, if one is configured.
    pub fn color_value(&self) -> Result<Option<u32>> {
        match &self.color {
            None => Ok(None),
            Some(color) => parse_hex_color(color)
                .map(Some)
                .ok_or_else(|| UpdateError::Config(format!("invalid color {:?} for {}", color, self.feed_url))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.feed_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UpdateError::Config(format!(
                "unsupported scheme in feed URL {}",
                self.feed_url
            )));
        }
        self.color_value()?;
        Ok(())
    }
}

/// Channel names used in the configuration mapped to destination ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelMap(HashMap<String, u64>);

impl ChannelMap {
    pub fn new(channels: HashMap<String, u64>) -> Self {
        Self(channels)
    }

    pub fn resolve(&self, name: &str) -> Result<ChannelId> {
        self.0
            .get(name)
            .copied()
            .map(ChannelId)
            .ok_or_else(|| UpdateError::Config(format!("unknown channel name {:?}", name)))
    }
}

/// Settings shared by every module of the process.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    pub roadmap_channel: Option<String>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            poll_interval: Duration::from_secs(30 * 60),
            roadmap_channel: Some("longevityNews".to_string()),
        }
    }
}

pub fn load_feeds(path: &Path) -> Result<Vec<FeedConfig>> {
    let feeds: Vec<FeedConfig> = read_json(path)?;
    for feed in &feeds {
        feed.validate()?;
    }
    Ok(feeds)
}

pub fn load_channels(path: &Path) -> Result<ChannelMap> {
    read_json(path)
}

pub fn load_token(path: &Path) -> Result<String> {
    let token = std::fs::read_to_string(path)
        .map_err(|e| UpdateError::Config(format!("failed to read token from {}: {}", path.display(), e)))?;
    let token = token.trim();
    if token.is_empty() {
        return Err(UpdateError::Config(format!("token file {} is empty", path.display())));
    }
    Ok(token.to_string())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)
        .map_err(|e| UpdateError::Config(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| UpdateError::Config(format!("failed to parse {}: {}", path.display(), e)))
}
