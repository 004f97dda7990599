use chrono::{DateTime, Utc};
use interfaces::ChannelId;
use std::path::PathBuf;

/// Items that carry publish/update timestamps.
///
/// `None` means the source did not provide the timestamp; the recency filter
/// treats such items as just published.
pub trait Timestamped {
    fn published_at(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
}

/// Items whose identity is their title string.
pub trait Titled {
    fn title(&self) -> &str;
}

/// Result of one iteration of a module's polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The fetch failed; the snapshot was left untouched.
    FetchFailed,
    /// First pull for a source without prior state: persisted, nothing sent.
    Suppressed { pulled: usize },
    /// The pull contained nothing worth announcing.
    NoChanges { pulled: usize },
    Dispatched { items: usize, messages: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot {path} could not be {action}: {source}")]
    Snapshot {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: Box<UpdateError>,
    },

    #[error("Delivery to channel {channel} failed: {source}")]
    Delivery {
        channel: ChannelId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, UpdateError>;
