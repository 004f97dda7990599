use crate::diff::EqualityPolicy;
use crate::types::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interfaces::{ChannelId, OutgoingMessage};
use serde::{de::DeserializeOwned, Serialize};

/// Where a source keeps its snapshot: `Modules/<kind>/<file_name>.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLocation {
    pub kind: String,
    pub file_name: String,
}

impl SnapshotLocation {
    pub fn new(kind: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            file_name: file_name.into(),
        }
    }
}

/// Retrieves the current items of one source.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    type Item: Send;

    /// One pull. Called once per tick, so it must be cheap to repeat.
    async fn fetch(&self) -> Result<Vec<Self::Item>>;
}

/// Everything the update loop needs to know about one concrete source.
///
/// The loop itself is identical for every source; fetching, identity,
/// recency and message rendering are supplied here.
pub trait UpdateSource: Send + Sync + 'static {
    type Item: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Fetcher: SourceFetcher<Item = Self::Item>;
    type Equality: EqualityPolicy<Self::Item>;

    /// Human-readable label used in logs.
    fn name(&self) -> String;

    fn channel(&self) -> ChannelId;

    fn snapshot_location(&self) -> SnapshotLocation;

    fn fetcher(&self) -> &Self::Fetcher;

    fn equality(&self) -> &Self::Equality;

    /// Narrow the diff before anything is announced. Keeps everything unless
    /// the source has a recency policy.
    fn retain_recent(&self, items: Vec<Self::Item>, _now: DateTime<Utc>) -> Vec<Self::Item> {
        items
    }

    /// Render chat messages for a non-empty list of new items.
    fn format(&self, items: &[Self::Item]) -> Result<Vec<OutgoingMessage>>;
}
