pub mod config;
pub mod diff;
pub mod fetcher;
pub mod format;
pub mod module;
pub mod parser;
pub mod recency;
pub mod sink;
pub mod snapshot;
pub mod source;
pub mod sources;
pub mod types;
pub mod utils;

pub use config::{BotSettings, ChannelMap, FeedConfig, FeedType};
pub use diff::{difference, ByTitle, EqualityPolicy, Structural};
pub use format::FeedFormat;
pub use module::{Module, ModuleFailure, UpdateModule, UpdateTask};
pub use recency::RecencyFilter;
pub use sink::{DiscordSink, LoggingSink};
pub use snapshot::SnapshotStore;
pub use source::{SnapshotLocation, SourceFetcher, UpdateSource};
pub use sources::{ChangelogEntry, FeedItem, FeedSource, RoadmapSource};
pub use types::*;
