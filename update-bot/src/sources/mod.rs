pub mod roadmap;
pub mod rss_feed;

pub use roadmap::{ChangelogEntry, RoadmapSource};
pub use rss_feed::{FeedItem, FeedSource};
