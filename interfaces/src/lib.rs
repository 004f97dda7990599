pub mod defs;
#[cfg(any(test, feature = "test-util"))]
pub mod recording;
pub mod sink;

pub use defs::ChannelId;
pub use defs::Embed;
pub use defs::EmbedAuthor;
pub use defs::EmbedField;
pub use defs::EmbedMedia;
pub use defs::MessageId;
pub use defs::OutgoingMessage;
#[cfg(any(test, feature = "test-util"))]
pub use recording::RecordingSink;
#[cfg(any(test, feature = "test-util"))]
pub use recording::SinkCall;
pub use sink::NotifierSink;
