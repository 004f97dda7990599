use anyhow::Result;
use async_trait::async_trait;

use crate::defs::ChannelId;
use crate::defs::MessageId;
use crate::defs::OutgoingMessage;

// A sink is shared by every running module, so implementations must tolerate
// concurrent calls from several tasks.

#[async_trait]
pub trait NotifierSink: Send + Sync {
    async fn send(&self, channel: ChannelId, message: &OutgoingMessage) -> Result<MessageId>;
    async fn publish(&self, channel: ChannelId, message: &MessageId) -> Result<()>;
}
