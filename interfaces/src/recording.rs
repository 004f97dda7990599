use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use anyhow::Result;
use anyhow::bail;
use async_trait::async_trait;

use crate::defs::ChannelId;
use crate::defs::MessageId;
use crate::defs::OutgoingMessage;
use crate::sink::NotifierSink;

#[derive(Clone, Debug, PartialEq)]
pub enum SinkCall {
    Send(ChannelId, OutgoingMessage),
    Publish(ChannelId, MessageId),
}

/// Keeps every call in memory instead of delivering anything.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    next_id: AtomicU64,
    fail_sends: AtomicBool,
    fail_publishes: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    // A test that panicked mid-push leaves the log usable for the others.
    fn lock_calls(&self) -> MutexGuard<'_, Vec<SinkCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.lock_calls().clone()
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Send(_, message) => Some(message),
                SinkCall::Publish(..) => None,
            })
            .collect()
    }
}

#[async_trait]
impl NotifierSink for RecordingSink {
    async fn send(&self, channel: ChannelId, message: &OutgoingMessage) -> Result<MessageId> {
        if self.fail_sends.load(Ordering::SeqCst) {
            bail!("send to {channel} rejected");
        }
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst).to_string());
        self.lock_calls().push(SinkCall::Send(channel, message.clone()));
        Ok(id)
    }

    async fn publish(&self, channel: ChannelId, message: &MessageId) -> Result<()> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            bail!("publish of {message} in {channel} rejected");
        }
        self.lock_calls().push(SinkCall::Publish(channel, message.clone()));
        Ok(())
    }
}
