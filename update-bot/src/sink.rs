use anyhow::{bail, Context};
use async_trait::async_trait;
use interfaces::{ChannelId, MessageId, NotifierSink, OutgoingMessage};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

/// Delivers messages through the Discord REST API.
///
/// `reqwest::Client` pools connections and is safe to share, so one sink
/// serves every module.
pub struct DiscordSink {
    client: Client,
    api_base: String,
    authorization: String,
}

impl DiscordSink {
    pub fn new(token: &str) -> anyhow::Result<Self> {
        Self::with_api_base(token, DISCORD_API_BASE)
    }

    pub fn with_api_base(token: &str, api_base: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "DiscordBot (",
                env!("CARGO_PKG_NAME"),
                ", ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()
            .context("failed to build Discord HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            authorization: format!("Bot {}", token),
        })
    }

    fn messages_url(&self, channel: ChannelId) -> String {
        format!("{}/channels/{}/messages", self.api_base, channel)
    }
}

#[async_trait]
impl NotifierSink for DiscordSink {
    async fn send(&self, channel: ChannelId, message: &OutgoingMessage) -> anyhow::Result<MessageId> {
        let response = self
            .client
            .post(self.messages_url(channel))
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .json(message)
            .send()
            .await
            .with_context(|| format!("sending message to channel {}", channel))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("sending message to channel {} returned {}: {}", channel, status, body);
        }

        let created: CreatedMessage = response
            .json()
            .await
            .with_context(|| format!("decoding created message in channel {}", channel))?;
        debug!("Sent message {} to channel {}", created.id, channel);
        Ok(MessageId(created.id))
    }

    async fn publish(&self, channel: ChannelId, message: &MessageId) -> anyhow::Result<()> {
        let url = format!("{}/{}/crosspost", self.messages_url(channel), message);
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send()
            .await
            .with_context(|| format!("crossposting message {} in channel {}", message, channel))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "crossposting message {} in channel {} returned {}: {}",
                message,
                channel,
                status,
                body
            );
        }

        debug!("Crossposted message {} in channel {}", message, channel);
        Ok(())
    }
}

/// Logs messages instead of delivering them.
#[derive(Default)]
pub struct LoggingSink {
    next_id: AtomicU64,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotifierSink for LoggingSink {
    async fn send(&self, channel: ChannelId, message: &OutgoingMessage) -> anyhow::Result<MessageId> {
        let id = MessageId(format!("dry-run-{}", self.next_id.fetch_add(1, Ordering::Relaxed)));
        let payload = serde_json::to_string(message).context("encoding message")?;
        info!("[dry run] channel {} message {}: {}", channel, id, payload);
        Ok(id)
    }

    async fn publish(&self, channel: ChannelId, message: &MessageId) -> anyhow::Result<()> {
        info!("[dry run] crosspost {} in channel {}", message, channel);
        Ok(())
    }
}
