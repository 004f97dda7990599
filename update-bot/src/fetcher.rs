use crate::types::{Result, UpdateError};
use reqwest::Client;
use tracing::{debug, info};

/// User agent Reddit accepts without answering 429.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Restrict the client to HTTP/1.1.
    pub http1_only: bool,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("update-bot/", env!("CARGO_PKG_VERSION")).to_string(),
            http1_only: false,
            max_redirects: 10,
        }
    }
}

impl FetchConfig {
    /// Reddit throttles non-browser agents and misbehaves over HTTP/2.
    pub fn reddit() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            http1_only: true,
            ..Self::default()
        }
    }
}

/// Plain HTTP GET with the client's default timeouts.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));

        if config.http1_only {
            builder = builder.http1_only();
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Fetch `url` and return the body. Any non-2xx status is an error.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        info!("Pulling: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::Status {
                url: url.to_string(),
                status,
            });
        }

        let content = response.text().await?;
        debug!("Fetched {} ({} bytes)", url, content.len());
        Ok(content)
    }
}
