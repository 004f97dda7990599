use crate::config::{FeedConfig, FeedType};
use crate::sources::rss_feed::FeedItem;
use crate::types::{Result, UpdateError};
use crate::utils::bullet_list;
use interfaces::{Embed, EmbedAuthor, EmbedField, EmbedMedia, OutgoingMessage};
use scraper::{Html, Selector};

/// Placeholder in a feed's author template replaced by the entry's author.
pub const ENTRY_AUTHOR_PLACEHOLDER: &str = "${entryAuthor}";

const GITHUB_COMMITS_SUFFIX: &str = "/commits/master.atom";

/// Message layout for a feed's new items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    /// One plain-text message per item: bold title, link below.
    TitleAndLink,
    /// One embed listing every new commit title.
    Github,
    /// One embed per post, pointing at the linked content.
    Reddit,
    /// One embed listing every new kernel version.
    KernelOrgUpdates,
    /// One embed per item showing its description.
    Default,
}

impl From<Option<FeedType>> for FeedFormat {
    fn from(feed_type: Option<FeedType>) -> Self {
        match feed_type {
            Some(FeedType::TitleAndLink) => FeedFormat::TitleAndLink,
            Some(FeedType::Github) => FeedFormat::Github,
            Some(FeedType::Reddit) => FeedFormat::Reddit,
            Some(FeedType::KernelOrgUpdates) => FeedFormat::KernelOrgUpdates,
            None => FeedFormat::Default,
        }
    }
}

impl FeedFormat {
    pub fn render(self, config: &FeedConfig, items: &[FeedItem]) -> Result<Vec<OutgoingMessage>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        match self {
            FeedFormat::TitleAndLink => Ok(title_and_link_messages(items)),
            FeedFormat::Github => {
                let url = config
                    .feed_url
                    .strip_suffix(GITHUB_COMMITS_SUFFIX)
                    .unwrap_or(&config.feed_url);
                summary_message(config, url, "New commit messages", items).map(|m| vec![m])
            }
            FeedFormat::KernelOrgUpdates => {
                summary_message(config, &config.feed_url, "New versions", items).map(|m| vec![m])
            }
            FeedFormat::Reddit => items.iter().map(|item| reddit_message(config, item)).collect(),
            FeedFormat::Default => Ok(default_messages(items)),
        }
    }
}

fn title_and_link_messages(items: &[FeedItem]) -> Vec<OutgoingMessage> {
    items
        .iter()
        .map(|item| OutgoingMessage::text(format!("**{}**\n{}", item.title, item.link)))
        .collect()
}

fn summary_message(
    config: &FeedConfig,
    url: &str,
    field_name: &str,
    items: &[FeedItem],
) -> Result<OutgoingMessage> {
    let embed = Embed {
        url: Some(url.to_string()),
        title: config.title.clone(),
        description: config.description.clone(),
        color: config.color_value()?,
        thumbnail: thumbnail(config),
        fields: vec![EmbedField {
            name: field_name.to_string(),
            value: bullet_list(items.iter().map(|item| item.title.as_str())),
            inline: false,
        }],
        ..Default::default()
    };

    Ok(OutgoingMessage::embed(embed))
}

fn reddit_message(config: &FeedConfig, item: &FeedItem) -> Result<OutgoingMessage> {
    let mut embed = item_embed(config, item)?;

    if let Some(content) = &item.content {
        let (link, image) = first_table_link_and_image(content)?;
        if let Some(link) = link {
            embed.description = Some(link);
        }
        if let Some(image) = image {
            embed.image = Some(EmbedMedia { url: image });
        }
    }

    Ok(OutgoingMessage::embed(embed))
}

fn default_messages(items: &[FeedItem]) -> Vec<OutgoingMessage> {
    items
        .iter()
        .map(|item| {
            let description = item.description.as_deref().unwrap_or_default();
            OutgoingMessage::embed(Embed {
                description: Some(html_escape::decode_html_entities(description).into_owned()),
                ..Default::default()
            })
        })
        .collect()
}

/// Embed prefilled from the item and the feed's display settings.
fn item_embed(config: &FeedConfig, item: &FeedItem) -> Result<Embed> {
    Ok(Embed {
        url: Some(item.link.clone()),
        title: Some(item.title.clone()),
        timestamp: item.published_at.map(|at| at.to_rfc3339()),
        color: config.color_value()?,
        author: author(config, item),
        thumbnail: thumbnail(config),
        description: config.description.clone(),
        ..Default::default()
    })
}

fn author(config: &FeedConfig, item: &FeedItem) -> Option<EmbedAuthor> {
    let template = config.author.as_ref()?;
    let name = match item.first_author() {
        Some(entry_author) => template.replace(ENTRY_AUTHOR_PLACEHOLDER, entry_author),
        None => template.clone(),
    };
    Some(EmbedAuthor { name })
}

fn thumbnail(config: &FeedConfig) -> Option<EmbedMedia> {
    config
        .thumbnail_url
        .as_ref()
        .map(|url| EmbedMedia { url: url.clone() })
}

/// First `td a` href and first `td img` src of an item's markup.
fn first_table_link_and_image(markup: &str) -> Result<(Option<String>, Option<String>)> {
    let document = Html::parse_fragment(markup);
    let link = first_attr(&document, "td a", "href")?;
    let image = first_attr(&document, "td img", "src")?;
    Ok((link, image))
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Result<Option<String>> {
    let selector = selector(css)?;
    Ok(document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .filter(|value| !value.is_empty())
        .map(str::to_string))
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| UpdateError::Parse(format!("bad selector {:?}: {:?}", css, e)))
}
