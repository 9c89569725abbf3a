use anyhow::{Context, Result};
use tracing::debug;

use super::get_bytes;
use crate::config::FeedConfig;

/// Items shown per feed
pub const MAX_ITEMS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
}

#[derive(Clone)]
pub struct NewsClient {
    client: reqwest::Client,
}

impl NewsClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch one feed and return at most [`MAX_ITEMS`] of its newest entries
    pub async fn latest(&self, feed: &FeedConfig) -> Result<Vec<NewsItem>> {
        debug!("Fetching feed {} from {}", feed.name, feed.url);
        let body = get_bytes(&self.client, &feed.url).await?;
        parse_items(&body).with_context(|| format!("Failed to parse feed {}", feed.name))
    }
}

/// Parse an RSS or Atom document, keeping the first [`MAX_ITEMS`] entries in document order
pub fn parse_items(body: &[u8]) -> Result<Vec<NewsItem>> {
    let feed = feed_rs::parser::parse(body)?;

    Ok(feed
        .entries
        .into_iter()
        .take(MAX_ITEMS)
        .map(|entry| NewsItem {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            link: entry
                .links
                .into_iter()
                .next()
                .map(|l| l.href)
                .unwrap_or_default(),
        })
        .collect())
}
