//! TorrentTop (Korean) source implementation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};
use url::Url;

use super::selector;
use crate::fetcher::PageFetcher;
use crate::{Result, ResultRecord, Source, Tier, NO_MAGNET};

/// TorrentTop: a board listing with one magnet per detail page.
pub struct TorrentTop {
    base_url: String,
    fetcher: Arc<dyn PageFetcher>,
}

impl TorrentTop {
    /// Site name in the configuration.
    pub const NAME: &'static str = "torrenttop";

    /// Creates a TorrentTop source rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            fetcher,
        }
    }

    fn search_url(&self, keyword: &str) -> String {
        format!(
            "{}/search/index?keywords={}",
            self.base_url,
            urlencoding::encode(keyword)
        )
    }

    /// Detail links on the board are relative to `/bbs/`.
    fn detail_url(&self, href: &str) -> Result<String> {
        let base = Url::parse(&format!("{}/bbs/", self.base_url))?;
        Ok(base.join(href.trim())?.to_string())
    }
}

#[async_trait]
impl Source for TorrentTop {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn tier(&self) -> Tier {
        Tier::Simple
    }

    async fn query(&self, keyword: &str) -> Result<Vec<ResultRecord>> {
        let html = self.fetcher.fetch(&self.search_url(keyword)).await?;
        let topics = parse_topics(&html)?;
        debug!("TorrentTop listed {} topics", topics.len());

        let lookups = topics.into_iter().filter_map(|(title, href)| {
            let url = match self.detail_url(&href) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping topic '{}': {}", title, e);
                    return None;
                }
            };
            let fetcher = Arc::clone(&self.fetcher);
            Some(async move {
                let magnet = match fetcher.fetch(&url).await {
                    Ok(page) => parse_magnet(&page).ok().flatten(),
                    Err(e) => {
                        debug!("Detail page {} failed: {}", url, e);
                        None
                    }
                };
                ResultRecord::new(title, magnet.unwrap_or_else(|| NO_MAGNET.to_string()))
            })
        });

        Ok(join_all(lookups).await)
    }
}

/// Extracts `(title, href)` pairs from a search results page.
fn parse_topics(html: &str) -> Result<Vec<(String, String)>> {
    let document = Html::parse_document(html);
    let link_selector = selector(".topic-item a")?;

    Ok(document
        .select(&link_selector)
        .filter_map(|link| {
            let title = link.value().attr("title")?.trim();
            let href = link.value().attr("href")?.trim();
            if title.is_empty() || href.is_empty() {
                return None;
            }
            Some((title.to_string(), href.to_string()))
        })
        .collect())
}

/// Finds the magnet link placed next to the magnet icon.
fn parse_magnet(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let icon_selector = selector("i.fas.fa-magnet")?;
    let anchor_selector = selector("a")?;

    for icon in document.select(&icon_selector) {
        let Some(parent) = icon.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let magnet = parent
            .select(&anchor_selector)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| href.starts_with("magnet:?"));
        if let Some(magnet) = magnet {
            return Ok(Some(magnet.to_string()));
        }
    }
    Ok(None)
}
