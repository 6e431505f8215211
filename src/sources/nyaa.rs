//! Nyaa and Sukebei (Japanese) source implementation.
//!
//! Both sites run the same tracker software, so one parser serves both.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use super::selector;
use crate::fetcher::PageFetcher;
use crate::{Result, ResultRecord, Source, Tier};

/// A Nyaa-style tracker listing.
pub struct Nyaa {
    name: &'static str,
    base_url: String,
    fetcher: Arc<dyn PageFetcher>,
}

impl Nyaa {
    /// Site name of nyaa.si in the configuration.
    pub const NAME: &'static str = "nyaa";
    /// Site name of sukebei.nyaa.si in the configuration.
    pub const SUKEBEI_NAME: &'static str = "sukebe";

    /// Creates the nyaa source rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::named(Self::NAME, base_url, fetcher)
    }

    /// Creates the sukebei source rooted at `base_url`.
    pub fn sukebei(base_url: impl Into<String>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::named(Self::SUKEBEI_NAME, base_url, fetcher)
    }

    fn named(name: &'static str, base_url: impl Into<String>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            fetcher,
        }
    }

    fn search_url(&self, keyword: &str) -> String {
        format!(
            "{}/?f=0&c=0_0&q={}",
            self.base_url,
            urlencoding::encode(keyword)
        )
    }
}

#[async_trait]
impl Source for Nyaa {
    fn name(&self) -> &str {
        self.name
    }

    fn tier(&self) -> Tier {
        Tier::Extended
    }

    async fn query(&self, keyword: &str) -> Result<Vec<ResultRecord>> {
        let html = self.fetcher.fetch(&self.search_url(keyword)).await?;
        parse_listing(&html)
    }
}

fn cell_text(cell: Option<&ElementRef<'_>>) -> Option<String> {
    let text = cell?.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Parses the `torrent-list` table of a listing page.
fn parse_listing(html: &str) -> Result<Vec<ResultRecord>> {
    let document = Html::parse_document(html);
    let row_selector = selector("table.torrent-list tbody tr")?;
    let cell_selector = selector("td")?;
    let title_selector = selector("a:not(.comments)")?;
    let link_selector = selector("a[href]")?;
    let category_selector = selector("a[title]")?;

    let mut records = Vec::new();

    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
        if cells.len() < 8 {
            continue;
        }

        let title = cells[1]
            .select(&title_selector)
            .last()
            .map(|a| {
                a.value()
                    .attr("title")
                    .map(str::to_string)
                    .unwrap_or_else(|| a.text().collect::<String>())
            })
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        let magnet = cells[2]
            .select(&link_selector)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| href.starts_with("magnet:?"))
            .unwrap_or_default()
            .to_string();

        if title.is_empty() || magnet.is_empty() {
            continue;
        }

        let mut record = ResultRecord::new(title, magnet);
        record.folder = cells[0]
            .select(&category_selector)
            .next()
            .and_then(|a| a.value().attr("title"))
            .map(str::to_string);
        record.file_size = cell_text(cells.get(3));
        record.seeders = cell_text(cells.get(5));
        record.leechers = cell_text(cells.get(6));
        record.snatches = cell_text(cells.get(7));
        records.push(record);
    }

    Ok(records)
}
