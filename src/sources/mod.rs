//! Torrent site implementations.

// Korean sites
mod torrenttop;

// Japanese sites
mod nyaa;

use std::collections::HashMap;
use std::sync::Arc;

use scraper::Selector;

pub use nyaa::Nyaa;
pub use torrenttop::TorrentTop;

use crate::fetcher::PageFetcher;
use crate::{Config, Language, Result, SiteConfig, Source, SpiderError};

/// Sites with a scraper, in the order they are searched.
pub const KNOWN_SITES: &[&str] = &[TorrentTop::NAME, Nyaa::NAME, Nyaa::SUKEBEI_NAME];

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| SpiderError::Parse(format!("Failed to parse selector: {:?}", e)))
}

/// Builds one source per enabled, known site of `language`.
///
/// Configured sites without a scraper are skipped.
pub fn for_language(
    config: &Config,
    language: Language,
    fetcher: Arc<dyn PageFetcher>,
) -> Vec<Arc<dyn Source>> {
    let enabled: HashMap<&str, &SiteConfig> = config.enabled_sites(language).into_iter().collect();

    KNOWN_SITES
        .iter()
        .filter_map(|name| {
            let site = enabled.get(name)?;
            let fetcher = Arc::clone(&fetcher);
            let source: Arc<dyn Source> = match *name {
                TorrentTop::NAME => Arc::new(TorrentTop::new(&site.url, fetcher)),
                Nyaa::NAME => Arc::new(Nyaa::new(&site.url, fetcher)),
                Nyaa::SUKEBEI_NAME => Arc::new(Nyaa::sukebei(&site.url, fetcher)),
                _ => return None,
            };
            Some(source)
        })
        .collect()
}
