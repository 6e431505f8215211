//! Page fetcher abstraction for retrieving HTML content.

use async_trait::async_trait;

use crate::Result;

/// Trait for fetching the HTML content of a URL.
///
/// All configuration (user-agent, timeout) is set at construction time;
/// `fetch` is a simple URL-in, HTML-out interface. Sources share one
/// fetcher, so implementations must be usable from many tasks at once.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the HTML content of the given URL.
    ///
    /// Any status other than `200 OK` is an error.
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use super::*;
    use crate::SpiderError;

    /// Serves canned pages keyed by exact URL; everything else is a 404.
    #[derive(Default)]
    pub struct StaticFetcher {
        pages: HashMap<String, String>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
            self.pages.insert(url.into(), html.into());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages.get(url).cloned().ok_or(SpiderError::Status(404))
        }
    }

    #[tokio::test]
    async fn test_static_fetcher() {
        let fetcher = StaticFetcher::new().with_page("https://a.example/", "<html></html>");
        assert_eq!(fetcher.fetch("https://a.example/").await.unwrap(), "<html></html>");
        assert!(matches!(
            fetcher.fetch("https://b.example/").await,
            Err(SpiderError::Status(404))
        ));
    }
}
