//! Search orchestration.

use std::sync::Arc;

use tracing::{debug, info};

use crate::fetcher::PageFetcher;
use crate::fetcher_http::HttpFetcher;
use crate::progress::ProgressOutput;
use crate::{
    sources, Collected, Collector, Config, Language, ProbeReport, Prober, Result, Source,
    SourceGate, SpiderError,
};

/// Result of a search run.
#[derive(Debug)]
pub enum SearchOutcome {
    /// At least one site was reachable and was queried.
    Found(Collected),
    /// Every candidate site was unreachable; nothing was queried.
    NoAvailableSources,
}

/// Orchestrates availability checks and searches across torrent sites.
pub struct Spider {
    config: Config,
    prober: Prober,
    fetcher: Arc<dyn PageFetcher>,
    sources: Option<Vec<Arc<dyn Source>>>,
    collector: Collector,
    output: ProgressOutput,
}

impl Spider {
    /// Creates a spider using HTTP for both probing and scraping.
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::from_config(&config)?);
        let prober = Prober::from_config(&config)?;
        Ok(Self {
            config,
            prober,
            fetcher,
            sources: None,
            collector: Collector::new(),
            output: ProgressOutput::Stderr,
        })
    }

    /// Replaces the fetcher handed to the built-in scrapers.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Uses an explicit source list instead of the built-in scrapers.
    pub fn with_sources(mut self, sources: Vec<Arc<dyn Source>>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Sets where progress is drawn.
    pub fn with_progress_output(mut self, output: ProgressOutput) -> Self {
        self.output = output;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Candidate sources for a language, in search order.
    ///
    /// Explicit sources are kept only when their site is configured with
    /// `language`.
    pub fn sources_for(&self, language: Language) -> Vec<Arc<dyn Source>> {
        match &self.sources {
            Some(sources) => sources
                .iter()
                .filter(|source| {
                    self.config
                        .sites
                        .get(source.name())
                        .is_some_and(|site| site.language == language)
                })
                .cloned()
                .collect(),
            None => sources::for_language(&self.config, language, Arc::clone(&self.fetcher)),
        }
    }

    /// Probes every configured site.
    pub async fn doctor(&self, language: Option<Language>) -> ProbeReport {
        self.prober.doctor(&self.config, language).await
    }

    /// Filters the candidate sites to the reachable ones and searches them.
    pub async fn search(&self, keyword: &str, language: Language) -> Result<SearchOutcome> {
        if keyword.trim().is_empty() {
            return Err(SpiderError::InvalidQuery("Keyword cannot be empty".into()));
        }

        let candidates = self.sources_for(language);
        if candidates.is_empty() {
            return Err(SpiderError::NoSources);
        }
        debug!("Checking {} candidate sites", candidates.len());

        let gate = SourceGate::new(&self.prober, &self.config).with_output(self.output);
        let outcome = gate.filter(candidates).await?;

        if outcome.is_empty() {
            outcome.spinner.stop().await;
            info!("No reachable sites for language {}", language);
            return Ok(SearchOutcome::NoAvailableSources);
        }

        let collected = match self
            .collector
            .collect(&outcome.sources, keyword, &outcome.spinner)
            .await
        {
            Ok(collected) => collected,
            Err(e) => {
                outcome.spinner.stop().await;
                return Err(e);
            }
        };
        outcome.spinner.stop_with_message(&collected.summary()).await;

        Ok(SearchOutcome::Found(collected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::MockSource;
    use crate::{ResultRecord, SiteConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with(server: &MockServer, names: &[&str]) -> Config {
        let mut config = Config {
            sites: Default::default(),
            ..Config::default()
        };
        for name in names {
            config.sites.insert(
                name.to_string(),
                SiteConfig::new(format!("{}/{}", server.uri(), name), Language::Jp),
            );
        }
        config
    }

    #[tokio::test]
    async fn test_search_empty_keyword() {
        let spider = Spider::new(Config::default())
            .unwrap()
            .with_progress_output(ProgressOutput::Hidden);
        let result = spider.search("  ", Language::Jp).await;
        assert!(matches!(result, Err(SpiderError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_search_no_sources() {
        let spider = Spider::new(Config::default())
            .unwrap()
            .with_sources(vec![])
            .with_progress_output(ProgressOutput::Hidden);
        let result = spider.search("kw", Language::Jp).await;
        assert!(matches!(result, Err(SpiderError::NoSources)));
    }

    #[tokio::test]
    async fn test_search_short_circuits_when_nothing_is_reachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = MockSource::new("down", vec![ResultRecord::new("a", "m")]);
        let queried = source.finished_flag();
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(source)];
        let spider = Spider::new(config_with(&server, &["down"]))
            .unwrap()
            .with_sources(sources)
            .with_progress_output(ProgressOutput::Hidden);

        let outcome = spider.search("kw", Language::Jp).await.unwrap();
        assert!(matches!(outcome, SearchOutcome::NoAvailableSources));
        assert!(!queried.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_search_queries_live_sources_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/up"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(MockSource::new("up", vec![ResultRecord::new("Live Hit", "m1")])),
            Arc::new(MockSource::new("down", vec![ResultRecord::new("Dead Hit", "m2")])),
        ];
        let spider = Spider::new(config_with(&server, &["up", "down"]))
            .unwrap()
            .with_sources(sources)
            .with_progress_output(ProgressOutput::Hidden);

        match spider.search("hit", Language::Jp).await.unwrap() {
            SearchOutcome::Found(collected) => {
                assert_eq!(collected.sources_consulted, 1);
                assert!(collected.results.contains("Live Hit"));
                assert!(!collected.results.contains("Dead Hit"));
                assert_eq!(collected.summary(), "Found 1 result(s) from 1 site(s)");
            }
            SearchOutcome::NoAvailableSources => panic!("expected results"),
        }
    }

    #[tokio::test]
    async fn test_explicit_sources_follow_site_language() {
        let server = MockServer::start().await;
        let mut config = config_with(&server, &["jp_site"]);
        config.sites.insert(
            "kr_site".into(),
            SiteConfig::new(format!("{}/kr_site", server.uri()), Language::Kr),
        );

        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(MockSource::new("jp_site", vec![])),
            Arc::new(MockSource::new("kr_site", vec![])),
            Arc::new(MockSource::new("unconfigured", vec![])),
        ];
        let spider = Spider::new(config)
            .unwrap()
            .with_sources(sources)
            .with_progress_output(ProgressOutput::Hidden);

        let kr: Vec<_> = spider
            .sources_for(Language::Kr)
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(kr, vec!["kr_site"]);

        let jp_only = Spider::new(config_with(&server, &["jp_site"]))
            .unwrap()
            .with_sources(vec![Arc::new(MockSource::new("jp_site", vec![])) as Arc<dyn Source>])
            .with_progress_output(ProgressOutput::Hidden);
        let result = jp_only.search("kw", Language::Kr).await;
        assert!(matches!(result, Err(SpiderError::NoSources)));
    }

    #[tokio::test]
    async fn test_doctor_uses_config() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let spider = Spider::new(config_with(&server, &["a", "b"])).unwrap();
        let report = spider.doctor(Some(Language::Jp)).await;
        assert_eq!(report.total(), 2);
        assert_eq!(report.available(), 2);
        assert_eq!(spider.doctor(Some(Language::Kr)).await.total(), 0);
    }
}
