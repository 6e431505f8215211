//! Narrowing a source list down to reachable sites.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::progress::{ProgressOutput, Spinner};
use crate::{Config, Prober, Result, Source, SpiderError};

/// Surviving sources plus the running spinner for the next stage.
pub struct GateOutcome<T> {
    /// Reachable sources, in their original relative order.
    pub sources: Vec<T>,
    /// The spinner started for the probe stage, still running.
    pub spinner: Arc<Spinner>,
}

impl<T> GateOutcome<T> {
    /// Returns `true` if no source survived.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Probes candidate sources and keeps the reachable ones.
pub struct SourceGate<'a> {
    prober: &'a Prober,
    config: &'a Config,
    output: ProgressOutput,
}

impl<'a> SourceGate<'a> {
    /// Creates a gate resolving names through `config`.
    pub fn new(prober: &'a Prober, config: &'a Config) -> Self {
        Self {
            prober,
            config,
            output: ProgressOutput::Stderr,
        }
    }

    /// Sets where the gate's spinner draws.
    pub fn with_output(mut self, output: ProgressOutput) -> Self {
        self.output = output;
        self
    }

    /// Filters source handles, taking each name from [`Source::name`].
    pub async fn filter(&self, sources: Vec<Arc<dyn Source>>) -> Result<GateOutcome<Arc<dyn Source>>> {
        let names: Vec<String> = sources.iter().map(|s| s.name().to_string()).collect();
        self.filter_named(sources, &names).await
    }

    /// Filters `sources`, where `names[i]` is the site behind `sources[i]`.
    ///
    /// One probe runs per name. Names without an enabled endpoint count as
    /// unreachable and are not probed. Survivors are selected by index, so
    /// their order never depends on which probe finished first.
    pub async fn filter_named<T, S>(&self, sources: Vec<T>, names: &[S]) -> Result<GateOutcome<T>>
    where
        S: AsRef<str>,
    {
        if sources.len() != names.len() {
            return Err(SpiderError::Config(format!(
                "{} sources but {} site names",
                sources.len(),
                names.len()
            )));
        }

        let spinner = Arc::new(Spinner::with_output("Checking sites", self.output));
        spinner.set_total(sources.len());
        spinner.start();

        let (tx, mut rx) = mpsc::unbounded_channel::<usize>();
        let tasks: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let name = name.as_ref().to_string();
                let endpoint = self.config.endpoint(&name).map(str::to_string);
                let prober = self.prober.clone();
                let completion = spinner.completion();
                let tx = tx.clone();

                tokio::spawn(async move {
                    let _completion = completion;
                    let reachable = match endpoint {
                        Some(url) => prober.is_reachable(&url).await,
                        None => {
                            debug!("Site {} has no enabled endpoint", name);
                            false
                        }
                    };
                    debug!("Site {} reachable: {}", name, reachable);
                    if reachable {
                        let _ = tx.send(index);
                    }
                })
            })
            .collect();
        drop(tx);

        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                warn!("Availability check aborted: {}", e);
            }
        }

        let mut live = HashSet::new();
        while let Ok(index) = rx.try_recv() {
            live.insert(index);
        }

        let sources = sources
            .into_iter()
            .enumerate()
            .filter(|(index, _)| live.contains(index))
            .map(|(_, source)| source)
            .collect();

        Ok(GateOutcome { sources, spinner })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::source::testing::MockSource;
    use crate::{Language, SiteConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, route: &str, status: u16, delay_ms: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_delay(Duration::from_millis(delay_ms)))
            .mount(server)
            .await;
    }

    fn config_for(server: &MockServer, sites: &[(&str, bool)]) -> Config {
        let mut config = Config {
            sites: Default::default(),
            ..Config::default()
        };
        for (name, enabled) in sites {
            config.sites.insert(
                name.to_string(),
                SiteConfig::new(format!("{}/{}", server.uri(), name), Language::Kr)
                    .with_enabled(*enabled),
            );
        }
        config
    }

    #[tokio::test]
    async fn test_gate_preserves_original_order() {
        let server = MockServer::start().await;
        mount(&server, "/a", 503, 0).await;
        // b answers last, c first: order must still be [b, c].
        mount(&server, "/b", 200, 300).await;
        mount(&server, "/c", 200, 0).await;

        let config = config_for(&server, &[("a", true), ("b", true), ("c", true)]);
        let prober = Prober::from_config(&config).unwrap();
        let gate = SourceGate::new(&prober, &config).with_output(ProgressOutput::Hidden);

        let outcome = gate
            .filter_named(vec!["A", "B", "C"], &["a", "b", "c"])
            .await
            .unwrap();
        assert_eq!(outcome.sources, vec!["B", "C"]);
        assert_eq!(outcome.spinner.done(), 3);
        assert_eq!(outcome.spinner.total(), 3);
        outcome.spinner.stop().await;
    }

    #[tokio::test]
    async fn test_gate_skips_disabled_and_unknown_sites() {
        let server = MockServer::start().await;
        mount(&server, "/on", 200, 0).await;
        mount(&server, "/off", 200, 0).await;

        let config = config_for(&server, &[("on", true), ("off", false)]);
        let prober = Prober::from_config(&config).unwrap();
        let gate = SourceGate::new(&prober, &config).with_output(ProgressOutput::Hidden);

        let outcome = gate
            .filter_named(vec![1, 2, 3], &["off", "on", "nowhere"])
            .await
            .unwrap();
        assert_eq!(outcome.sources, vec![2]);
        assert_eq!(outcome.spinner.done(), 3);
        outcome.spinner.stop().await;
    }

    #[tokio::test]
    async fn test_gate_all_down() {
        let server = MockServer::start().await;
        mount(&server, "/x", 500, 0).await;

        let config = config_for(&server, &[("x", true)]);
        let prober = Prober::from_config(&config).unwrap();
        let gate = SourceGate::new(&prober, &config).with_output(ProgressOutput::Hidden);

        let outcome = gate.filter_named(vec!["X"], &["x"]).await.unwrap();
        assert!(outcome.is_empty());
        outcome.spinner.stop().await;
    }

    #[tokio::test]
    async fn test_gate_rejects_mismatched_names() {
        let config = Config::default();
        let prober = Prober::from_config(&config).unwrap();
        let gate = SourceGate::new(&prober, &config).with_output(ProgressOutput::Hidden);

        let result = gate.filter_named(vec!["A", "B"], &["a"]).await;
        assert!(matches!(result, Err(SpiderError::Config(_))));
    }

    #[tokio::test]
    async fn test_gate_filter_uses_source_names() {
        let server = MockServer::start().await;
        mount(&server, "/up", 200, 0).await;
        mount(&server, "/down", 404, 0).await;

        let config = config_for(&server, &[("up", true), ("down", true)]);
        let prober = Prober::from_config(&config).unwrap();
        let gate = SourceGate::new(&prober, &config).with_output(ProgressOutput::Hidden);

        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(MockSource::new("down", vec![])),
            Arc::new(MockSource::new("up", vec![])),
        ];
        let outcome = gate.filter(sources).await.unwrap();
        let names: Vec<_> = outcome.sources.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["up"]);
        outcome.spinner.stop().await;
    }
}
