//! Keyword fan-out across live sources and result merging.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::progress::Spinner;
use crate::{AggregateResult, Result, ResultRecord, Source, SpiderError, Tier};

/// Everything one search produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Collected {
    /// Merged records.
    pub results: AggregateResult,
    /// Number of sources that were queried.
    pub sources_consulted: usize,
}

impl Collected {
    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "Found {} result(s) from {} site(s)",
            self.results.len(),
            self.sources_consulted
        )
    }
}

/// Runs one keyword against many sources and merges what comes back.
#[derive(Debug, Default)]
pub struct Collector;

impl Collector {
    /// Creates a new collector.
    pub fn new() -> Self {
        Self
    }

    /// Queries every source concurrently and merges the results.
    ///
    /// The spinner is reset for this stage and bumped once per source,
    /// whatever the outcome. A failing or empty source contributes nothing.
    /// No merging happens before every source has finished.
    ///
    /// Records are merged in completion order, so when two sources report
    /// the same normalized title, which one is kept varies between runs.
    pub async fn collect(
        &self,
        sources: &[Arc<dyn Source>],
        keyword: &str,
        spinner: &Arc<Spinner>,
    ) -> Result<Collected> {
        if keyword.trim().is_empty() {
            return Err(SpiderError::InvalidQuery("Keyword cannot be empty".into()));
        }

        spinner.update_message("Searching");
        spinner.set_total(sources.len());
        spinner.reset_done();

        let keyword: Arc<str> = Arc::from(keyword);
        let (tx, mut rx) = mpsc::unbounded_channel::<(Tier, Vec<ResultRecord>)>();

        let tasks: Vec<_> = sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let keyword = Arc::clone(&keyword);
                let completion = spinner.completion();
                let tx = tx.clone();

                tokio::spawn(async move {
                    let _completion = completion;
                    let name = source.name().to_string();
                    match source.query(&keyword).await {
                        Ok(records) if records.is_empty() => {
                            debug!("Site {} found nothing", name);
                        }
                        Ok(records) => {
                            debug!("Site {} returned {} results", name, records.len());
                            let _ = tx.send((source.tier(), records));
                        }
                        Err(e) => {
                            warn!("Site {} failed: {}", name, e);
                        }
                    }
                })
            })
            .collect();
        drop(tx);

        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                warn!("Search task aborted: {}", e);
            }
        }

        let mut results = AggregateResult::new();
        while let Ok((tier, records)) = rx.try_recv() {
            merge(&mut results, tier, records);
        }

        Ok(Collected {
            results,
            sources_consulted: sources.len(),
        })
    }
}

/// Merges one source's records into the aggregate.
///
/// Simple-tier records without a magnet are dropped.
pub fn merge(aggregate: &mut AggregateResult, tier: Tier, records: Vec<ResultRecord>) {
    aggregate.extend(
        records
            .into_iter()
            .filter(|record| tier != Tier::Simple || !record.is_missing_magnet()),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::progress::ProgressOutput;
    use crate::source::testing::MockSource;
    use crate::NO_MAGNET;

    fn hidden_spinner() -> Arc<Spinner> {
        Arc::new(Spinner::with_output("Checking sites", ProgressOutput::Hidden))
    }

    #[test]
    fn test_collected_summary() {
        let mut results = AggregateResult::new();
        results.insert(ResultRecord::new("a", "m"));
        let collected = Collected {
            results,
            sources_consulted: 2,
        };
        assert_eq!(collected.summary(), "Found 1 result(s) from 2 site(s)");
    }

    #[test]
    fn test_merge_filters_sentinel_for_simple_tier() {
        let mut aggregate = AggregateResult::new();
        merge(
            &mut aggregate,
            Tier::Simple,
            vec![
                ResultRecord::new("kept", "magnet:?xt=1"),
                ResultRecord::new("dropped", NO_MAGNET),
            ],
        );
        assert!(aggregate.contains("kept"));
        assert!(!aggregate.contains("dropped"));
    }

    #[test]
    fn test_merge_keeps_sentinel_for_extended_tier() {
        let mut aggregate = AggregateResult::new();
        merge(&mut aggregate, Tier::Extended, vec![ResultRecord::new("x", NO_MAGNET)]);
        assert!(aggregate.contains("x"));
    }

    #[test]
    fn test_merge_same_collection_twice() {
        let records = vec![
            ResultRecord::new("Show E01", "m1"),
            ResultRecord::new("Show E02", "m2"),
        ];
        let mut aggregate = AggregateResult::new();
        merge(&mut aggregate, Tier::Simple, records.clone());
        let snapshot = aggregate.clone();
        merge(&mut aggregate, Tier::Simple, records);
        assert_eq!(aggregate, snapshot);
    }

    #[tokio::test]
    async fn test_collect_rejects_blank_keyword() {
        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(MockSource::new("a", vec![]))];
        let result = Collector::new().collect(&sources, "  ", &hidden_spinner()).await;
        assert!(matches!(result, Err(SpiderError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_collect_merges_and_normalizes() {
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(MockSource::new("a", vec![ResultRecord::new("Show Name E01", "m1")])),
            Arc::new(MockSource::new(
                "b",
                vec![
                    ResultRecord::new("Other Show", "m2"),
                    ResultRecord::new("No Link", NO_MAGNET),
                ],
            )),
        ];
        let spinner = hidden_spinner();
        let collected = Collector::new().collect(&sources, "show", &spinner).await.unwrap();

        assert_eq!(collected.sources_consulted, 2);
        assert_eq!(collected.results.len(), 2);
        assert_eq!(collected.results.get("Show_Name_E01").unwrap().magnet, "m1");
        assert!(!collected.results.contains("No Link"));
        assert_eq!(spinner.message(), "Searching");
    }

    #[tokio::test]
    async fn test_collect_colliding_keys_keep_exactly_one() {
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(
                MockSource::new("a", vec![ResultRecord::new("Same Title", "from-a")])
                    .with_delay(Duration::from_millis(5)),
            ),
            Arc::new(MockSource::new("b", vec![ResultRecord::new("Same  Title", "from-b")])),
        ];
        let collected = Collector::new()
            .collect(&sources, "same", &hidden_spinner())
            .await
            .unwrap();

        assert_eq!(collected.results.len(), 1);
        let survivor = &collected.results.get("Same Title").unwrap().magnet;
        assert!(survivor == "from-a" || survivor == "from-b");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_collect_waits_for_every_source() {
        let delays = [40u64, 5, 120, 0, 75, 20, 90, 10];
        let mocks: Vec<MockSource> = delays
            .iter()
            .enumerate()
            .map(|(i, ms)| {
                MockSource::new(
                    &format!("site{}", i),
                    vec![ResultRecord::new(format!("title {}", i), format!("m{}", i))],
                )
                .with_delay(Duration::from_millis(*ms))
            })
            .collect();
        let flags: Vec<_> = mocks.iter().map(|m| m.finished_flag()).collect();
        let sources: Vec<Arc<dyn Source>> = mocks
            .into_iter()
            .map(|m| Arc::new(m) as Arc<dyn Source>)
            .collect();

        let spinner = hidden_spinner();
        spinner.set_total(99);
        spinner.incr_done();
        let collected = Collector::new().collect(&sources, "kw", &spinner).await.unwrap();

        assert!(flags.iter().all(|f| f.load(Ordering::SeqCst)));
        assert_eq!(spinner.done(), delays.len());
        assert_eq!(spinner.total(), delays.len());
        assert_eq!(collected.results.len(), delays.len());
    }

    #[tokio::test]
    async fn test_collect_failures_do_not_abort_siblings() {
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(MockSource::failing("down")),
            Arc::new(MockSource::panicking("broken")),
            Arc::new(MockSource::new("empty", vec![])),
            Arc::new(
                MockSource::new("ok", vec![ResultRecord::new("Found", "magnet:?xt=ok")]).extended(),
            ),
        ];
        let spinner = hidden_spinner();
        let collected = Collector::new().collect(&sources, "kw", &spinner).await.unwrap();

        assert_eq!(spinner.done(), 4);
        assert_eq!(collected.sources_consulted, 4);
        assert_eq!(collected.results.len(), 1);
        assert!(collected.results.contains("Found"));
    }
}
