//! Site availability probing.

use std::time::{Duration, Instant};

use futures::future::join_all;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::fetcher_http::build_client;
use crate::{Config, Language, Result};

/// Result of probing one configured site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteStatus {
    /// Site name.
    pub name: String,
    /// Probed URL.
    pub url: String,
    /// Whether the site answered `200 OK`.
    pub available: bool,
    /// Time spent on the request, successful or not.
    pub latency: Duration,
    /// Short failure description.
    pub error: Option<String>,
    /// Site language.
    pub language: Language,
    /// Whether the site is enabled in the configuration.
    pub enabled: bool,
}

/// Outcome of a single reachability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Time spent on the request.
    pub latency: Duration,
    /// `None` on success, otherwise a short description.
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// Returns `true` if the site answered `200 OK`.
    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }
}

/// Availability report over a set of sites.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ProbeReport {
    statuses: Vec<SiteStatus>,
}

impl ProbeReport {
    /// Wraps a collection of statuses in arbitrary order.
    pub fn new(statuses: Vec<SiteStatus>) -> Self {
        Self { statuses }
    }

    /// Statuses in the order they were collected.
    pub fn statuses(&self) -> &[SiteStatus] {
        &self.statuses
    }

    /// Statuses sorted by site name, ascending.
    pub fn sorted(&self) -> Vec<&SiteStatus> {
        let mut sorted: Vec<_> = self.statuses.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted
    }

    /// Number of examined sites.
    pub fn total(&self) -> usize {
        self.statuses.len()
    }

    /// Number of reachable sites.
    pub fn available(&self) -> usize {
        self.statuses.iter().filter(|s| s.available).count()
    }

    /// Number of unreachable sites.
    pub fn down(&self) -> usize {
        self.total() - self.available()
    }
}

/// Issues reachability checks with the configured identity and timeout.
#[derive(Clone)]
pub struct Prober {
    client: Client,
}

impl Prober {
    /// Creates a prober from the configuration's user agent and timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
        })
    }

    /// Creates a prober with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Sends one GET to `url` and reports latency and outcome.
    pub async fn check(&self, url: &str) -> ProbeOutcome {
        let start = Instant::now();
        let result = self.client.get(url).send().await;
        let latency = start.elapsed();

        let error = match result {
            Ok(response) if response.status() == StatusCode::OK => None,
            Ok(response) => Some(format!("HTTP {}", response.status().as_u16())),
            Err(e) => Some(describe(&e)),
        };
        debug!("Probed {} in {:?}: {:?}", url, latency, error);
        ProbeOutcome { latency, error }
    }

    /// Returns `true` if `url` answers `200 OK`.
    pub async fn is_reachable(&self, url: &str) -> bool {
        self.check(url).await.is_available()
    }

    /// Probes every configured site, optionally restricted to one language.
    ///
    /// Disabled sites are probed too. Each examined site yields exactly one
    /// status.
    pub async fn doctor(&self, config: &Config, language: Option<Language>) -> ProbeReport {
        let tasks: Vec<_> = config
            .sites
            .iter()
            .filter(|(_, site)| language.map_or(true, |lang| site.language == lang))
            .map(|(name, site)| {
                let prober = self.clone();
                let status = SiteStatus {
                    name: name.clone(),
                    url: site.url.clone(),
                    available: false,
                    latency: Duration::ZERO,
                    error: None,
                    language: site.language,
                    enabled: site.enabled,
                };
                let handle = {
                    let url = site.url.clone();
                    tokio::spawn(async move { prober.check(&url).await })
                };
                async move {
                    let outcome = handle.await.unwrap_or_else(|e| ProbeOutcome {
                        latency: Duration::ZERO,
                        error: Some(format!("probe aborted: {}", e)),
                    });
                    SiteStatus {
                        available: outcome.is_available(),
                        latency: outcome.latency,
                        error: outcome.error,
                        ..status
                    }
                }
            })
            .collect();

        ProbeReport::new(join_all(tasks).await)
    }
}

/// Condenses a transport error into a few words.
fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timeout".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else if e.is_builder() {
        "invalid url".to_string()
    } else if e.is_redirect() {
        "too many redirects".to_string()
    } else if let Some(status) = e.status() {
        format!("HTTP {}", status.as_u16())
    } else {
        "request failed".to_string()
    }
}
