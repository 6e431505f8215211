//! # tspider
//!
//! A torrent-site search aggregator.
//!
//! A search runs in two stages. The availability gate probes every candidate
//! site concurrently and keeps the reachable ones. The collector then queries
//! each surviving site concurrently and merges the results on the calling
//! task, keyed by normalized title. Both stages draw a shared spinner with a
//! completion counter and an ETA.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tspider::{Config, Language, SearchOutcome, Spider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let spider = Spider::new(Config::default())?;
//!
//!     match spider.search("one piece", Language::Jp).await? {
//!         SearchOutcome::Found(collected) => {
//!             for (title, record) in collected.results.sorted_desc() {
//!                 println!("{}: {}", title, record.magnet);
//!             }
//!         }
//!         SearchOutcome::NoAvailableSources => println!("No available sites"),
//!     }
//!     Ok(())
//! }
//! ```

mod collector;
mod config;
mod error;
mod gate;
mod prober;
mod result;
mod source;
mod spider;

pub mod display;
pub mod fetcher;
pub mod fetcher_http;
pub mod progress;
pub mod sources;

pub use collector::{merge, Collected, Collector};
pub use config::{default_config_path, Config, ConfigStore, Language, SiteConfig, CONFIG_PATH_ENV};
pub use error::{Result, SpiderError};
pub use gate::{GateOutcome, SourceGate};
pub use prober::{ProbeOutcome, ProbeReport, Prober, SiteStatus};
pub use progress::Spinner;
pub use result::{normalize_title, AggregateResult, ResultRecord, NO_MAGNET};
pub use source::{Source, Tier};
pub use spider::{SearchOutcome, Spider};
