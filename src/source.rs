//! Torrent source trait and capability tiers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, ResultRecord};

/// How much a source knows about each torrent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Title and magnet only. Missing magnets are reported as
    /// [`NO_MAGNET`](crate::NO_MAGNET) and dropped when merging.
    #[default]
    Simple,
    /// Title, magnet and descriptive fields (peers, size, folder, ...).
    Extended,
}

/// Trait for implementing torrent sources.
///
/// A source either returns every record it found for the keyword or fails
/// as a whole; partial results are never reported alongside an error.
#[async_trait]
pub trait Source: Send + Sync {
    /// Site name, matching the key in [`Config::sites`](crate::Config).
    fn name(&self) -> &str;

    /// Capability tier of this source.
    fn tier(&self) -> Tier {
        Tier::Simple
    }

    /// Searches the site for `keyword`.
    async fn query(&self, keyword: &str) -> Result<Vec<ResultRecord>>;
}


#[cfg(test)]
mod tests {
    use super::testing::MockSource;
    use super::*;

    #[test]
    fn test_tier_default() {
        assert_eq!(Tier::default(), Tier::Simple);
    }

    #[test]
    fn test_tier_serialization() {
        assert_eq!(serde_json::to_string(&Tier::Extended).unwrap(), "\"extended\"");
    }

    #[tokio::test]
    async fn test_source_trait_defaults() {
        let source = MockSource::new("mock", vec![ResultRecord::new("a", "m")]);
        assert_eq!(source.name(), "mock");
        assert_eq!(source.tier(), Tier::Simple);
        assert_eq!(source.query("kw").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = MockSource::failing("down").extended();
        assert_eq!(source.tier(), Tier::Extended);
        assert!(source.query("kw").await.is_err());
    }
}
