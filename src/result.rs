//! Result records and the merged aggregate.

use std::collections::hash_map::{self, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Magnet value a simple-tier source reports when a detail page had no link.
pub const NO_MAGNET: &str = "no magnet";

/// Separator replacing whitespace runs in normalized titles.
pub const TITLE_SEPARATOR: &str = "_";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalizes a title into an aggregate key.
///
/// Surrounding whitespace is dropped and every internal whitespace run
/// becomes a single [`TITLE_SEPARATOR`].
pub fn normalize_title(title: &str) -> String {
    WHITESPACE
        .replace_all(title.trim(), TITLE_SEPARATOR)
        .into_owned()
}

/// A single torrent discovered by a source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Torrent title as shown by the site.
    pub title: String,
    /// Magnet URI.
    pub magnet: String,
    /// Uploader name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    /// Seeder count as displayed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seeders: Option<String>,
    /// Leecher count as displayed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leechers: Option<String>,
    /// Completed download count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snatches: Option<String>,
    /// Human-readable size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    /// Category or folder the torrent is filed under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl ResultRecord {
    /// Creates a simple record with only title and magnet.
    pub fn new(title: impl Into<String>, magnet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            magnet: magnet.into(),
            ..Default::default()
        }
    }

    /// Sets the uploader.
    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = Some(uploader.into());
        self
    }

    /// Sets seeder and leecher counts.
    pub fn with_peers(mut self, seeders: impl Into<String>, leechers: impl Into<String>) -> Self {
        self.seeders = Some(seeders.into());
        self.leechers = Some(leechers.into());
        self
    }

    /// Sets the completed download count.
    pub fn with_snatches(mut self, snatches: impl Into<String>) -> Self {
        self.snatches = Some(snatches.into());
        self
    }

    /// Sets the file size.
    pub fn with_file_size(mut self, size: impl Into<String>) -> Self {
        self.file_size = Some(size.into());
        self
    }

    /// Sets the folder.
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Returns the aggregate key for this record.
    pub fn key(&self) -> String {
        normalize_title(&self.title)
    }

    /// Returns `true` when the magnet is the "no magnet" sentinel.
    pub fn is_missing_magnet(&self) -> bool {
        self.magnet == NO_MAGNET
    }
}

/// Records merged from every source, keyed by normalized title.
///
/// Colliding keys keep whichever record was inserted last. Insertion follows
/// source completion order, so which record survives a collision between two
/// sources is not stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult {
    records: HashMap<String, ResultRecord>,
}

impl AggregateResult {
    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under its normalized key, replacing any previous one.
    pub fn insert(&mut self, record: ResultRecord) -> Option<ResultRecord> {
        self.records.insert(record.key(), record)
    }

    /// Inserts every record of one source.
    pub fn extend(&mut self, records: impl IntoIterator<Item = ResultRecord>) {
        for record in records {
            self.insert(record);
        }
    }

    /// Looks a record up by raw or normalized title.
    pub fn get(&self, title: &str) -> Option<&ResultRecord> {
        self.records.get(&normalize_title(title))
    }

    /// Returns `true` if a record exists for the title.
    pub fn contains(&self, title: &str) -> bool {
        self.get(title).is_some()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over `(key, record)` pairs in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, ResultRecord> {
        self.records.iter()
    }

    /// Returns `(key, record)` pairs sorted by key, descending.
    pub fn sorted_desc(&self) -> Vec<(&str, &ResultRecord)> {
        let mut entries: Vec<_> = self
            .records
            .iter()
            .map(|(key, record)| (key.as_str(), record))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(a.0));
        entries
    }
}

impl IntoIterator for AggregateResult {
    type Item = (String, ResultRecord);
    type IntoIter = hash_map::IntoIter<String, ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
