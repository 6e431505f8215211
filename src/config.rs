//! Persisted site configuration.
//!
//! The configuration is an explicit value: [`ConfigStore`] owns the file
//! path and the loaded [`Config`], and every edit is written back
//! immediately. Nothing here is process-global.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Result, SpiderError};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "TSPIDER_CONFIG";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Language tag of a torrent site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Korean sites.
    Kr,
    /// Japanese sites.
    Jp,
}

impl Language {
    /// Returns the short tag used on disk and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Kr => "kr",
            Language::Jp => "jp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = SpiderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kr" => Ok(Language::Kr),
            "jp" => Ok(Language::Jp),
            other => Err(SpiderError::Config(format!(
                "language must be 'kr' or 'jp', got '{}'",
                other
            ))),
        }
    }
}

/// Configuration for a single torrent site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the site.
    pub url: String,
    /// Whether the site takes part in searches.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Language tag.
    pub language: Language,
}

impl SiteConfig {
    /// Creates an enabled site entry.
    pub fn new(url: impl Into<String>, language: Language) -> Self {
        Self {
            url: url.into(),
            enabled: true,
            language,
        }
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Sites keyed by name.
    #[serde(default)]
    pub sites: BTreeMap<String, SiteConfig>,
    /// `User-Agent` sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds.
    #[serde(rename = "timeout_seconds", default = "default_timeout")]
    pub timeout: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        use Language::{Jp, Kr};

        let korean = [
            ("torrenttop", "https://torrenttop152.com", true),
            ("torrentqq", "https://torrentqq282.com", false),
            ("tshare", "https://tshare.org", false),
            ("torrentmobile", "https://torrentmobile10.com", false),
            ("ktxtorrent", "https://ktxtorrent.com", false),
            ("jujutorrent", "https://jujutorrent.com", false),
            ("torrentgram", "https://torrentgram.com", false),
            ("torrentmax", "https://torrentmax.com", false),
            ("torrentrj", "https://torrentrj.com", false),
            ("torrentsee", "https://torrentsee.com", false),
            ("torrentsir", "https://torrentsir.com", false),
            ("torrentsome", "https://torrentsome.com", false),
            ("torrenttoast", "https://torrenttoast.com", false),
            ("torrentwiz", "https://torrentwiz.com", false),
            ("torrentj", "https://torrentj.com", false),
            ("torrentview", "https://torrentview.com", false),
            ("ttobogo", "https://ttobogo.com", false),
        ];
        let japanese = [
            ("nyaa", "https://nyaa.si", true),
            ("sukebe", "https://sukebei.nyaa.si", true),
        ];

        let sites = korean
            .iter()
            .map(|(name, url, enabled)| (name, url, enabled, Kr))
            .chain(japanese.iter().map(|(name, url, enabled)| (name, url, enabled, Jp)))
            .map(|(name, url, enabled, lang)| {
                (
                    name.to_string(),
                    SiteConfig::new(*url, lang).with_enabled(*enabled),
                )
            })
            .collect();

        Self {
            sites,
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

impl Config {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Returns the endpoint of an enabled site.
    ///
    /// Disabled and unknown sites have no endpoint.
    pub fn endpoint(&self, name: &str) -> Option<&str> {
        self.sites
            .get(name)
            .filter(|site| site.enabled)
            .map(|site| site.url.as_str())
    }

    /// Returns all enabled sites for a language, ordered by name.
    pub fn enabled_sites(&self, language: Language) -> Vec<(&str, &SiteConfig)> {
        self.sites
            .iter()
            .filter(|(_, site)| site.enabled && site.language == language)
            .map(|(name, site)| (name.as_str(), site))
            .collect()
    }

    /// Updates the URL of an existing site.
    pub fn set_site_url(&mut self, name: &str, url: impl Into<String>) -> Result<()> {
        let site = self
            .sites
            .get_mut(name)
            .ok_or_else(|| not_found(name))?;
        site.url = url.into();
        Ok(())
    }

    /// Adds a new, enabled site.
    pub fn add_site(&mut self, name: &str, url: impl Into<String>, language: Language) -> Result<()> {
        if name.trim().is_empty() {
            return Err(SpiderError::Config("site name cannot be empty".into()));
        }
        if self.sites.contains_key(name) {
            return Err(SpiderError::SiteExists(name.to_string()));
        }
        self.sites
            .insert(name.to_string(), SiteConfig::new(url, language));
        Ok(())
    }

    /// Enables or disables a site.
    pub fn enable_site(&mut self, name: &str, enabled: bool) -> Result<()> {
        let site = self
            .sites
            .get_mut(name)
            .ok_or_else(|| not_found(name))?;
        site.enabled = enabled;
        Ok(())
    }

    /// Removes a site.
    pub fn remove_site(&mut self, name: &str) -> Result<SiteConfig> {
        self.sites.remove(name).ok_or_else(|| not_found(name))
    }
}

fn not_found(name: &str) -> SpiderError {
    SpiderError::SiteNotFound(name.to_string())
}

/// Returns the default config file path.
///
/// `$TSPIDER_CONFIG` wins, then `~/.tspider.json`, then `./tspider.json`.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .map(|home| home.join(".tspider.json"))
        .unwrap_or_else(|| PathBuf::from("tspider.json"))
}

/// A [`Config`] bound to the file it was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    /// Loads the configuration at `path`.
    ///
    /// A missing file is created with the defaults. A malformed file is
    /// left untouched and the defaults are used for this run.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let config = match Config::from_json(&raw) {
                    Ok(config) => config,
                    Err(e) => {
                        warn!("Ignoring malformed config {}: {}", path.display(), e);
                        Config::default()
                    }
                };
                debug!("Loaded {} sites from {}", config.sites.len(), path.display());
                Ok(Self { path, config })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let store = Self {
                    path,
                    config: Config::default(),
                };
                store.save()?;
                debug!("Created default config at {}", store.path.display());
                Ok(store)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the configuration from [`default_config_path`].
    pub fn open_default() -> Result<Self> {
        Self::open(default_config_path())
    }

    /// Writes the configuration back to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, self.config.to_json()?)?;
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consumes the store, returning the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Updates a site's URL and saves.
    pub fn set_site_url(&mut self, name: &str, url: &str) -> Result<()> {
        self.config.set_site_url(name, url)?;
        self.save()
    }

    /// Adds a site and saves.
    pub fn add_site(&mut self, name: &str, url: &str, language: Language) -> Result<()> {
        self.config.add_site(name, url, language)?;
        self.save()
    }

    /// Enables or disables a site and saves.
    pub fn enable_site(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.config.enable_site(name, enabled)?;
        self.save()
    }

    /// Removes a site and saves.
    pub fn remove_site(&mut self, name: &str) -> Result<()> {
        self.config.remove_site(name)?;
        self.save()
    }
}
