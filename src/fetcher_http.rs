//! HTTP-based page fetcher using reqwest.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::fetcher::PageFetcher;
use crate::{Config, Result, SpiderError};

/// Builds the shared HTTP client: one `User-Agent` header and one timeout.
pub fn build_client(config: &Config) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .build()?)
}

/// A page fetcher that uses plain HTTP requests via reqwest.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates an `HttpFetcher` with the identity and timeout from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
        })
    }

    /// Creates an `HttpFetcher` with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        if response.status() != StatusCode::OK {
            return Err(SpiderError::Status(response.status().as_u16()));
        }
        let html = response.text().await.map_err(transport_error)?;
        Ok(html)
    }
}

fn transport_error(e: reqwest::Error) -> SpiderError {
    if e.is_timeout() {
        SpiderError::Timeout
    } else {
        SpiderError::Http(e)
    }
}
