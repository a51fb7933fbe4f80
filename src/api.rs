use std::time::Duration;

use log::debug;
use reqwest::StatusCode;
use url::Url;

use crate::config::Config;

/// Plain GET client for the stats site.  One request per call, no retries.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(&config.user_agent, config.timeout()?)?)
    }

    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        debug!("GET {url}");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }
        Ok(response.text().await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Server returned {status} for {url}")]
    Status { url: Url, status: StatusCode },
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Where the scraper gets its pages from.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, url: &Url) -> anyhow::Result<String>;
}

impl PageSource for Fetcher {
    async fn fetch_page(&self, url: &Url) -> anyhow::Result<String> {
        Ok(self.fetch(url).await?)
    }
}
